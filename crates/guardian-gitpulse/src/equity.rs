//! Contribution equity analysis.
//!
//! Measures how evenly commits are spread across teammates with the Gini
//! coefficient, and raises per-contributor warnings for members with a tiny
//! share and for a single member dominating the history.

use std::fmt;

use guardian_core::{round_to, EquityConfig, Signal, Status};
use serde::{Deserialize, Serialize};

/// Work attributed to one contributor.
///
/// # Examples
///
/// ```
/// use guardian_gitpulse::equity::ContributorRecord;
///
/// let record = ContributorRecord::new("alice", 12, 340, 25);
/// assert_eq!(record.commits, 12);
/// assert_eq!(record.commit_pct, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorRecord {
    /// Author name, unique within one evaluation.
    pub name: String,
    /// Number of commits.
    pub commits: u64,
    /// Lines added across all commits.
    pub additions: u64,
    /// Lines deleted across all commits.
    pub deletions: u64,
    /// Share of all commits, in percent with one decimal.
    pub commit_pct: f64,
    /// Share of all added lines, in percent with one decimal.
    pub addition_pct: f64,
}

impl ContributorRecord {
    /// A record with raw counts and no derived shares yet.
    pub fn new(name: impl Into<String>, commits: u64, additions: u64, deletions: u64) -> Self {
        Self {
            name: name.into(),
            commits,
            additions,
            deletions,
            commit_pct: 0.0,
            addition_pct: 0.0,
        }
    }
}

/// Gini coefficient of a multiset of non-negative counts.
///
/// Computed exactly over all pairs: `Σᵢ Σⱼ |xᵢ − xⱼ| / (2·n·S)`. Empty,
/// single-element, and all-zero inputs yield `0.0`.
///
/// # Examples
///
/// ```
/// use guardian_gitpulse::equity::gini;
///
/// assert_eq!(gini(&[10, 10, 10, 10]), 0.0);
/// assert_eq!(gini(&[5, 10, 15, 20]), 0.25);
/// assert_eq!(gini(&[0, 0, 0, 100]), 0.75);
/// ```
pub fn gini(values: &[u64]) -> f64 {
    let n = values.len();
    let total: u128 = values.iter().map(|&v| u128::from(v)).sum();
    if n < 2 || total == 0 {
        return 0.0;
    }

    let mut numerator: u128 = 0;
    for &a in values {
        for &b in values {
            numerator += u128::from(a.abs_diff(b));
        }
    }

    numerator as f64 / (2 * n as u128 * total) as f64
}

/// A per-contributor equity warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EquityWarning {
    /// Commit share below the configured minimum.
    #[serde(rename_all = "camelCase")]
    LowShare {
        name: String,
        commit_pct: f64,
        commits: u64,
        total_commits: u64,
    },
    /// One contributor holds most of the commits.
    #[serde(rename_all = "camelCase")]
    Dominance { name: String, commit_pct: f64 },
}

impl EquityWarning {
    /// Whether this is a dominance warning.
    pub fn is_dominance(&self) -> bool {
        matches!(self, EquityWarning::Dominance { .. })
    }
}

impl fmt::Display for EquityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquityWarning::LowShare {
                name,
                commit_pct,
                commits,
                total_commits,
            } => write!(
                f,
                "{name} has only {commit_pct}% of commits ({commits}/{total_commits})"
            ),
            EquityWarning::Dominance { name, commit_pct } => {
                write!(f, "{name} dominates with {commit_pct}% of all commits")
            }
        }
    }
}

/// Overall equity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquityLabel {
    /// Low inequality and no warnings.
    Balanced,
    /// Warnings raised but inequality within bounds.
    NeedsAttention,
    /// Inequality above the threshold on a multi-person team.
    Unbalanced,
    /// No history to judge.
    NoHistory,
}

impl fmt::Display for EquityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquityLabel::Balanced => write!(f, "Balanced"),
            EquityLabel::NeedsAttention => write!(f, "Needs Attention"),
            EquityLabel::Unbalanced => write!(f, "Unbalanced"),
            EquityLabel::NoHistory => write!(f, "No history"),
        }
    }
}

/// Result of the equity analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityReport {
    /// `false` only for an unbalanced multi-person team.
    pub passed: bool,
    /// Gini coefficient over commit counts, rounded to three decimals.
    pub gini: f64,
    /// Classification.
    pub label: EquityLabel,
    /// Per-contributor records with shares filled in.
    pub contributors: Vec<ContributorRecord>,
    /// Commits across all contributors.
    pub total_commits: u64,
    /// Added lines across all contributors.
    pub total_additions: u64,
    /// Warnings in contributor order; the dominance warning, if any, comes last.
    pub warnings: Vec<EquityWarning>,
    /// Display status derived from the Gini value.
    pub status: Status,
    /// One-line summary.
    pub detail: String,
}

impl EquityReport {
    /// Neutral result used when there is no history to analyze.
    ///
    /// # Examples
    ///
    /// ```
    /// use guardian_gitpulse::equity::{EquityLabel, EquityReport};
    ///
    /// let report = EquityReport::no_history("No git history available");
    /// assert!(report.passed);
    /// assert_eq!(report.label, EquityLabel::NoHistory);
    /// ```
    pub fn no_history(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            gini: 0.0,
            label: EquityLabel::NoHistory,
            contributors: Vec::new(),
            total_commits: 0,
            total_additions: 0,
            warnings: Vec::new(),
            status: Status::Warn,
            detail: detail.into(),
        }
    }
}

impl Signal for EquityReport {
    fn passed(&self) -> bool {
        self.passed
    }

    fn status(&self) -> Status {
        self.status
    }

    fn detail(&self) -> &str {
        &self.detail
    }
}

/// Analyze contribution equity across contributor records.
///
/// The low-share warning needs more than `config.min_total_commits` commits
/// in total so tiny histories are not flagged. The dominance warning fires
/// independently of it, so both can name the same team.
///
/// # Examples
///
/// ```
/// use guardian_core::EquityConfig;
/// use guardian_gitpulse::equity::{analyze_equity, ContributorRecord, EquityLabel};
///
/// let records = vec![
///     ContributorRecord::new("alice", 10, 400, 20),
///     ContributorRecord::new("bob", 9, 350, 15),
///     ContributorRecord::new("carol", 11, 380, 30),
/// ];
/// let report = analyze_equity(records, 10.0, &EquityConfig::default());
/// assert!(report.passed);
/// assert_eq!(report.label, EquityLabel::Balanced);
/// ```
pub fn analyze_equity(
    mut contributors: Vec<ContributorRecord>,
    min_contribution_pct: f64,
    config: &EquityConfig,
) -> EquityReport {
    if contributors.is_empty() {
        return EquityReport::no_history("No git history available");
    }

    let total_commits: u64 = contributors.iter().map(|c| c.commits).sum();
    let total_additions: u64 = contributors.iter().map(|c| c.additions).sum();

    for record in &mut contributors {
        record.commit_pct = percent(record.commits, total_commits);
        record.addition_pct = percent(record.additions, total_additions);
    }

    let counts: Vec<u64> = contributors.iter().map(|c| c.commits).collect();
    let gini = round_to(gini(&counts), 3);
    let team_size = contributors.len();

    let mut warnings: Vec<EquityWarning> = contributors
        .iter()
        .filter(|c| c.commit_pct < min_contribution_pct && total_commits > config.min_total_commits)
        .map(|c| EquityWarning::LowShare {
            name: c.name.clone(),
            commit_pct: c.commit_pct,
            commits: c.commits,
            total_commits,
        })
        .collect();

    if team_size > 1 {
        let mut dominant: Option<&ContributorRecord> = None;
        for record in &contributors {
            if dominant.map_or(true, |d| record.commits > d.commits) {
                dominant = Some(record);
            }
        }
        if let Some(dominant) = dominant.filter(|d| d.commit_pct > config.dominance_pct) {
            warnings.push(EquityWarning::Dominance {
                name: dominant.name.clone(),
                commit_pct: dominant.commit_pct,
            });
        }
    }

    let (passed, label) = if gini > config.unbalanced_gini && team_size > 1 {
        (false, EquityLabel::Unbalanced)
    } else if !warnings.is_empty() {
        (true, EquityLabel::NeedsAttention)
    } else {
        (true, EquityLabel::Balanced)
    };

    let status = if gini <= 0.2 {
        Status::Pass
    } else if gini <= 0.4 {
        Status::Warn
    } else {
        Status::Fail
    };

    tracing::debug!(gini, %label, warnings = warnings.len(), "equity analyzed");

    EquityReport {
        passed,
        gini,
        label,
        detail: format!(
            "Gini: {gini} ({label}) - {team_size} contributors, {total_commits} commits"
        ),
        contributors,
        total_commits,
        total_additions,
        warnings,
        status,
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(part as f64 / total as f64 * 100.0, 1)
}
