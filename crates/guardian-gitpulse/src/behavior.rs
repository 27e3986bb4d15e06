//! Commit-behavior pattern detection.
//!
//! Looks for signs of non-incremental work in a commit timeline: single
//! commits that dump a large amount of code, most of the code arriving in
//! the final stretch of the project, and too few commits that are each too
//! large.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset};
use guardian_core::{round_to, PatternConfig, Severity, Signal, Status};
use serde::{Deserialize, Serialize};

use crate::mining::CommitEvent;

/// Which pattern rule produced a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    /// One commit added more lines than the ceiling.
    CodeDump,
    /// Most added lines landed late in the timeline.
    Rush,
    /// Few commits with a large average size.
    LowFrequency,
}

/// A triggered pattern rule.
///
/// # Examples
///
/// ```
/// use guardian_core::Severity;
/// use guardian_gitpulse::behavior::{PatternFlag, PatternKind};
///
/// let flag = PatternFlag {
///     kind: PatternKind::CodeDump,
///     severity: Severity::Critical,
///     message: "Code dump: alice added 500 lines in one commit (abc1234)".into(),
/// };
/// assert!(flag.severity.is_critical());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternFlag {
    /// Rule that fired.
    pub kind: PatternKind,
    /// Critical flags fail the check.
    pub severity: Severity,
    /// Explanation carrying the measured values.
    pub message: String,
}

/// Overall classification of the commit timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BehaviorLabel {
    /// No flags.
    Healthy,
    /// Warnings only.
    NeedsReview,
    /// At least one critical flag.
    Suspicious,
    /// Nothing to analyze.
    NoCommits,
}

impl fmt::Display for BehaviorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BehaviorLabel::Healthy => write!(f, "Healthy"),
            BehaviorLabel::NeedsReview => write!(f, "Needs Review"),
            BehaviorLabel::Suspicious => write!(f, "Suspicious"),
            BehaviorLabel::NoCommits => write!(f, "No commits"),
        }
    }
}

/// Result of the commit-behavior analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorReport {
    /// `false` only when a critical flag exists.
    pub passed: bool,
    /// Classification.
    pub label: BehaviorLabel,
    /// Flags in rule order: code dumps, rush, low frequency.
    pub flags: Vec<PatternFlag>,
    /// Commits analyzed.
    pub total_commits: usize,
    /// Mean added lines per commit, one decimal.
    pub avg_additions_per_commit: f64,
    /// Display status.
    pub status: Status,
    /// One-line summary.
    pub detail: String,
}

impl BehaviorReport {
    /// Neutral result used when the timeline could not be obtained.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            label: BehaviorLabel::NoCommits,
            flags: Vec::new(),
            total_commits: 0,
            avg_additions_per_commit: 0.0,
            status: Status::Warn,
            detail: detail.into(),
        }
    }

    /// Flags with [`Severity::Critical`].
    pub fn critical_flags(&self) -> impl Iterator<Item = &PatternFlag> {
        self.flags.iter().filter(|f| f.severity.is_critical())
    }
}

impl Signal for BehaviorReport {
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

/// Detect code-dump, rush, and low-frequency patterns.
///
/// Commits may arrive in any order; the rush rule sorts by timestamp and
/// skips commits whose timestamp does not parse.
///
/// # Examples
///
/// ```
/// use guardian_core::PatternConfig;
/// use guardian_gitpulse::behavior::analyze_commits;
/// use guardian_gitpulse::mining::CommitEvent;
///
/// let dump = CommitEvent {
///     hash: "abc1234def".into(),
///     author: "alice".into(),
///     email: String::new(),
///     timestamp: "2026-03-01T10:00:00+05:30".into(),
///     message: "everything".into(),
///     additions: 500,
///     deletions: 0,
/// };
/// let report = analyze_commits(&[dump], &PatternConfig::default());
/// assert!(!report.passed);
/// assert_eq!(report.critical_flags().count(), 1);
/// ```
pub fn analyze_commits(commits: &[CommitEvent], config: &PatternConfig) -> BehaviorReport {
    if commits.is_empty() {
        return BehaviorReport::unavailable("No commits to analyze");
    }

    let mut flags: Vec<PatternFlag> = commits
        .iter()
        .filter(|c| c.additions > config.max_dump_lines)
        .map(|c| PatternFlag {
            kind: PatternKind::CodeDump,
            severity: Severity::Critical,
            message: format!(
                "Code dump: {} added {} lines in one commit ({})",
                c.author,
                c.additions,
                c.short_hash()
            ),
        })
        .collect();

    if let Some(flag) = detect_rush(commits, config) {
        flags.push(flag);
    }

    let total_commits = commits.len();
    let total_additions: u64 = commits.iter().map(|c| c.additions).sum();
    let avg = total_additions as f64 / total_commits as f64;

    if avg > config.low_frequency_avg_lines && total_commits < config.low_frequency_max_commits {
        flags.push(PatternFlag {
            kind: PatternKind::LowFrequency,
            severity: Severity::Warning,
            message: format!(
                "Low commit frequency: {total_commits} commits with avg {avg:.0} lines each"
            ),
        });
    }

    let has_critical = flags.iter().any(|f| f.severity.is_critical());
    let (label, status) = if has_critical {
        (BehaviorLabel::Suspicious, Status::Alert)
    } else if !flags.is_empty() {
        (BehaviorLabel::NeedsReview, Status::Warn)
    } else {
        (BehaviorLabel::Healthy, Status::Pass)
    };

    let mut detail = format!("{label} - {total_commits} commits, avg {avg:.0} lines/commit");
    if !flags.is_empty() {
        detail.push_str(&format!(" | {} flag(s)", flags.len()));
    }

    BehaviorReport {
        passed: !has_critical,
        label,
        flags,
        total_commits,
        avg_additions_per_commit: round_to(avg, 1),
        status,
        detail,
    }
}

fn detect_rush(commits: &[CommitEvent], config: &PatternConfig) -> Option<PatternFlag> {
    let mut timeline: Vec<(DateTime<FixedOffset>, u64)> = commits
        .iter()
        .filter_map(|c| match c.parsed_timestamp() {
            Some(at) => Some((at, c.additions)),
            None => {
                tracing::debug!(hash = %c.hash, timestamp = %c.timestamp, "skipping commit with malformed timestamp");
                None
            }
        })
        .collect();

    if timeline.len() < config.rush_min_commits {
        return None;
    }
    timeline.sort_by_key(|(at, _)| *at);

    let first = timeline.first()?.0;
    let last = timeline.last()?.0;
    let span_ms = (last - first).num_milliseconds();
    if span_ms <= 0 {
        return None;
    }

    let offset_ms = (span_ms as f64 * config.rush_cutoff_fraction).round() as i64;
    let Some(cutoff) =
        Duration::try_milliseconds(offset_ms).and_then(|d| first.checked_add_signed(d))
    else {
        tracing::debug!(
            fraction = config.rush_cutoff_fraction,
            "rush cutoff outside the calendar, skipping"
        );
        return None;
    };

    let total: u64 = timeline.iter().map(|(_, a)| a).sum();
    if total == 0 {
        return None;
    }
    let late: u64 = timeline
        .iter()
        .filter(|(at, _)| *at >= cutoff)
        .map(|(_, a)| a)
        .sum();

    let late_share = late as f64 / total as f64;
    if late_share <= config.rush_late_share {
        return None;
    }

    let final_pct = ((1.0 - config.rush_cutoff_fraction) * 100.0).round();
    Some(PatternFlag {
        kind: PatternKind::Rush,
        severity: Severity::Warning,
        message: format!(
            "Rush detected: {:.0}% of code added in final {final_pct}% of timeline",
            late_share * 100.0
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(hash: &str, timestamp: &str, additions: u64) -> CommitEvent {
        CommitEvent {
            hash: hash.into(),
            author: "alice".into(),
            email: "alice@example.com".into(),
            timestamp: timestamp.into(),
            message: "work".into(),
            additions,
            deletions: 0,
        }
    }

    fn steady_history() -> Vec<CommitEvent> {
        (1..=8)
            .map(|day| commit(&format!("c{day}"), &format!("2026-03-{day:02}T10:00:00Z"), 40))
            .collect()
    }

    #[test]
    fn no_commits_is_neutral() {
        let report = analyze_commits(&[], &PatternConfig::default());
        assert!(report.passed);
        assert_eq!(report.label, BehaviorLabel::NoCommits);
        assert_eq!(report.detail, "No commits to analyze");
    }

    #[test]
    fn steady_history_is_healthy() {
        let report = analyze_commits(&steady_history(), &PatternConfig::default());
        assert!(report.passed);
        assert!(report.flags.is_empty());
        assert_eq!(report.label, BehaviorLabel::Healthy);
        assert_eq!(report.status, Status::Pass);
        assert_eq!(report.detail, "Healthy - 8 commits, avg 40 lines/commit");
    }

    #[test]
    fn large_commit_is_always_critical() {
        let mut history = steady_history();
        history.push(commit("deadbeefcafe", "2026-03-04T12:00:00Z", 500));
        let report = analyze_commits(&history, &PatternConfig::default());
        assert!(!report.passed);
        assert_eq!(report.label, BehaviorLabel::Suspicious);
        assert_eq!(report.status, Status::Alert);
        let dump = report.critical_flags().next().unwrap();
        assert_eq!(
            dump.message,
            "Code dump: alice added 500 lines in one commit (deadbee)"
        );
    }

    #[test]
    fn ceiling_is_exclusive() {
        let report = analyze_commits(
            &[commit("a", "2026-03-01T10:00:00Z", 200)],
            &PatternConfig::default(),
        );
        assert_eq!(report.critical_flags().count(), 0);
    }

    #[test]
    fn late_heavy_history_is_a_rush() {
        let history = vec![
            commit("a", "2026-03-01T00:00:00Z", 10),
            commit("b", "2026-03-02T00:00:00Z", 10),
            commit("c", "2026-03-03T00:00:00Z", 10),
            commit("d", "2026-03-09T00:00:00Z", 100),
            commit("e", "2026-03-11T00:00:00Z", 100),
        ];
        let report = analyze_commits(&history, &PatternConfig::default());
        assert!(report.passed);
        assert_eq!(report.label, BehaviorLabel::NeedsReview);
        let rush = report
            .flags
            .iter()
            .find(|f| f.kind == PatternKind::Rush)
            .unwrap();
        assert_eq!(
            rush.message,
            "Rush detected: 87% of code added in final 25% of timeline"
        );
    }

    #[test]
    fn rush_needs_four_timestamped_commits() {
        let history = vec![
            commit("a", "2026-03-01T00:00:00Z", 1),
            commit("b", "not a date", 1),
            commit("c", "2026-03-02T00:00:00Z", 1),
            commit("d", "2026-03-10T00:00:00Z", 100),
        ];
        let report = analyze_commits(&history, &PatternConfig::default());
        assert!(!report.flags.iter().any(|f| f.kind == PatternKind::Rush));
    }

    #[test]
    fn rush_ignores_input_order() {
        let history = vec![
            commit("e", "2026-03-11T00:00:00Z", 100),
            commit("a", "2026-03-01T00:00:00Z", 10),
            commit("d", "2026-03-09T00:00:00Z", 100),
            commit("c", "2026-03-03T00:00:00Z", 10),
            commit("b", "2026-03-02T00:00:00Z", 10),
        ];
        let report = analyze_commits(&history, &PatternConfig::default());
        assert!(report.flags.iter().any(|f| f.kind == PatternKind::Rush));
    }

    #[test]
    fn out_of_range_cutoff_skips_rush() {
        let history = vec![
            commit("a", "2026-03-01T00:00:00Z", 10),
            commit("b", "2026-03-02T00:00:00Z", 10),
            commit("c", "2026-03-03T00:00:00Z", 10),
            commit("d", "2026-03-09T00:00:00Z", 100),
            commit("e", "2026-03-11T00:00:00Z", 100),
        ];
        for fraction in [1e15, -1e15] {
            let config = PatternConfig {
                rush_cutoff_fraction: fraction,
                ..PatternConfig::default()
            };
            let report = analyze_commits(&history, &config);
            assert!(report.passed);
            assert!(!report.flags.iter().any(|f| f.kind == PatternKind::Rush));
        }
    }

    #[test]
    fn zero_span_skips_rush() {
        let history: Vec<_> = (0..5)
            .map(|i| commit(&format!("c{i}"), "2026-03-01T00:00:00Z", 50))
            .collect();
        let report = analyze_commits(&history, &PatternConfig::default());
        assert!(!report.flags.iter().any(|f| f.kind == PatternKind::Rush));
    }

    #[test]
    fn few_large_commits_are_low_frequency() {
        let history = vec![
            commit("a", "2026-03-01T00:00:00Z", 180),
            commit("b", "2026-03-05T00:00:00Z", 190),
        ];
        let report = analyze_commits(&history, &PatternConfig::default());
        assert!(report.passed);
        let flag = report
            .flags
            .iter()
            .find(|f| f.kind == PatternKind::LowFrequency)
            .unwrap();
        assert_eq!(flag.severity, Severity::Warning);
        assert_eq!(
            flag.message,
            "Low commit frequency: 2 commits with avg 185 lines each"
        );
        assert_eq!(report.avg_additions_per_commit, 185.0);
        assert_eq!(
            report.detail,
            "Needs Review - 2 commits, avg 185 lines/commit | 1 flag(s)"
        );
    }

    #[test]
    fn custom_ceiling_is_respected() {
        let config = PatternConfig {
            max_dump_lines: 30,
            ..PatternConfig::default()
        };
        let report = analyze_commits(&steady_history(), &config);
        assert_eq!(report.critical_flags().count(), 8);
    }

    #[test]
    fn analysis_is_deterministic() {
        let history = steady_history();
        let a = analyze_commits(&history, &PatternConfig::default());
        let b = analyze_commits(&history, &PatternConfig::default());
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
