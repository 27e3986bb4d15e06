//! Composite AI-fingerprint score.

use std::fmt;
use std::path::Path;

use guardian_core::{round_to, GuardianError, Signal, Status};
use serde::{Deserialize, Serialize};

use crate::heuristics::{default_rules, Heuristic, RuleVerdict};
use crate::metrics::{collect_metrics, CodeMetricBundle};
use crate::walker::walk_python;

/// Score at or above which code is classified as likely AI-generated.
pub const LIKELY_AI_SCORE: f64 = 0.6;

/// Score at or above which code is flagged as suspicious.
pub const SUSPICIOUS_SCORE: f64 = 0.4;

/// Classification of a fingerprint score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FingerprintLabel {
    Human,
    Suspicious,
    LikelyAi,
    /// No Python sources were found.
    NoSources,
}

impl fmt::Display for FingerprintLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintLabel::Human => write!(f, "Human"),
            FingerprintLabel::Suspicious => write!(f, "Suspicious"),
            FingerprintLabel::LikelyAi => write!(f, "Likely AI"),
            FingerprintLabel::NoSources => write!(f, "No sources"),
        }
    }
}

/// Headline ratios shown alongside the score, each rounded for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintMetrics {
    pub comment_ratio: f64,
    pub docstring_ratio: f64,
    pub avg_var_name_length: f64,
    pub try_except_ratio: f64,
}

impl From<&CodeMetricBundle> for FingerprintMetrics {
    fn from(bundle: &CodeMetricBundle) -> Self {
        Self {
            comment_ratio: round_to(bundle.comment_ratio().unwrap_or(0.0), 2),
            docstring_ratio: round_to(bundle.docstring_ratio().unwrap_or(0.0), 2),
            avg_var_name_length: round_to(bundle.avg_identifier_length().unwrap_or(0.0), 1),
            try_except_ratio: round_to(bundle.error_handling_ratio().unwrap_or(0.0), 2),
        }
    }
}

/// Result of the AI-fingerprint analysis.
///
/// # Examples
///
/// ```
/// use guardian_fingerprint::metrics::CodeMetricBundle;
/// use guardian_fingerprint::score::{score, FingerprintLabel};
///
/// let bundle = CodeMetricBundle {
///     comment_lines: 10,
///     code_lines: 90,
///     ..CodeMetricBundle::default()
/// };
/// let report = score(&bundle);
/// assert_eq!(report.ai_score, 0.1);
/// assert_eq!(report.label, FingerprintLabel::Human);
/// assert!(report.passed);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintReport {
    /// `false` only for [`FingerprintLabel::LikelyAi`].
    pub passed: bool,
    /// Mean of applicable sub-scores, rounded to two decimals.
    pub ai_score: f64,
    /// Classification.
    pub label: FingerprintLabel,
    /// Flag texts of triggered rules, in rule order.
    pub flags: Vec<String>,
    /// Every rule's verdict, applicable or not.
    pub rules: Vec<RuleVerdict>,
    /// Headline ratios.
    pub metrics: FingerprintMetrics,
    /// Display status.
    pub status: Status,
    /// One-line summary.
    pub detail: String,
}

impl FingerprintReport {
    /// Neutral result used when there are no sources to analyze.
    pub fn no_sources(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            ai_score: 0.0,
            label: FingerprintLabel::NoSources,
            flags: Vec::new(),
            rules: Vec::new(),
            metrics: FingerprintMetrics::default(),
            status: Status::Warn,
            detail: detail.into(),
        }
    }
}

impl Signal for FingerprintReport {
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

/// Score a metric bundle with the standard rules.
pub fn score(metrics: &CodeMetricBundle) -> FingerprintReport {
    score_with(metrics, &default_rules())
}

/// Score a metric bundle with a custom rule list.
///
/// Rules whose precondition fails are reported but do not contribute.
/// With no applicable rule the score is `0.0`.
pub fn score_with(metrics: &CodeMetricBundle, rules: &[Box<dyn Heuristic>]) -> FingerprintReport {
    let verdicts: Vec<RuleVerdict> = rules.iter().map(|rule| rule.evaluate(metrics)).collect();

    for skipped in verdicts.iter().filter(|v| !v.applicable) {
        tracing::debug!(rule = %skipped.rule, "fingerprint rule precondition not met");
    }

    let applied: Vec<f64> = verdicts
        .iter()
        .filter(|v| v.applicable)
        .map(|v| v.score)
        .collect();
    let ai_score = if applied.is_empty() {
        0.0
    } else {
        round_to(applied.iter().sum::<f64>() / applied.len() as f64, 2)
    };

    let (passed, label, status) = if ai_score >= LIKELY_AI_SCORE {
        (false, FingerprintLabel::LikelyAi, Status::Alert)
    } else if ai_score >= SUSPICIOUS_SCORE {
        (true, FingerprintLabel::Suspicious, Status::Warn)
    } else {
        (true, FingerprintLabel::Human, Status::Pass)
    };

    let flags: Vec<String> = verdicts
        .iter()
        .filter_map(|v| v.explanation.clone())
        .collect();

    let mut detail = format!("AI Score: {ai_score} ({label})");
    if !flags.is_empty() {
        let shown: Vec<&str> = flags.iter().take(2).map(String::as_str).collect();
        detail.push_str(&format!(" - {}", shown.join(", ")));
    }

    FingerprintReport {
        passed,
        ai_score,
        label,
        flags,
        rules: verdicts,
        metrics: FingerprintMetrics::from(metrics),
        status,
        detail,
    }
}

/// Walk `root`, collect metrics, and score them.
///
/// A missing directory or a tree without Python files yields a neutral
/// [`FingerprintReport::no_sources`] result.
///
/// # Errors
///
/// Returns [`GuardianError::Parse`] if the Python grammar cannot be loaded.
pub fn analyze_tree(root: &Path) -> Result<FingerprintReport, GuardianError> {
    let files = match walk_python(root) {
        Ok(files) => files,
        Err(GuardianError::FileNotFound(path)) => {
            tracing::warn!(path = %path.display(), "source directory not found");
            return Ok(FingerprintReport::no_sources("No Python files to analyze"));
        }
        Err(e) => return Err(e),
    };
    if files.is_empty() {
        return Ok(FingerprintReport::no_sources("No Python files to analyze"));
    }
    let bundle = collect_metrics(&files)?;
    Ok(score(&bundle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(comment: u64, code: u64, functions: u64, documented: u64) -> CodeMetricBundle {
        CodeMetricBundle {
            comment_lines: comment,
            code_lines: code,
            functions,
            functions_with_docstring: documented,
            ..CodeMetricBundle::default()
        }
    }

    #[test]
    fn no_applicable_rule_scores_zero() {
        let report = score(&CodeMetricBundle::default());
        assert_eq!(report.ai_score, 0.0);
        assert_eq!(report.label, FingerprintLabel::Human);
        assert!(report.rules.iter().all(|r| !r.applicable));
    }

    #[test]
    fn suspicious_band_still_passes() {
        // comment 0.8, docstring 0.1 -> 0.45
        let report = score(&bundle(50, 50, 10, 1));
        assert_eq!(report.ai_score, 0.45);
        assert_eq!(report.label, FingerprintLabel::Suspicious);
        assert!(report.passed);
        assert_eq!(report.status, Status::Warn);
    }

    #[test]
    fn likely_ai_fails() {
        let mut metrics = bundle(50, 50, 10, 10);
        metrics.identifier_lengths = vec![20, 18, 22];
        // 0.8, 0.7, 0.6 -> 0.7
        let report = score(&metrics);
        assert_eq!(report.ai_score, 0.7);
        assert_eq!(report.label, FingerprintLabel::LikelyAi);
        assert!(!report.passed);
        assert_eq!(report.status, Status::Alert);
        assert_eq!(report.flags.len(), 3);
        assert_eq!(
            report.detail,
            "AI Score: 0.7 (Likely AI) - Very high comment ratio: 50% (AI typical: >40%), \
             Near-perfect docstring coverage: 100%"
        );
    }

    #[test]
    fn raising_comment_ratio_never_lowers_score() {
        let mut previous = 0.0;
        for comment in [0, 10, 25, 31, 35, 41, 60, 90] {
            let report = score(&bundle(comment, 100 - comment, 6, 3));
            assert!(report.ai_score >= previous, "comment={comment}");
            previous = report.ai_score;
        }
    }

    #[test]
    fn metrics_are_rounded_for_display() {
        let report = score(&bundle(1, 2, 3, 1));
        assert_eq!(report.metrics.comment_ratio, 0.33);
        assert_eq!(report.metrics.docstring_ratio, 0.33);
    }

    #[test]
    fn custom_rule_list_is_honored() {
        let rules: Vec<Box<dyn Heuristic>> =
            vec![Box::new(crate::heuristics::CommentDensity::default())];
        let report = score_with(&bundle(50, 50, 10, 0), &rules);
        assert_eq!(report.rules.len(), 1);
        assert_eq!(report.ai_score, 0.8);
    }

    #[test]
    fn missing_tree_is_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let report = analyze_tree(&dir.path().join("src")).unwrap();
        assert!(report.passed);
        assert_eq!(report.label, FingerprintLabel::NoSources);
    }
}
