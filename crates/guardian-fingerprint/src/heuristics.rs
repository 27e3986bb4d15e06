//! Independent AI-fingerprint rules.
//!
//! Each rule inspects a [`CodeMetricBundle`] and reports whether its
//! minimum-sample precondition held, its sub-score, and an optional flag.
//! The scorer averages whatever rules applied, so rules can be added,
//! removed, or retuned without touching aggregation.

use serde::{Deserialize, Serialize};

use crate::metrics::CodeMetricBundle;

/// Outcome of one rule against one metric bundle.
///
/// # Examples
///
/// ```
/// use guardian_fingerprint::heuristics::RuleVerdict;
///
/// let verdict = RuleVerdict::not_applicable("docstring_coverage");
/// assert!(!verdict.applicable);
/// assert_eq!(verdict.score, 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleVerdict {
    /// Rule name.
    pub rule: String,
    /// Whether the minimum-sample precondition held.
    pub applicable: bool,
    /// Sub-score in `[0, 1]`; meaningless when not applicable.
    pub score: f64,
    /// Flag text with the measured value, when a threshold triggered.
    pub explanation: Option<String>,
}

impl RuleVerdict {
    /// Verdict for a rule whose precondition did not hold.
    pub fn not_applicable(rule: &str) -> Self {
        Self {
            rule: rule.to_string(),
            applicable: false,
            score: 0.0,
            explanation: None,
        }
    }

    fn scored(rule: &str, score: f64, explanation: Option<String>) -> Self {
        Self {
            rule: rule.to_string(),
            applicable: true,
            score,
            explanation,
        }
    }
}

/// A single fingerprint rule.
pub trait Heuristic: Send + Sync {
    /// Stable rule name used in reports.
    fn name(&self) -> &'static str;

    /// Evaluate the rule against a metric bundle.
    fn evaluate(&self, metrics: &CodeMetricBundle) -> RuleVerdict;
}

/// Comment lines as a share of all non-blank lines.
#[derive(Debug, Clone)]
pub struct CommentDensity {
    pub high: f64,
    pub medium: f64,
}

impl Default for CommentDensity {
    fn default() -> Self {
        Self {
            high: 0.40,
            medium: 0.30,
        }
    }
}

impl Heuristic for CommentDensity {
    fn name(&self) -> &'static str {
        "comment_density"
    }

    fn evaluate(&self, metrics: &CodeMetricBundle) -> RuleVerdict {
        let Some(ratio) = metrics.comment_ratio() else {
            return RuleVerdict::not_applicable(self.name());
        };
        if ratio > self.high {
            RuleVerdict::scored(
                self.name(),
                0.8,
                Some(format!(
                    "Very high comment ratio: {} (AI typical: >{})",
                    pct(ratio),
                    pct(self.high)
                )),
            )
        } else if ratio > self.medium {
            RuleVerdict::scored(
                self.name(),
                0.4,
                Some(format!("High comment ratio: {}", pct(ratio))),
            )
        } else {
            RuleVerdict::scored(self.name(), 0.1, None)
        }
    }
}

/// Share of functions opening with a docstring.
#[derive(Debug, Clone)]
pub struct DocstringCoverage {
    /// Functions that must be observed before the rule applies (exclusive).
    pub min_functions: u64,
    pub high: f64,
    pub medium: f64,
}

impl Default for DocstringCoverage {
    fn default() -> Self {
        Self {
            min_functions: 2,
            high: 0.90,
            medium: 0.70,
        }
    }
}

impl Heuristic for DocstringCoverage {
    fn name(&self) -> &'static str {
        "docstring_coverage"
    }

    fn evaluate(&self, metrics: &CodeMetricBundle) -> RuleVerdict {
        if metrics.functions <= self.min_functions {
            return RuleVerdict::not_applicable(self.name());
        }
        let Some(ratio) = metrics.docstring_ratio() else {
            return RuleVerdict::not_applicable(self.name());
        };
        if ratio > self.high {
            RuleVerdict::scored(
                self.name(),
                0.7,
                Some(format!("Near-perfect docstring coverage: {}", pct(ratio))),
            )
        } else if ratio > self.medium {
            RuleVerdict::scored(self.name(), 0.3, None)
        } else {
            RuleVerdict::scored(self.name(), 0.1, None)
        }
    }
}

/// Uniformly long, descriptive variable names.
#[derive(Debug, Clone)]
pub struct NamingUniformity {
    pub avg_length: f64,
    pub long_name: usize,
    pub long_fraction: f64,
}

impl Default for NamingUniformity {
    fn default() -> Self {
        Self {
            avg_length: 12.0,
            long_name: 15,
            long_fraction: 0.3,
        }
    }
}

impl Heuristic for NamingUniformity {
    fn name(&self) -> &'static str {
        "naming_uniformity"
    }

    fn evaluate(&self, metrics: &CodeMetricBundle) -> RuleVerdict {
        let (Some(avg), Some(long)) = (
            metrics.avg_identifier_length(),
            metrics.long_identifier_fraction(self.long_name),
        ) else {
            return RuleVerdict::not_applicable(self.name());
        };
        if avg > self.avg_length && long > self.long_fraction {
            RuleVerdict::scored(
                self.name(),
                0.6,
                Some(format!(
                    "Unusually long variable names: avg {avg:.1} chars, {} are >{} chars",
                    pct(long),
                    self.long_name
                )),
            )
        } else {
            RuleVerdict::scored(self.name(), 0.1, None)
        }
    }
}

/// `try` blocks as a share of all control blocks.
#[derive(Debug, Clone)]
pub struct ErrorHandlingDensity {
    /// Control blocks that must be observed before the rule applies (exclusive).
    pub min_blocks: u64,
    pub high: f64,
}

impl Default for ErrorHandlingDensity {
    fn default() -> Self {
        Self {
            min_blocks: 3,
            high: 0.5,
        }
    }
}

impl Heuristic for ErrorHandlingDensity {
    fn name(&self) -> &'static str {
        "error_handling_density"
    }

    fn evaluate(&self, metrics: &CodeMetricBundle) -> RuleVerdict {
        if metrics.control_blocks <= self.min_blocks {
            return RuleVerdict::not_applicable(self.name());
        }
        let Some(ratio) = metrics.error_handling_ratio() else {
            return RuleVerdict::not_applicable(self.name());
        };
        if ratio > self.high {
            RuleVerdict::scored(
                self.name(),
                0.6,
                Some(format!("High try/except density: {} of blocks", pct(ratio))),
            )
        } else {
            RuleVerdict::scored(self.name(), 0.1, None)
        }
    }
}

/// The four standard rules, in report order.
pub fn default_rules() -> Vec<Box<dyn Heuristic>> {
    vec![
        Box::new(CommentDensity::default()),
        Box::new(DocstringCoverage::default()),
        Box::new(NamingUniformity::default()),
        Box::new(ErrorHandlingDensity::default()),
    ]
}

fn pct(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(comment: u64, code: u64) -> CodeMetricBundle {
        CodeMetricBundle {
            comment_lines: comment,
            code_lines: code,
            ..CodeMetricBundle::default()
        }
    }

    #[test]
    fn comment_density_tiers() {
        let rule = CommentDensity::default();
        let high = rule.evaluate(&lines(45, 55));
        assert_eq!(high.score, 0.8);
        assert_eq!(
            high.explanation.as_deref(),
            Some("Very high comment ratio: 45% (AI typical: >40%)")
        );
        assert_eq!(rule.evaluate(&lines(35, 65)).score, 0.4);
        assert_eq!(rule.evaluate(&lines(30, 70)).score, 0.1);
        assert!(!rule.evaluate(&lines(10, 0)).applicable);
    }

    #[test]
    fn docstring_rule_needs_three_functions() {
        let rule = DocstringCoverage::default();
        let two = CodeMetricBundle {
            functions: 2,
            functions_with_docstring: 2,
            ..CodeMetricBundle::default()
        };
        assert!(!rule.evaluate(&two).applicable);

        let all = CodeMetricBundle {
            functions: 10,
            functions_with_docstring: 10,
            ..CodeMetricBundle::default()
        };
        let verdict = rule.evaluate(&all);
        assert_eq!(verdict.score, 0.7);
        assert_eq!(
            verdict.explanation.as_deref(),
            Some("Near-perfect docstring coverage: 100%")
        );

        let most = CodeMetricBundle {
            functions: 10,
            functions_with_docstring: 8,
            ..CodeMetricBundle::default()
        };
        assert_eq!(rule.evaluate(&most).score, 0.3);
        assert!(rule.evaluate(&most).explanation.is_none());
    }

    #[test]
    fn naming_rule_needs_both_conditions() {
        let rule = NamingUniformity::default();
        let long = CodeMetricBundle {
            identifier_lengths: vec![18, 20, 16, 9],
            ..CodeMetricBundle::default()
        };
        let verdict = rule.evaluate(&long);
        assert_eq!(verdict.score, 0.6);
        assert_eq!(
            verdict.explanation.as_deref(),
            Some("Unusually long variable names: avg 15.8 chars, 75% are >15 chars")
        );

        // Long average driven by one outlier, few long names.
        let skewed = CodeMetricBundle {
            identifier_lengths: vec![60, 3, 3, 3, 3],
            ..CodeMetricBundle::default()
        };
        assert_eq!(rule.evaluate(&skewed).score, 0.1);
        assert!(!rule.evaluate(&CodeMetricBundle::default()).applicable);
    }

    #[test]
    fn error_rule_needs_four_blocks() {
        let rule = ErrorHandlingDensity::default();
        let few = CodeMetricBundle {
            try_blocks: 3,
            control_blocks: 3,
            ..CodeMetricBundle::default()
        };
        assert!(!rule.evaluate(&few).applicable);

        let dense = CodeMetricBundle {
            try_blocks: 3,
            control_blocks: 4,
            ..CodeMetricBundle::default()
        };
        let verdict = rule.evaluate(&dense);
        assert_eq!(verdict.score, 0.6);
        assert_eq!(
            verdict.explanation.as_deref(),
            Some("High try/except density: 75% of blocks")
        );

        let half = CodeMetricBundle {
            try_blocks: 2,
            control_blocks: 4,
            ..CodeMetricBundle::default()
        };
        assert_eq!(rule.evaluate(&half).score, 0.1);
    }

    #[test]
    fn default_rules_have_distinct_names() {
        let rules = default_rules();
        let mut names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }
}
