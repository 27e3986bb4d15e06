//! Similarity against a local reference corpus, via copydetect.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use guardian_core::{Signal, Status};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tool::{run_tool, ToolSettings};

/// Flagged lines kept in the report.
const MAX_FLAGGED: usize = 5;

fn percent_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(\d+\.?\d*)%").ok())
        .as_ref()
}

/// One copydetect line at or above the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityMatch {
    /// The reported line, trimmed.
    pub detail: String,
    /// Similarity in percent.
    pub score: f64,
}

/// Result of the corpus comparison.
///
/// # Examples
///
/// ```
/// use guardian_external::corpus::CorpusReport;
///
/// let report = CorpusReport::from_output("test.py: 12.4% similar to ref.py", 30.0);
/// assert!(report.passed);
/// assert_eq!(report.max_similarity, 12.4);
/// assert_eq!(report.detail, "12% max similarity vs corpus");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusReport {
    pub passed: bool,
    /// Highest similarity seen, in percent.
    pub max_similarity: f64,
    pub flagged_files: Vec<SimilarityMatch>,
    pub status: Status,
    pub detail: String,
}

impl CorpusReport {
    /// Neutral result for a comparison that did not run.
    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            max_similarity: 0.0,
            flagged_files: Vec::new(),
            status: Status::Warn,
            detail: detail.into(),
        }
    }

    /// Judge copydetect output against `threshold_pct`.
    ///
    /// Only lines mentioning "similar" or "match" are read. The first
    /// percentage on such a line is its score.
    pub fn from_output(output: &str, threshold_pct: f64) -> Self {
        let mut max_similarity: f64 = 0.0;
        let mut flagged = Vec::new();

        for line in output.lines() {
            if !line.contains('%') {
                continue;
            }
            let lower = line.to_lowercase();
            if !lower.contains("similar") && !lower.contains("match") {
                continue;
            }
            let Some(pct) = percent_pattern()
                .and_then(|re| re.captures(line))
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
            else {
                tracing::debug!(line, "skipping copydetect line without a percentage");
                continue;
            };
            max_similarity = max_similarity.max(pct);
            if pct >= threshold_pct {
                flagged.push(SimilarityMatch {
                    detail: line.trim().to_string(),
                    score: pct,
                });
            }
        }
        flagged.truncate(MAX_FLAGGED);

        let passed = max_similarity < threshold_pct;
        Self {
            passed,
            max_similarity,
            flagged_files: flagged,
            status: if passed { Status::Pass } else { Status::Alert },
            detail: format!("{max_similarity:.0}% max similarity vs corpus"),
        }
    }
}

impl Signal for CorpusReport {
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

/// Compare `source_dir` against every repository under `reference_dir`.
///
/// `threshold_pct` is the plagiarism threshold in percent. An absent or
/// empty corpus, a missing copydetect, and a timeout are neutral.
pub async fn check_corpus(
    source_dir: &Path,
    reference_dir: &Path,
    threshold_pct: f64,
    settings: &ToolSettings,
) -> CorpusReport {
    let has_corpus = std::fs::read_dir(reference_dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if !has_corpus {
        return CorpusReport::skipped("No reference corpus available");
    }

    let report_path = std::env::temp_dir().join("pbl_copydetect_report.html");
    let args = vec![
        "-m".to_string(),
        "copydetect".to_string(),
        "-t".to_string(),
        source_dir.to_string_lossy().to_string(),
        "-r".to_string(),
        reference_dir.to_string_lossy().to_string(),
        "--extensions".to_string(),
        "py".to_string(),
        "--display-t".to_string(),
        (threshold_pct / 100.0).to_string(),
        "--out".to_string(),
        report_path.to_string_lossy().to_string(),
    ];

    let timeout = Duration::from_secs(settings.corpus_timeout_secs);
    match run_tool(&settings.python, &args, timeout).await {
        Ok(output) if output.stderr.contains("No module named copydetect") => {
            tracing::warn!("copydetect is not installed, corpus check skipped");
            CorpusReport::skipped("copydetect not installed - skipped")
        }
        Ok(output) => CorpusReport::from_output(&output.combined(), threshold_pct),
        Err(e) => {
            tracing::warn!(error = %e, "copydetect unavailable, corpus check skipped");
            CorpusReport::skipped("copydetect unavailable - skipped")
        }
    }
}
