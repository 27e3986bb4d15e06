//! Code-quality probe backed by pylint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use guardian_core::{round_to, Signal, Status};
use serde::{Deserialize, Serialize};

use crate::tool::{run_tool, ToolSettings};

/// Issues kept in the report.
const MAX_ISSUES: usize = 5;

/// One pylint finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintIssue {
    /// File name without directories.
    pub file: String,
    pub line: u64,
    /// Message category such as `warning` or `convention`.
    pub kind: String,
    pub message: String,
    pub symbol: String,
}

/// Score and findings parsed from one pylint run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PylintRun {
    /// Score out of 10; `0.0` when none could be read.
    pub score: f64,
    /// First few issues in pylint's order.
    pub issues: Vec<LintIssue>,
    /// Issues reported in total.
    pub total_issues: usize,
}

/// Result of the code-quality check.
///
/// # Examples
///
/// ```
/// use guardian_external::QualityReport;
///
/// let report = QualityReport::skipped("No Python files found in src/");
/// assert!(report.passed);
/// assert!(report.score.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub passed: bool,
    /// Pylint score, `None` when the check did not run.
    pub score: Option<f64>,
    pub issues: Vec<LintIssue>,
    pub total_issues: usize,
    pub files_checked: usize,
    pub status: Status,
    pub detail: String,
}

impl QualityReport {
    /// Neutral result for a check that could not or need not run.
    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            score: None,
            issues: Vec::new(),
            total_issues: 0,
            files_checked: 0,
            status: Status::Warn,
            detail: detail.into(),
        }
    }

    /// Judge a parsed pylint run against the minimum score.
    ///
    /// # Examples
    ///
    /// ```
    /// use guardian_external::lint::{PylintRun, QualityReport};
    ///
    /// let run = PylintRun { score: 8.26, ..PylintRun::default() };
    /// let report = QualityReport::from_run(run, 3, 7.0);
    /// assert!(report.passed);
    /// assert_eq!(report.detail, "Pylint: 8.3/10 (0 issues in 3 files)");
    /// ```
    pub fn from_run(run: PylintRun, files_checked: usize, min_score: f64) -> Self {
        let passed = run.score >= min_score;
        Self {
            passed,
            score: Some(round_to(run.score, 2)),
            detail: format!(
                "Pylint: {:.1}/10 ({} issues in {} files)",
                run.score, run.total_issues, files_checked
            ),
            issues: run.issues,
            total_issues: run.total_issues,
            files_checked,
            status: if passed { Status::Pass } else { Status::Fail },
        }
    }
}

impl Signal for QualityReport {
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

/// Parse pylint output.
///
/// Reads the `json2` document (`messages` plus `statistics.score`), falls
/// back to the legacy JSON array of messages, and finally to the
/// `rated at X/10` line when no score was found.
///
/// # Examples
///
/// ```
/// use guardian_external::lint::parse_pylint_output;
///
/// let stdout = r#"{"messages": [], "statistics": {"score": 9.5}}"#;
/// assert_eq!(parse_pylint_output(stdout, "").score, 9.5);
///
/// let legacy = "Your code has been rated at 6.40/10 (previous run: 6.00/10)";
/// assert_eq!(parse_pylint_output("", legacy).score, 6.4);
/// ```
pub fn parse_pylint_output(stdout: &str, stderr: &str) -> PylintRun {
    let trimmed = stdout.trim();
    let mut messages: Vec<serde_json::Value> = Vec::new();
    let mut score = 0.0;

    if !trimmed.is_empty() {
        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Object(doc)) => {
                if let Some(list) = doc.get("messages").and_then(|m| m.as_array()) {
                    messages = list.clone();
                }
                score = doc
                    .get("statistics")
                    .and_then(|s| s.get("score"))
                    .and_then(|s| s.as_f64())
                    .unwrap_or(0.0);
            }
            Ok(serde_json::Value::Array(list)) => messages = list,
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "pylint output is not JSON"),
        }
    }

    if score == 0.0 {
        score = rated_at(stdout)
            .or_else(|| rated_at(stderr))
            .unwrap_or(0.0);
    }

    PylintRun {
        score,
        total_issues: messages.len(),
        issues: messages.iter().take(MAX_ISSUES).map(issue_from_json).collect(),
    }
}

fn rated_at(text: &str) -> Option<f64> {
    let line = text.lines().find(|l| l.contains("rated at"))?;
    let rest = line.split("rated at").nth(1)?;
    rest.split('/').next()?.trim().parse().ok()
}

fn issue_from_json(value: &serde_json::Value) -> LintIssue {
    let text = |key: &str, fallback: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(fallback)
            .to_string()
    };
    let path = text("path", "unknown");
    let file = Path::new(&path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or(path);

    LintIssue {
        file,
        line: value.get("line").and_then(|v| v.as_u64()).unwrap_or(0),
        kind: text("type", "unknown"),
        message: text("message", ""),
        symbol: text("symbol", ""),
    }
}

/// Lint `files` (relative to `root`) and score them against `min_score`.
///
/// Non-Python projects, an empty file list, a missing pylint, and a timeout
/// all yield a neutral [`QualityReport::skipped`] result.
pub async fn check_quality(
    root: &Path,
    files: &[PathBuf],
    language: &str,
    min_score: f64,
    settings: &ToolSettings,
) -> QualityReport {
    if !language.eq_ignore_ascii_case("python") {
        return QualityReport::skipped(format!("Quality check not configured for {language}"));
    }
    if files.is_empty() {
        return QualityReport::skipped(format!(
            "No Python files found in {}/",
            root.display()
        ));
    }

    let mut args: Vec<String> = [
        "-m",
        "pylint",
        "--output-format=json2",
        "--disable=C0114,C0115,C0116",
        "--max-line-length=120",
        "--score=y",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.extend(files.iter().map(|f| root.join(f).to_string_lossy().to_string()));

    let timeout = Duration::from_secs(settings.lint_timeout_secs);
    match run_tool(&settings.python, &args, timeout).await {
        Ok(output) if output.stderr.contains("No module named pylint") => {
            tracing::warn!("pylint is not installed, quality check skipped");
            QualityReport::skipped("Pylint not installed - skipped")
        }
        Ok(output) => {
            let run = parse_pylint_output(&output.stdout, &output.stderr);
            tracing::info!(score = run.score, issues = run.total_issues, "pylint finished");
            QualityReport::from_run(run, files.len(), min_score)
        }
        Err(e) => {
            tracing::warn!(error = %e, "pylint unavailable, quality check skipped");
            QualityReport::skipped("Pylint unavailable - skipped")
        }
    }
}
