use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a triggered pattern rule.
///
/// Critical flags fail their check; warnings are surfaced but still pass.
///
/// # Examples
///
/// ```
/// use guardian_core::Severity;
///
/// let s: Severity = serde_json::from_str("\"critical\"").unwrap();
/// assert_eq!(s, Severity::Critical);
/// assert!(s.is_critical());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fails the check it belongs to.
    Critical,
    /// Reported for review, never fails on its own.
    Warning,
}

impl Severity {
    /// Returns `true` for [`Severity::Critical`].
    pub fn is_critical(self) -> bool {
        matches!(self, Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "warning" => Ok(Severity::Warning),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Display status of a verdict, rendered as an emoji in reports.
///
/// Status is presentation only; whether a check passed is always carried
/// separately as a boolean.
///
/// # Examples
///
/// ```
/// use guardian_core::Status;
///
/// assert_eq!(Status::Pass.emoji(), "✅");
/// assert_eq!(Status::Alert.to_string(), "alert");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Nothing to report.
    Pass,
    /// Passed, but with warnings or missing data.
    Warn,
    /// Check failed.
    Fail,
    /// Integrity alert raised by a plagiarism layer.
    Alert,
}

impl Status {
    /// Emoji used in the markdown report table.
    pub fn emoji(self) -> &'static str {
        match self {
            Status::Pass => "✅",
            Status::Warn => "⚠️",
            Status::Fail => "❌",
            Status::Alert => "🚨",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => write!(f, "pass"),
            Status::Warn => write!(f, "warn"),
            Status::Fail => write!(f, "fail"),
            Status::Alert => write!(f, "alert"),
        }
    }
}

/// A verdict produced by one check, as seen by the aggregator and renderer.
///
/// Every analyzer report implements this so the aggregate pass/fail decision
/// can fold over them without knowing their concrete shape.
pub trait Signal {
    /// Whether this check passed.
    fn passed(&self) -> bool;
    /// Display status for the report table.
    fn status(&self) -> Status;
    /// One-line human-readable summary.
    fn detail(&self) -> &str;
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use guardian_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Round `value` to `places` decimal digits.
///
/// Reports round their headline numbers so repeated runs render identically.
///
/// # Examples
///
/// ```
/// use guardian_core::round_to;
///
/// assert_eq!(round_to(0.12345, 3), 0.123);
/// assert_eq!(round_to(66.666, 1), 66.7);
/// ```
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
