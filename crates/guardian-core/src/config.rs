use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GuardianError;

/// Default location of the team configuration, relative to the repository root.
pub const DEFAULT_CONFIG_PATH: &str = ".pbl/config.json";

/// Team configuration loaded from `.pbl/config.json`.
///
/// Every field has a default so a partial (or empty) document still yields a
/// usable configuration. Analyzers receive the pieces they need explicitly;
/// nothing reads the process environment.
///
/// # Examples
///
/// ```
/// use guardian_core::GuardianConfig;
///
/// let config = GuardianConfig::default();
/// assert_eq!(config.timezone, "Asia/Kolkata");
/// assert_eq!(config.grace_period_hours, 2.0);
/// assert_eq!(config.patterns.max_dump_lines, 200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardianConfig {
    /// Short team identifier shown in the report footer.
    #[serde(default = "default_team_id")]
    pub team_id: String,
    /// Human-readable team name.
    #[serde(default = "default_team_name")]
    pub team_name: String,
    /// Weekday names (case-insensitive) on which the class meets.
    #[serde(default)]
    pub class_days: Vec<String>,
    /// IANA time zone used to interpret deadlines and commit times.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Hours after a deadline during which commits still count as on time.
    #[serde(default = "default_grace_period_hours")]
    pub grace_period_hours: f64,
    /// Ordered milestone deadlines.
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Source language of the project (only `python` is analyzed).
    #[serde(default = "default_language")]
    pub language: String,
    /// Directory where progress screenshots and logs are committed.
    #[serde(default = "default_proof_directory")]
    pub proof_directory: String,
    /// Minimum linter score (0-10) for the quality check to pass.
    #[serde(default = "default_min_quality_score")]
    pub min_quality_score: f64,
    /// Corpus similarity percentage at which code is flagged.
    #[serde(default = "default_plagiarism_threshold")]
    pub plagiarism_threshold: f64,
    /// Minimum share of commits (percent) each member should hold.
    #[serde(default = "default_min_contribution_pct")]
    pub min_contribution_pct: f64,
    /// Contribution equity tunables.
    #[serde(default)]
    pub equity: EquityConfig,
    /// Commit behavior tunables.
    #[serde(default)]
    pub patterns: PatternConfig,
    /// History mining options.
    #[serde(default)]
    pub mining: MiningConfig,
}

impl GuardianConfig {
    /// Load configuration from `path`, picking the format from its extension.
    ///
    /// `.toml` files are parsed as TOML; anything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GuardianError::Io`] if the file cannot be read, or a
    /// serialization error if the content is malformed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use guardian_core::GuardianConfig;
    /// use std::path::Path;
    ///
    /// let config = GuardianConfig::from_file(Path::new(".pbl/config.json")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, GuardianError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_json(&content),
        }
    }

    /// Load configuration from `path`, falling back to defaults when it does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`GuardianConfig::from_file`] once the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, GuardianError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`GuardianError::Serialization`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use guardian_core::GuardianConfig;
    ///
    /// let json = r#"{
    ///     "class_days": ["Monday", "Saturday"],
    ///     "milestones": [{"phase": "Phase 1", "deadline": "2026-03-01"}]
    /// }"#;
    /// let config = GuardianConfig::from_json(json).unwrap();
    /// assert_eq!(config.milestones.len(), 1);
    /// ```
    pub fn from_json(content: &str) -> Result<Self, GuardianError> {
        let config: Self = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`GuardianError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use guardian_core::GuardianConfig;
    ///
    /// let toml = r#"
    /// timezone = "UTC"
    ///
    /// [patterns]
    /// max_dump_lines = 300
    /// "#;
    /// let config = GuardianConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.patterns.max_dump_lines, 300);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, GuardianError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

fn default_team_id() -> String {
    "unknown".into()
}

fn default_team_name() -> String {
    "Unknown Team".into()
}

fn default_timezone() -> String {
    "Asia/Kolkata".into()
}

fn default_grace_period_hours() -> f64 {
    2.0
}

fn default_language() -> String {
    "python".into()
}

fn default_proof_directory() -> String {
    "proofs/".into()
}

fn default_min_quality_score() -> f64 {
    7.0
}

fn default_plagiarism_threshold() -> f64 {
    30.0
}

fn default_min_contribution_pct() -> f64 {
    10.0
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            team_id: default_team_id(),
            team_name: default_team_name(),
            class_days: Vec::new(),
            timezone: default_timezone(),
            grace_period_hours: default_grace_period_hours(),
            milestones: Vec::new(),
            language: default_language(),
            proof_directory: default_proof_directory(),
            min_quality_score: default_min_quality_score(),
            plagiarism_threshold: default_plagiarism_threshold(),
            min_contribution_pct: default_min_contribution_pct(),
            equity: EquityConfig::default(),
            patterns: PatternConfig::default(),
            mining: MiningConfig::default(),
        }
    }
}

/// A named milestone and its deadline date.
///
/// The deadline is a calendar date; it is interpreted as midnight at the
/// start of that day in the team's time zone.
///
/// # Examples
///
/// ```
/// use guardian_core::Milestone;
///
/// let m: Milestone = serde_json::from_str(
///     r#"{"phase": "Phase 1 - Setup", "deadline": "2026-03-01"}"#,
/// ).unwrap();
/// assert_eq!(m.phase, "Phase 1 - Setup");
/// assert_eq!(m.deadline.to_string(), "2026-03-01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Phase label.
    #[serde(alias = "phase_label")]
    pub phase: String,
    /// Deadline date (`YYYY-MM-DD`).
    pub deadline: NaiveDate,
}

/// Contribution equity tunables.
///
/// # Examples
///
/// ```
/// use guardian_core::EquityConfig;
///
/// let config = EquityConfig::default();
/// assert_eq!(config.min_total_commits, 5);
/// assert_eq!(config.dominance_pct, 70.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityConfig {
    /// Low-share warnings only fire once total commits exceed this floor (default: 5).
    #[serde(default = "default_min_total_commits")]
    pub min_total_commits: u64,
    /// A member above this share of commits (percent) is flagged as dominant (default: 70).
    #[serde(default = "default_dominance_pct")]
    pub dominance_pct: f64,
    /// Gini coefficient above which the team is unbalanced and fails (default: 0.5).
    #[serde(default = "default_unbalanced_gini")]
    pub unbalanced_gini: f64,
}

fn default_min_total_commits() -> u64 {
    5
}

fn default_dominance_pct() -> f64 {
    70.0
}

fn default_unbalanced_gini() -> f64 {
    0.5
}

impl Default for EquityConfig {
    fn default() -> Self {
        Self {
            min_total_commits: default_min_total_commits(),
            dominance_pct: default_dominance_pct(),
            unbalanced_gini: default_unbalanced_gini(),
        }
    }
}

/// Commit behavior tunables.
///
/// # Examples
///
/// ```
/// use guardian_core::PatternConfig;
///
/// let config = PatternConfig::default();
/// assert_eq!(config.rush_cutoff_fraction, 0.75);
/// assert_eq!(config.rush_min_commits, 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// A single commit adding more lines than this is a code dump (default: 200).
    #[serde(default = "default_max_dump_lines")]
    pub max_dump_lines: u64,
    /// Fraction of the timeline after which additions count as late (default: 0.75).
    #[serde(default = "default_rush_cutoff_fraction")]
    pub rush_cutoff_fraction: f64,
    /// Share of additions after the cutoff that triggers a rush warning (default: 0.60).
    #[serde(default = "default_rush_late_share")]
    pub rush_late_share: f64,
    /// Minimum timestamped commits before rush detection runs (default: 4).
    #[serde(default = "default_rush_min_commits")]
    pub rush_min_commits: usize,
    /// Average additions per commit above which low frequency is suspected (default: 150).
    #[serde(default = "default_low_frequency_avg_lines")]
    pub low_frequency_avg_lines: f64,
    /// Low frequency only applies below this many commits (default: 5).
    #[serde(default = "default_low_frequency_max_commits")]
    pub low_frequency_max_commits: usize,
}

fn default_max_dump_lines() -> u64 {
    200
}

fn default_rush_cutoff_fraction() -> f64 {
    0.75
}

fn default_rush_late_share() -> f64 {
    0.60
}

fn default_rush_min_commits() -> usize {
    4
}

fn default_low_frequency_avg_lines() -> f64 {
    150.0
}

fn default_low_frequency_max_commits() -> usize {
    5
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            max_dump_lines: default_max_dump_lines(),
            rush_cutoff_fraction: default_rush_cutoff_fraction(),
            rush_late_share: default_rush_late_share(),
            rush_min_commits: default_rush_min_commits(),
            low_frequency_avg_lines: default_low_frequency_avg_lines(),
            low_frequency_max_commits: default_low_frequency_max_commits(),
        }
    }
}

/// History mining options.
///
/// # Examples
///
/// ```
/// use guardian_core::MiningConfig;
///
/// let config = MiningConfig::default();
/// assert!(!config.include_merges);
/// assert!(config.all_refs);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Include merge commits (default: false).
    #[serde(default)]
    pub include_merges: bool,
    /// Walk every local and remote branch instead of only HEAD (default: true).
    #[serde(default = "default_all_refs")]
    pub all_refs: bool,
}

fn default_all_refs() -> bool {
    true
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            include_merges: false,
            all_refs: default_all_refs(),
        }
    }
}
