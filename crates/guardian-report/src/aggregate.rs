//! Signal aggregation: one verdict per check, folded into a single decision.

use guardian_core::{GuardianConfig, Signal, Status};
use guardian_external::code_search::CodeSearchReport;
use guardian_external::corpus::CorpusReport;
use guardian_external::lint::QualityReport;
use guardian_fingerprint::{score, CodeMetricBundle, FingerprintReport};
use guardian_gitpulse::behavior::{analyze_commits, BehaviorReport};
use guardian_gitpulse::equity::{analyze_equity, ContributorRecord, EquityReport};
use guardian_gitpulse::mining::CommitEvent;
use guardian_gitpulse::proofs::ProofReport;
use guardian_timing::{evaluate_timestamp, Schedule, TimingVerdict};
use serde::{Deserialize, Serialize};

/// Peer comparison between teams (plagiarism layer L2).
///
/// It runs out of band on a weekly schedule, so an evaluation only records
/// that fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerComparison {
    pub passed: bool,
    pub status: Status,
    pub detail: String,
}

impl Default for PeerComparison {
    fn default() -> Self {
        Self {
            passed: true,
            status: Status::Pass,
            detail: "Runs via weekly scheduled workflow".into(),
        }
    }
}

impl Signal for PeerComparison {
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

/// The five plagiarism layers and their combined verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlagiarismSummary {
    /// `true` when every layer passed.
    pub passed: bool,
    /// L1: similarity against the reference corpus.
    pub corpus: CorpusReport,
    /// L2: cross-team comparison.
    pub peer: PeerComparison,
    /// L3: GitHub code search.
    pub code_search: CodeSearchReport,
    /// L4: AI fingerprint.
    pub fingerprint: FingerprintReport,
    /// L5: commit behavior.
    pub commit_patterns: BehaviorReport,
    /// Names of the failing layers, in layer order.
    pub critical_layers: Vec<String>,
    pub status: Status,
    pub detail: String,
}

impl PlagiarismSummary {
    /// Combine the five layer verdicts.
    ///
    /// # Examples
    ///
    /// ```
    /// use guardian_external::{CodeSearchReport, CorpusReport};
    /// use guardian_fingerprint::FingerprintReport;
    /// use guardian_gitpulse::behavior::BehaviorReport;
    /// use guardian_report::aggregate::{PeerComparison, PlagiarismSummary};
    ///
    /// let summary = PlagiarismSummary::new(
    ///     CorpusReport::skipped("No reference corpus available"),
    ///     PeerComparison::default(),
    ///     CodeSearchReport::skipped("GitHub token not configured - skipped"),
    ///     FingerprintReport::no_sources("No Python files to analyze"),
    ///     BehaviorReport::unavailable("No git history available"),
    /// );
    /// assert!(summary.passed);
    /// assert_eq!(summary.detail, "All layers clear");
    /// ```
    pub fn new(
        corpus: CorpusReport,
        peer: PeerComparison,
        code_search: CodeSearchReport,
        fingerprint: FingerprintReport,
        commit_patterns: BehaviorReport,
    ) -> Self {
        let layers: [(&str, &dyn Signal); 5] = [
            ("L1 corpus", &corpus),
            ("L2 peer", &peer),
            ("L3 code search", &code_search),
            ("L4 AI fingerprint", &fingerprint),
            ("L5 commit patterns", &commit_patterns),
        ];
        let critical_layers: Vec<String> = layers
            .iter()
            .filter(|(_, signal)| !signal.passed())
            .map(|(name, _)| name.to_string())
            .collect();

        let passed = critical_layers.is_empty();
        let (status, detail) = if passed {
            (Status::Pass, "All layers clear".to_string())
        } else {
            (
                Status::Alert,
                format!("Flagged by: {}", critical_layers.join(", ")),
            )
        };

        Self {
            passed,
            corpus,
            peer,
            code_search,
            fingerprint,
            commit_patterns,
            critical_layers,
            status,
            detail,
        }
    }
}

impl Signal for PlagiarismSummary {
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

/// Everything collaborators gathered for one evaluation.
///
/// `None` marks data that could not be obtained; the matching check then
/// reports a neutral pass.
#[derive(Debug, Clone, Default)]
pub struct EvaluationInputs {
    /// Commit time, ISO 8601 with offset.
    pub commit_timestamp: Option<String>,
    pub contributors: Option<Vec<ContributorRecord>>,
    pub commits: Option<Vec<CommitEvent>>,
    pub metrics: Option<CodeMetricBundle>,
    pub quality: Option<QualityReport>,
    pub proofs: Option<ProofReport>,
    pub corpus: Option<CorpusReport>,
    pub code_search: Option<CodeSearchReport>,
}

/// The combined result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    /// `true` only when every check passed.
    pub passed: bool,
    pub timing: TimingVerdict,
    pub quality: QualityReport,
    pub proofs: ProofReport,
    pub equity: EquityReport,
    pub plagiarism: PlagiarismSummary,
}

impl EvaluationReport {
    /// The top-level checks with their display names, in report order.
    pub fn checks(&self) -> [(&'static str, &dyn Signal); 5] {
        [
            ("Timing", &self.timing),
            ("Code Quality", &self.quality),
            ("Proofs", &self.proofs),
            ("Contribution", &self.equity),
            ("Plagiarism", &self.plagiarism),
        ]
    }

    /// Names of the checks that failed.
    pub fn failed_checks(&self) -> Vec<&'static str> {
        self.checks()
            .iter()
            .filter(|(_, signal)| !signal.passed())
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Run the analyzers over collected inputs and combine their verdicts.
///
/// Performs no I/O. Missing inputs degrade to neutral verdicts, and an
/// unparseable timestamp is treated as missing.
///
/// # Examples
///
/// ```
/// use guardian_core::GuardianConfig;
/// use guardian_report::aggregate::{aggregate, EvaluationInputs};
/// use guardian_timing::Schedule;
///
/// let config = GuardianConfig::default();
/// let schedule = Schedule::from_config(&config).unwrap();
/// let report = aggregate(&config, &schedule, EvaluationInputs::default());
/// assert!(report.passed);
/// assert_eq!(report.timing.detail, "Commit timestamp not available");
/// ```
pub fn aggregate(
    config: &GuardianConfig,
    schedule: &Schedule,
    inputs: EvaluationInputs,
) -> EvaluationReport {
    let timing = match inputs.commit_timestamp.as_deref() {
        Some(ts) if !ts.trim().is_empty() => match evaluate_timestamp(schedule, ts) {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed commit timestamp");
                TimingVerdict::unavailable("Commit timestamp could not be parsed")
            }
        },
        _ => TimingVerdict::unavailable("Commit timestamp not available"),
    };

    let equity = match inputs.contributors {
        Some(records) => analyze_equity(records, config.min_contribution_pct, &config.equity),
        None => EquityReport::no_history("No git history available"),
    };

    let commit_patterns = match inputs.commits.as_deref() {
        Some(commits) => analyze_commits(commits, &config.patterns),
        None => BehaviorReport::unavailable("No git history available"),
    };

    let fingerprint = match inputs.metrics {
        Some(bundle) if bundle.files > 0 => score(&bundle),
        _ => FingerprintReport::no_sources("No Python files to analyze"),
    };

    let plagiarism = PlagiarismSummary::new(
        inputs
            .corpus
            .unwrap_or_else(|| CorpusReport::skipped("No reference corpus available")),
        PeerComparison::default(),
        inputs
            .code_search
            .unwrap_or_else(|| CodeSearchReport::skipped("Code search not run")),
        fingerprint,
        commit_patterns,
    );

    let quality = inputs
        .quality
        .unwrap_or_else(|| QualityReport::skipped("Quality check not run"));
    let proofs = inputs
        .proofs
        .unwrap_or_else(|| ProofReport::unavailable("Commit changes not available"));

    let passed = timing.passed
        && quality.passed
        && proofs.passed
        && equity.passed
        && plagiarism.passed;

    EvaluationReport {
        passed,
        timing,
        quality,
        proofs,
        equity,
        plagiarism,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_gitpulse::proofs::evaluate_proofs;

    fn config() -> GuardianConfig {
        GuardianConfig::from_json(
            r#"{
                "class_days": ["Monday", "Saturday"],
                "timezone": "Asia/Kolkata",
                "milestones": [
                    {"phase": "Phase 1", "deadline": "2026-03-01"},
                    {"phase": "Phase 2", "deadline": "2026-03-15"}
                ]
            }"#,
        )
        .unwrap()
    }

    fn commit(author: &str, timestamp: &str, additions: u64) -> CommitEvent {
        CommitEvent {
            hash: format!("{author:0<40}"),
            author: author.into(),
            email: format!("{author}@example.com"),
            timestamp: timestamp.into(),
            message: "work".into(),
            additions,
            deletions: 0,
        }
    }

    #[test]
    fn empty_inputs_pass_neutrally() {
        let config = config();
        let schedule = Schedule::from_config(&config).unwrap();
        let report = aggregate(&config, &schedule, EvaluationInputs::default());
        assert!(report.passed);
        for (name, signal) in report.checks() {
            assert!(signal.passed(), "{name} should pass");
        }
        assert_eq!(report.equity.detail, "No git history available");
        assert!(report.failed_checks().is_empty());
    }

    #[test]
    fn late_commit_fails_overall() {
        let config = config();
        let schedule = Schedule::from_config(&config).unwrap();
        let inputs = EvaluationInputs {
            commit_timestamp: Some("2026-04-01T10:30:00+05:30".into()),
            ..EvaluationInputs::default()
        };
        let report = aggregate(&config, &schedule, inputs);
        assert!(report.timing.is_late);
        assert!(!report.passed);
        assert_eq!(report.failed_checks(), vec!["Timing"]);
    }

    #[test]
    fn malformed_timestamp_is_neutral() {
        let config = config();
        let schedule = Schedule::from_config(&config).unwrap();
        let inputs = EvaluationInputs {
            commit_timestamp: Some("last tuesday".into()),
            ..EvaluationInputs::default()
        };
        let report = aggregate(&config, &schedule, inputs);
        assert!(report.timing.passed);
        assert_eq!(report.timing.detail, "Commit timestamp could not be parsed");
    }

    #[test]
    fn code_dump_fails_plagiarism_layer_five() {
        let config = config();
        let schedule = Schedule::from_config(&config).unwrap();
        let inputs = EvaluationInputs {
            commits: Some(vec![
                commit("alice", "2026-02-20T10:00:00+05:30", 20),
                commit("bob", "2026-02-21T10:00:00+05:30", 500),
            ]),
            ..EvaluationInputs::default()
        };
        let report = aggregate(&config, &schedule, inputs);
        assert!(!report.passed);
        assert!(!report.plagiarism.passed);
        assert_eq!(report.plagiarism.critical_layers, vec!["L5 commit patterns"]);
        assert_eq!(report.plagiarism.detail, "Flagged by: L5 commit patterns");
        assert_eq!(report.plagiarism.status, Status::Alert);
    }

    #[test]
    fn missing_proof_fails_only_proofs() {
        let config = config();
        let schedule = Schedule::from_config(&config).unwrap();
        let inputs = EvaluationInputs {
            proofs: Some(evaluate_proofs(&["src/app.py".to_string()], "proofs/", 0)),
            ..EvaluationInputs::default()
        };
        let report = aggregate(&config, &schedule, inputs);
        assert!(!report.passed);
        assert_eq!(report.failed_checks(), vec!["Proofs"]);
    }

    #[test]
    fn empty_metric_bundle_counts_as_no_sources() {
        let config = config();
        let schedule = Schedule::from_config(&config).unwrap();
        let inputs = EvaluationInputs {
            metrics: Some(CodeMetricBundle::default()),
            ..EvaluationInputs::default()
        };
        let report = aggregate(&config, &schedule, inputs);
        assert_eq!(
            report.plagiarism.fingerprint.detail,
            "No Python files to analyze"
        );
    }

    #[test]
    fn aggregation_is_deterministic() {
        let config = config();
        let schedule = Schedule::from_config(&config).unwrap();
        let inputs = EvaluationInputs {
            commit_timestamp: Some("2026-02-28T10:30:00+05:30".into()),
            contributors: Some(vec![
                ContributorRecord::new("alice", 6, 300, 10),
                ContributorRecord::new("bob", 5, 250, 4),
            ]),
            ..EvaluationInputs::default()
        };
        let first = aggregate(&config, &schedule, inputs.clone());
        let second = aggregate(&config, &schedule, inputs);
        assert_eq!(first, second);
        assert!(first.timing.is_class_day);
        assert_eq!(first.timing.current_phase.as_deref(), Some("Phase 1"));
    }
}
