use std::path::{Path, PathBuf};

use guardian_core::{GuardianConfig, GuardianError};
use guardian_external::code_search::check_code_search;
use guardian_external::corpus::check_corpus;
use guardian_external::lint::check_quality;
use guardian_external::ToolSettings;
use guardian_fingerprint::snippets::{extract_snippets, FunctionSnippet};
use guardian_fingerprint::walker::{walk_python, SourceFile};
use guardian_fingerprint::{collect_metrics, CodeMetricBundle};
use guardian_gitpulse::mining::{mine_history, tally_contributors, MiningOptions};
use guardian_gitpulse::proofs::{changed_files, count_proofs, evaluate_proofs, ProofReport};
use guardian_timing::Schedule;
use serde::Serialize;

use crate::aggregate::{aggregate, EvaluationInputs, EvaluationReport};
use crate::markdown::render_markdown;

/// Snippets extracted for code search.
const MAX_SNIPPETS: usize = 5;

/// What to evaluate and where the collaborators find their data.
///
/// # Examples
///
/// ```
/// use guardian_report::pipeline::EvaluationRequest;
///
/// let request = EvaluationRequest::new(".");
/// assert_eq!(request.commit_sha, "HEAD");
/// assert_eq!(request.source_dir.to_str(), Some("src"));
/// ```
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    /// Repository working tree.
    pub repo_path: PathBuf,
    /// Student sources, relative to `repo_path` unless absolute.
    pub source_dir: PathBuf,
    /// Reference corpus, relative to `repo_path` unless absolute.
    pub reference_dir: PathBuf,
    /// Revision whose changes are checked for proofs.
    pub commit_sha: String,
    /// Commit time, ISO 8601 with offset.
    pub commit_timestamp: Option<String>,
    pub commit_author: String,
    pub github_token: Option<String>,
    pub tools: ToolSettings,
}

impl EvaluationRequest {
    /// A request for `repo_path` with the conventional layout.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            source_dir: PathBuf::from("src"),
            reference_dir: PathBuf::from("references"),
            commit_sha: "HEAD".into(),
            commit_timestamp: None,
            commit_author: "unknown".into(),
            github_token: None,
            tools: ToolSettings::default(),
        }
    }

    fn resolve(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.repo_path.join(dir)
        }
    }
}

/// A finished evaluation: the structured report and its markdown rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub report: EvaluationReport,
    pub markdown: String,
}

/// Run every collaborator, aggregate their results, and render the report.
///
/// History mining, the source scan, and the proof check run first; the
/// three external probes then run concurrently. Any collaborator failure is
/// logged and becomes a neutral verdict.
///
/// # Errors
///
/// Returns [`GuardianError::TimeZone`] or [`GuardianError::Config`] when the
/// milestone schedule cannot be built from `config`.
pub async fn run_evaluation(
    config: &GuardianConfig,
    request: &EvaluationRequest,
) -> Result<Evaluation, GuardianError> {
    let schedule = Schedule::from_config(config)?;
    let mut inputs = EvaluationInputs {
        commit_timestamp: request.commit_timestamp.clone(),
        ..EvaluationInputs::default()
    };

    tracing::info!(repo = %request.repo_path.display(), "mining history");
    match mine_history(&request.repo_path, &MiningOptions::from(&config.mining)) {
        Ok(commits) => {
            inputs.contributors = Some(tally_contributors(&commits));
            inputs.commits = Some(commits);
        }
        Err(e) => tracing::warn!(error = %e, "history unavailable, equity and patterns skipped"),
    }

    let source_root = request.resolve(&request.source_dir);
    tracing::info!(source = %source_root.display(), "scanning sources");
    let scan = scan_sources(&source_root);
    inputs.metrics = scan.metrics;

    inputs.proofs = check_proofs(config, request);

    let reference_root = request.resolve(&request.reference_dir);
    let paths: Vec<PathBuf> = scan.files.iter().map(|f| f.path.clone()).collect();
    tracing::info!("running external probes");
    let (quality, corpus, code_search) = tokio::join!(
        check_quality(
            &source_root,
            &paths,
            &config.language,
            config.min_quality_score,
            &request.tools,
        ),
        check_corpus(
            &source_root,
            &reference_root,
            config.plagiarism_threshold,
            &request.tools,
        ),
        check_code_search(&scan.snippets, request.github_token.as_deref()),
    );
    inputs.quality = Some(quality);
    inputs.corpus = Some(corpus);
    inputs.code_search = Some(code_search);

    let report = aggregate(config, &schedule, inputs);
    tracing::info!(
        passed = report.passed,
        failed = ?report.failed_checks(),
        "evaluation finished"
    );
    let markdown = render_markdown(&report, config, &request.commit_author);

    Ok(Evaluation { report, markdown })
}

#[derive(Default)]
struct SourceScan {
    files: Vec<SourceFile>,
    metrics: Option<CodeMetricBundle>,
    snippets: Vec<FunctionSnippet>,
}

fn scan_sources(root: &Path) -> SourceScan {
    let files = match walk_python(root) {
        Ok(files) if !files.is_empty() => files,
        Ok(_) => return SourceScan::default(),
        Err(e) => {
            tracing::warn!(error = %e, "sources unavailable, fingerprint skipped");
            return SourceScan::default();
        }
    };

    let metrics = match collect_metrics(&files) {
        Ok(bundle) => Some(bundle),
        Err(e) => {
            tracing::warn!(error = %e, "metric collection failed");
            None
        }
    };
    let snippets = extract_snippets(&files, MAX_SNIPPETS).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "snippet extraction failed");
        Vec::new()
    });

    SourceScan {
        files,
        metrics,
        snippets,
    }
}

fn check_proofs(config: &GuardianConfig, request: &EvaluationRequest) -> Option<ProofReport> {
    match changed_files(&request.repo_path, &request.commit_sha) {
        Ok(changed) => {
            let total = count_proofs(&request.repo_path, &config.proof_directory);
            Some(evaluate_proofs(&changed, &config.proof_directory, total))
        }
        Err(e) => {
            tracing::warn!(error = %e, "commit changes unavailable, proof check skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_dirs_resolve_against_repo() {
        let request = EvaluationRequest::new("/work/team");
        assert_eq!(
            request.resolve(Path::new("src")),
            PathBuf::from("/work/team/src")
        );
    }

    #[cfg(unix)]
    #[test]
    fn absolute_dirs_are_kept() {
        let request = EvaluationRequest::new("/work/team");
        assert_eq!(
            request.resolve(Path::new("/corpus")),
            PathBuf::from("/corpus")
        );
    }

    #[test]
    fn missing_sources_scan_empty() {
        let dir = tempfile::tempdir().unwrap();
        let scan = scan_sources(&dir.path().join("src"));
        assert!(scan.files.is_empty());
        assert!(scan.metrics.is_none());
    }

    #[tokio::test]
    async fn bad_time_zone_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = GuardianConfig {
            timezone: "Mars/Olympus".into(),
            ..GuardianConfig::default()
        };
        let err = run_evaluation(&config, &EvaluationRequest::new(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardianError::TimeZone(_)));
    }

    #[tokio::test]
    async fn directory_without_git_is_neutral() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = EvaluationRequest::new(dir.path());
        request.tools.python = "guardian-no-such-python".into();
        let evaluation = run_evaluation(&GuardianConfig::default(), &request)
            .await
            .unwrap();
        assert!(evaluation.report.passed);
        assert_eq!(evaluation.report.equity.detail, "No git history available");
        assert!(evaluation.markdown.contains("| Metric | Result | Status |"));
    }
}
