//! Proof-of-progress check.
//!
//! Teams are expected to add screenshots or progress logs under a proof
//! directory whenever they change code. This module decides whether the
//! evaluated commit did so.

use std::path::Path;

use git2::Repository;
use guardian_core::{GuardianError, Signal, Status};
use serde::{Deserialize, Serialize};

const SCREENSHOT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "svg"];
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "txt", "pdf", "doc", "docx"];

/// Directories whose changes never count as code changes.
const NON_CODE_PREFIXES: &[&str] = &[".pbl/", ".github/", "scripts/"];

/// Category of a proof file, by extension.
///
/// # Examples
///
/// ```
/// use guardian_gitpulse::proofs::ProofKind;
///
/// assert_eq!(ProofKind::from_path("proofs/week1.PNG"), ProofKind::Screenshot);
/// assert_eq!(ProofKind::from_path("proofs/log.md"), ProofKind::Document);
/// assert_eq!(ProofKind::from_path("proofs/demo.mp4"), ProofKind::Other);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofKind {
    Screenshot,
    Document,
    Other,
}

impl ProofKind {
    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if SCREENSHOT_EXTENSIONS.contains(&ext.as_str()) {
            ProofKind::Screenshot
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            ProofKind::Document
        } else {
            ProofKind::Other
        }
    }
}

/// Result of the proof-of-progress check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofReport {
    /// `false` when code changed without any new proof.
    pub passed: bool,
    /// Whether any changed path lies outside the proof and tooling directories.
    pub code_changed: bool,
    /// Changed paths inside the proof directory.
    pub new_proofs: Vec<String>,
    /// New screenshots in this commit.
    pub new_screenshots_count: usize,
    /// New documents in this commit.
    pub new_documents_count: usize,
    /// New proof files of any other type.
    pub new_other_count: usize,
    /// Proof files present in the tree, excluding `.gitkeep`.
    pub total_proofs_in_repo: usize,
    /// Display status.
    pub status: Status,
    /// One-line summary.
    pub detail: String,
}

impl ProofReport {
    /// Neutral result used when the commit's changes could not be read.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            code_changed: false,
            new_proofs: Vec::new(),
            new_screenshots_count: 0,
            new_documents_count: 0,
            new_other_count: 0,
            total_proofs_in_repo: 0,
            status: Status::Warn,
            detail: detail.into(),
        }
    }
}

impl Signal for ProofReport {
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

/// Decide whether a commit's changes carry proof of progress.
///
/// # Examples
///
/// ```
/// use guardian_gitpulse::proofs::evaluate_proofs;
///
/// let changed = vec!["src/app.py".to_string(), "proofs/week3.png".to_string()];
/// let report = evaluate_proofs(&changed, "proofs/", 4);
/// assert!(report.passed);
/// assert_eq!(report.detail, "1 screenshot");
/// ```
pub fn evaluate_proofs(changed: &[String], proof_dir: &str, total_in_repo: usize) -> ProofReport {
    let prefix = format!("{}/", proof_dir.trim_end_matches('/'));

    let new_proofs: Vec<String> = changed
        .iter()
        .filter(|f| f.starts_with(&prefix))
        .cloned()
        .collect();

    let (mut screenshots, mut documents, mut other) = (0usize, 0usize, 0usize);
    for path in &new_proofs {
        if Path::new(path).file_name().and_then(|n| n.to_str()) == Some(".gitkeep") {
            continue;
        }
        match ProofKind::from_path(path) {
            ProofKind::Screenshot => screenshots += 1,
            ProofKind::Document => documents += 1,
            ProofKind::Other => other += 1,
        }
    }

    let code_changed = changed.iter().any(|f| {
        !f.starts_with(&prefix) && !NON_CODE_PREFIXES.iter().any(|p| f.starts_with(p))
    });
    let has_proof = screenshots + documents + other > 0;

    let (passed, status, detail) = if code_changed && !has_proof {
        (
            false,
            Status::Fail,
            "No proofs submitted with code changes".to_string(),
        )
    } else if !code_changed {
        (
            true,
            Status::Warn,
            "No code changes (proof not required)".to_string(),
        )
    } else {
        let parts: Vec<String> = [
            (screenshots, "screenshot"),
            (documents, "progress log"),
            (other, "other file"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, noun)| plural(count, noun))
        .collect();
        (true, Status::Pass, parts.join(", "))
    };

    ProofReport {
        passed,
        code_changed,
        new_proofs,
        new_screenshots_count: screenshots,
        new_documents_count: documents,
        new_other_count: other,
        total_proofs_in_repo: total_in_repo,
        status,
        detail,
    }
}

/// Paths changed by `rev` relative to its first parent.
///
/// A root commit lists every file it adds.
///
/// # Errors
///
/// Returns [`GuardianError::Git`] if the repository or revision cannot be read.
pub fn changed_files(repo_path: &Path, rev: &str) -> Result<Vec<String>, GuardianError> {
    let repo = Repository::open(repo_path)
        .map_err(|e| GuardianError::Git(format!("failed to open repository: {e}")))?;
    let commit = repo
        .revparse_single(rev)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|e| GuardianError::Git(format!("failed to resolve '{rev}': {e}")))?;

    let tree = commit
        .tree()
        .map_err(|e| GuardianError::Git(format!("failed to get commit tree: {e}")))?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(
            parent
                .tree()
                .map_err(|e| GuardianError::Git(format!("failed to get parent tree: {e}")))?,
        ),
        Err(_) => None,
    };

    let diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .map_err(|e| GuardianError::Git(format!("failed to compute diff: {e}")))?;

    let paths = diff
        .deltas()
        .filter_map(|delta| {
            delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    Ok(paths)
}

/// Count proof files under `root/proof_dir`, ignoring `.gitkeep`.
///
/// A missing directory counts as zero.
pub fn count_proofs(root: &Path, proof_dir: &str) -> usize {
    let dir = root.join(proof_dir.trim_end_matches('/'));
    if !dir.is_dir() {
        return 0;
    }
    ignore::WalkBuilder::new(&dir)
        .standard_filters(false)
        .build()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| entry.file_name() != ".gitkeep")
        .count()
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn code_without_proof_fails() {
        let report = evaluate_proofs(&paths(&["src/main.py"]), "proofs/", 0);
        assert!(!report.passed);
        assert!(report.code_changed);
        assert_eq!(report.status, Status::Fail);
        assert_eq!(report.detail, "No proofs submitted with code changes");
    }

    #[test]
    fn tooling_only_changes_need_no_proof() {
        let report = evaluate_proofs(
            &paths(&[".pbl/config.json", ".github/workflows/ci.yml", "scripts/x.sh"]),
            "proofs",
            0,
        );
        assert!(report.passed);
        assert!(!report.code_changed);
        assert_eq!(report.detail, "No code changes (proof not required)");
    }

    #[test]
    fn counts_each_category() {
        let report = evaluate_proofs(
            &paths(&[
                "app.py",
                "proofs/a.png",
                "proofs/b.jpg",
                "proofs/week2/log.md",
                "proofs/demo.mp4",
            ]),
            "proofs/",
            7,
        );
        assert!(report.passed);
        assert_eq!(report.new_screenshots_count, 2);
        assert_eq!(report.new_documents_count, 1);
        assert_eq!(report.new_other_count, 1);
        assert_eq!(report.total_proofs_in_repo, 7);
        assert_eq!(report.detail, "2 screenshots, 1 progress log, 1 other file");
    }

    #[test]
    fn gitkeep_is_not_a_proof() {
        let report = evaluate_proofs(&paths(&["app.py", "proofs/.gitkeep"]), "proofs/", 0);
        assert!(!report.passed);
        assert_eq!(report.new_proofs.len(), 1);
    }

    #[test]
    fn count_proofs_skips_gitkeep() {
        let dir = tempfile::tempdir().unwrap();
        let proofs = dir.path().join("proofs");
        fs::create_dir_all(proofs.join("week1")).unwrap();
        fs::write(proofs.join(".gitkeep"), "").unwrap();
        fs::write(proofs.join("a.png"), [0u8, 1, 2]).unwrap();
        fs::write(proofs.join("week1/log.md"), "# week 1").unwrap();

        assert_eq!(count_proofs(dir.path(), "proofs/"), 2);
        assert_eq!(count_proofs(dir.path(), "missing"), 0);
    }
}
