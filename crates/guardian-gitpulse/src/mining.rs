//! Git history extraction via git2.
//!
//! Mines commit history from a repository into [`CommitEvent`]s carrying
//! author identity, an ISO-8601 timestamp with the author's offset, and
//! line counts from the first-parent diff.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use git2::{Commit, Repository, Sort};
use guardian_core::{GuardianError, MiningConfig};
use serde::{Deserialize, Serialize};

use crate::equity::ContributorRecord;

/// One commit on the team's timeline.
///
/// # Examples
///
/// ```
/// use guardian_gitpulse::mining::CommitEvent;
///
/// let event = CommitEvent {
///     hash: "9fceb02d0ae598e95dc970b74767f19372d61af8".into(),
///     author: "alice".into(),
///     email: "alice@example.com".into(),
///     timestamp: "2026-02-28T10:30:00+05:30".into(),
///     message: "feat: add login form".into(),
///     additions: 42,
///     deletions: 3,
/// };
/// assert_eq!(event.short_hash(), "9fceb02");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitEvent {
    /// Full commit hash.
    pub hash: String,
    /// Author name.
    pub author: String,
    /// Author email.
    pub email: String,
    /// Author time, ISO-8601 with the author's UTC offset.
    pub timestamp: String,
    /// Subject line of the commit message.
    pub message: String,
    /// Lines added relative to the first parent.
    pub additions: u64,
    /// Lines deleted relative to the first parent.
    pub deletions: u64,
}

impl CommitEvent {
    /// First seven characters of the hash.
    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }

    /// Parse [`CommitEvent::timestamp`], or `None` if it is malformed.
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(self.timestamp.trim()).ok()
    }
}

/// Options for history mining.
///
/// # Examples
///
/// ```
/// use guardian_gitpulse::mining::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert!(!opts.include_merges);
/// assert!(opts.all_refs);
/// assert!(opts.branch.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct MiningOptions {
    /// Include merge commits (default: false).
    pub include_merges: bool,
    /// Walk every local and remote branch head instead of HEAD only (default: true).
    pub all_refs: bool,
    /// Walk only this branch. Overrides `all_refs`.
    pub branch: Option<String>,
}

impl Default for MiningOptions {
    fn default() -> Self {
        Self {
            include_merges: false,
            all_refs: true,
            branch: None,
        }
    }
}

impl From<&MiningConfig> for MiningOptions {
    fn from(config: &MiningConfig) -> Self {
        Self {
            include_merges: config.include_merges,
            all_refs: config.all_refs,
            branch: None,
        }
    }
}

/// Mine commit history from a git repository.
///
/// Returns commits in chronological order (oldest first). Commits reachable
/// from several refs appear once.
///
/// # Errors
///
/// Returns [`GuardianError::Git`] if the repository cannot be opened or walked.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use guardian_gitpulse::mining::{mine_history, MiningOptions};
///
/// let commits = mine_history(Path::new("."), &MiningOptions::default()).unwrap();
/// for c in &commits {
///     println!("{} {} (+{})", c.short_hash(), c.message, c.additions);
/// }
/// ```
pub fn mine_history(
    repo_path: &Path,
    options: &MiningOptions,
) -> Result<Vec<CommitEvent>, GuardianError> {
    let repo = Repository::open(repo_path)
        .map_err(|e| GuardianError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| GuardianError::Git(format!("failed to create revwalk: {e}")))?;

    revwalk
        .set_sorting(Sort::TIME | Sort::REVERSE)
        .map_err(|e| GuardianError::Git(format!("failed to set revwalk order: {e}")))?;

    if let Some(ref branch) = options.branch {
        let reference = repo.resolve_reference_from_short_name(branch).map_err(|e| {
            GuardianError::Git(format!("failed to resolve branch '{branch}': {e}"))
        })?;
        let oid = reference
            .target()
            .ok_or_else(|| GuardianError::Git(format!("branch '{branch}' has no target")))?;
        revwalk
            .push(oid)
            .map_err(|e| GuardianError::Git(format!("failed to push oid: {e}")))?;
    } else if options.all_refs {
        for glob in ["refs/heads", "refs/remotes"] {
            revwalk
                .push_glob(glob)
                .map_err(|e| GuardianError::Git(format!("failed to push {glob}: {e}")))?;
        }
        // Detached HEAD in CI checkouts is not under any branch ref.
        if repo.head().is_ok() {
            revwalk
                .push_head()
                .map_err(|e| GuardianError::Git(format!("failed to push HEAD: {e}")))?;
        }
    } else {
        revwalk
            .push_head()
            .map_err(|e| GuardianError::Git(format!("failed to push HEAD: {e}")))?;
    }

    let mut commits = Vec::new();

    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| GuardianError::Git(format!("revwalk error: {e}")))?;

        let commit = repo
            .find_commit(oid)
            .map_err(|e| GuardianError::Git(format!("failed to find commit: {e}")))?;

        if commit.parent_count() > 1 && !options.include_merges {
            continue;
        }

        let (additions, deletions) = line_stats(&repo, &commit)?;
        let author = commit.author();

        commits.push(CommitEvent {
            hash: oid.to_string(),
            author: author.name().unwrap_or("unknown").to_string(),
            email: author.email().unwrap_or("unknown").to_string(),
            timestamp: iso_timestamp(author.when()),
            message: commit.summary().unwrap_or("").to_string(),
            additions,
            deletions,
        });
    }

    tracing::debug!(count = commits.len(), "mined commit history");
    Ok(commits)
}

/// Aggregate commits into per-author records, ordered by author name.
///
/// Percentages are left at zero; [`crate::equity::analyze_equity`] fills
/// them once the totals are known.
///
/// # Examples
///
/// ```
/// use guardian_gitpulse::mining::{tally_contributors, CommitEvent};
///
/// let event = |author: &str, additions| CommitEvent {
///     hash: "0000000".into(),
///     author: author.into(),
///     email: String::new(),
///     timestamp: "2026-01-01T00:00:00Z".into(),
///     message: String::new(),
///     additions,
///     deletions: 0,
/// };
/// let records = tally_contributors(&[event("bob", 5), event("alice", 7), event("bob", 1)]);
/// assert_eq!(records[0].name, "alice");
/// assert_eq!(records[1].commits, 2);
/// assert_eq!(records[1].additions, 6);
/// ```
pub fn tally_contributors(commits: &[CommitEvent]) -> Vec<ContributorRecord> {
    let mut by_author: BTreeMap<&str, ContributorRecord> = BTreeMap::new();
    for commit in commits {
        let record = by_author
            .entry(commit.author.as_str())
            .or_insert_with(|| ContributorRecord::new(commit.author.clone(), 0, 0, 0));
        record.commits += 1;
        record.additions += commit.additions;
        record.deletions += commit.deletions;
    }
    by_author.into_values().collect()
}

fn iso_timestamp(time: git2::Time) -> String {
    let offset =
        FixedOffset::east_opt(time.offset_minutes() * 60).or_else(|| FixedOffset::east_opt(0));
    match (offset, DateTime::from_timestamp(time.seconds(), 0)) {
        (Some(offset), Some(utc)) => utc.with_timezone(&offset).to_rfc3339(),
        _ => String::new(),
    }
}

fn line_stats(repo: &Repository, commit: &Commit<'_>) -> Result<(u64, u64), GuardianError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| GuardianError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| GuardianError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| GuardianError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), None)
        .map_err(|e| GuardianError::Git(format!("failed to compute diff: {e}")))?;
    let stats = diff
        .stats()
        .map_err(|e| GuardianError::Git(format!("failed to compute diff stats: {e}")))?;

    Ok((stats.insertions() as u64, stats.deletions() as u64))
}
