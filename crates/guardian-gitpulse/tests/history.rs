use std::fs;
use std::path::Path;

use git2::{Repository, Signature, Time};
use guardian_core::{EquityConfig, PatternConfig};
use guardian_gitpulse::behavior::analyze_commits;
use guardian_gitpulse::equity::{analyze_equity, EquityLabel};
use guardian_gitpulse::mining::{mine_history, tally_contributors, MiningOptions};
use guardian_gitpulse::proofs::{changed_files, count_proofs, evaluate_proofs};

/// Write `files`, stage everything, and commit as `author` at `seconds` (+05:30).
fn commit_files(repo: &Repository, author: &str, seconds: i64, files: &[(&str, &str)]) {
    let root = repo.workdir().unwrap().to_path_buf();
    for (path, content) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = Signature::new(
        author,
        &format!("{author}@example.com"),
        &Time::new(seconds, 330),
    )
    .unwrap();
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "work", &tree, &parent_refs)
        .unwrap();
}

fn lines(n: usize) -> String {
    (0..n).map(|i| format!("x_{i} = {i}\n")).collect()
}

fn build_repo(dir: &Path) -> Repository {
    let repo = Repository::init(dir).unwrap();
    // 2026-03-01T00:00:00+05:30
    let base = 1_772_303_400;
    commit_files(&repo, "alice", base, &[("app.py", &lines(10))]);
    commit_files(&repo, "bob", base + 86_400, &[("util.py", &lines(5))]);
    commit_files(
        &repo,
        "alice",
        base + 2 * 86_400,
        &[("app.py", &lines(20)), ("proofs/day3.png", "png")],
    );
    repo
}

#[test]
fn mines_commits_oldest_first_with_line_counts() {
    let dir = tempfile::tempdir().unwrap();
    build_repo(dir.path());

    let commits = mine_history(dir.path(), &MiningOptions::default()).unwrap();
    assert_eq!(commits.len(), 3);
    assert_eq!(commits[0].author, "alice");
    assert_eq!(commits[0].additions, 10);
    assert_eq!(commits[0].timestamp, "2026-03-01T00:00:00+05:30");
    assert_eq!(commits[1].author, "bob");
    assert_eq!(commits[2].additions, 11);
    assert_eq!(commits[2].hash.len(), 40);
}

#[test]
fn head_only_walk_matches_single_branch() {
    let dir = tempfile::tempdir().unwrap();
    build_repo(dir.path());
    let opts = MiningOptions {
        all_refs: false,
        ..MiningOptions::default()
    };
    assert_eq!(mine_history(dir.path(), &opts).unwrap().len(), 3);
}

#[test]
fn mined_history_feeds_equity_and_behavior() {
    let dir = tempfile::tempdir().unwrap();
    build_repo(dir.path());
    let commits = mine_history(dir.path(), &MiningOptions::default()).unwrap();

    let records = tally_contributors(&commits);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "alice");
    assert_eq!(records[0].commits, 2);

    let equity = analyze_equity(records, 10.0, &EquityConfig::default());
    assert!(equity.passed);
    assert_eq!(equity.total_commits, 3);
    // alice holds 66.7%, under the dominance line.
    assert_eq!(equity.label, EquityLabel::Balanced);

    let behavior = analyze_commits(&commits, &PatternConfig::default());
    assert!(behavior.passed);
    assert_eq!(behavior.total_commits, 3);
}

#[test]
fn head_commit_with_screenshot_has_proof() {
    let dir = tempfile::tempdir().unwrap();
    build_repo(dir.path());

    let mut changed = changed_files(dir.path(), "HEAD").unwrap();
    changed.sort();
    assert_eq!(changed, vec!["app.py", "proofs/day3.png"]);

    let total = count_proofs(dir.path(), "proofs/");
    let report = evaluate_proofs(&changed, "proofs/", total);
    assert!(report.passed);
    assert_eq!(report.total_proofs_in_repo, 1);
    assert_eq!(report.detail, "1 screenshot");

    let previous = changed_files(dir.path(), "HEAD~1").unwrap();
    assert!(!evaluate_proofs(&previous, "proofs/", total).passed);
}
