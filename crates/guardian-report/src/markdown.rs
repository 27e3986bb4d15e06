//! Markdown rendering of an [`EvaluationReport`], posted as a commit comment.

use guardian_core::{GuardianConfig, Signal};

use crate::aggregate::EvaluationReport;

/// Detail lines shown per plagiarism layer.
const MAX_LAYER_DETAILS: usize = 3;

/// Quality issues shown.
const MAX_ISSUES: usize = 5;

/// Render the evaluation as a markdown comment.
///
/// The summary table comes first, then a metadata line, then collapsible
/// sections for whatever details exist, then a footer naming the team.
///
/// # Examples
///
/// ```
/// use guardian_core::GuardianConfig;
/// use guardian_report::aggregate::{aggregate, EvaluationInputs};
/// use guardian_report::markdown::render_markdown;
/// use guardian_timing::Schedule;
///
/// let config = GuardianConfig::default();
/// let schedule = Schedule::from_config(&config).unwrap();
/// let report = aggregate(&config, &schedule, EvaluationInputs::default());
/// let md = render_markdown(&report, &config, "alice");
/// assert!(md.starts_with("## 🤖 PBL Guardian - Evaluation Report"));
/// assert!(md.contains("**Commit by:** alice"));
/// ```
pub fn render_markdown(report: &EvaluationReport, config: &GuardianConfig, author: &str) -> String {
    let plagiarism = &report.plagiarism;
    let mut lines: Vec<String> = vec![
        "## 🤖 PBL Guardian - Evaluation Report".into(),
        String::new(),
        "| Metric | Result | Status |".into(),
        "|---|---|---|".into(),
    ];

    let rows: [(&str, &dyn Signal); 8] = [
        ("⏰ Timing", &report.timing),
        ("📊 Code Quality", &report.quality),
        ("📸 Proofs", &report.proofs),
        ("👥 Contribution", &report.equity),
        ("🔍 Plagiarism (L1 Corpus)", &plagiarism.corpus),
        ("🔍 Plagiarism (L3 GitHub)", &plagiarism.code_search),
        ("🤖 AI Detection (L4)", &plagiarism.fingerprint),
        ("📈 Commit Patterns (L5)", &plagiarism.commit_patterns),
    ];
    for (metric, signal) in rows {
        lines.push(format!(
            "| {metric} | {} | {} |",
            escape_cell(signal.detail()),
            signal.status().emoji()
        ));
    }

    let class_day = if report.timing.is_class_day {
        format!("✅ {}", report.timing.commit_day)
    } else {
        "-".to_string()
    };
    lines.push(String::new());
    lines.push(format!(
        "**Commit by:** {author} | **Phase:** {} | **Class Day:** {class_day}",
        report.timing.current_phase.as_deref().unwrap_or("N/A")
    ));

    let sections = [
        ("🔍 Plagiarism Details", plagiarism_details(report)),
        ("📊 Quality Details", quality_details(report)),
        ("👥 Contribution Details", contribution_details(report)),
    ];
    if sections.iter().any(|(_, body)| !body.is_empty()) {
        lines.push(String::new());
    }
    for (summary, body) in sections {
        if body.is_empty() {
            continue;
        }
        lines.push(format!("<details><summary>{summary}</summary>"));
        lines.push(String::new());
        lines.extend(body);
        lines.push(String::new());
        lines.push("</details>".into());
    }

    lines.push(String::new());
    lines.push("---".into());
    lines.push(format!(
        "*PBL Guardian v{} | Team: {} ({})*",
        env!("CARGO_PKG_VERSION"),
        config.team_name,
        config.team_id
    ));

    lines.join("\n")
}

fn plagiarism_details(report: &EvaluationReport) -> Vec<String> {
    let p = &report.plagiarism;
    let mut out = Vec::new();

    if !p.corpus.flagged_files.is_empty() {
        out.push(format!("**L1 Corpus:** {}", p.corpus.detail));
        for m in p.corpus.flagged_files.iter().take(MAX_LAYER_DETAILS) {
            out.push(format!("  - {}", m.detail));
        }
    }

    if !p.code_search.flagged.is_empty() {
        out.push(format!("**L3 GitHub Search:** {}", p.code_search.detail));
        for m in p.code_search.flagged.iter().take(MAX_LAYER_DETAILS) {
            out.push(format!(
                "  - `{}` in {} → matches {}",
                m.function,
                m.file.display(),
                m.top_match_repo
            ));
        }
    }

    if !p.fingerprint.flags.is_empty() {
        out.push(format!("**L4 AI Detection:** {}", p.fingerprint.detail));
        for flag in p.fingerprint.flags.iter().take(MAX_LAYER_DETAILS) {
            out.push(format!("  - {flag}"));
        }
    }

    if !p.commit_patterns.flags.is_empty() {
        out.push(format!("**L5 Commit Patterns:** {}", p.commit_patterns.detail));
        for flag in p.commit_patterns.flags.iter().take(MAX_LAYER_DETAILS) {
            out.push(format!("  - {}", flag.message));
        }
    }

    out
}

fn quality_details(report: &EvaluationReport) -> Vec<String> {
    let issues = &report.quality.issues;
    if issues.is_empty() {
        return Vec::new();
    }
    let mut out = vec!["**Top Issues:**".to_string()];
    for issue in issues.iter().take(MAX_ISSUES) {
        out.push(format!(
            "  - `{}:{}` [{}] {}",
            issue.file, issue.line, issue.symbol, issue.message
        ));
    }
    out
}

fn contribution_details(report: &EvaluationReport) -> Vec<String> {
    let equity = &report.equity;
    let mut out = Vec::new();

    if !equity.contributors.is_empty() {
        out.push("| Member | Commits | Additions | % |".into());
        out.push("|---|---|---|---|".into());
        let mut members: Vec<_> = equity.contributors.iter().collect();
        members.sort_by(|a, b| b.commits.cmp(&a.commits));
        for m in members {
            out.push(format!(
                "| {} | {} | +{}/-{} | {}% |",
                escape_cell(&m.name),
                m.commits,
                m.additions,
                m.deletions,
                m.commit_pct
            ));
        }
    }

    for warning in &equity.warnings {
        out.push(String::new());
        out.push(warning.to_string());
    }

    out
}

/// Keep cell text from breaking the table row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
