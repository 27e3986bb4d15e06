use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use guardian_core::{GuardianConfig, OutputFormat, Signal, DEFAULT_CONFIG_PATH};
use guardian_gitpulse::behavior::{analyze_commits, BehaviorReport};
use guardian_gitpulse::equity::{analyze_equity, EquityReport};
use guardian_gitpulse::mining::{mine_history, tally_contributors, CommitEvent, MiningOptions};
use guardian_report::{run_evaluation, EvaluationReport, EvaluationRequest};
use guardian_timing::{evaluate_timestamp, Schedule};

#[derive(Parser)]
#[command(
    name = "guardian",
    version,
    about = "Process-integrity evaluation for student project teams",
    long_about = "PBL Guardian evaluates a team's repository on every push: milestone timing,\n\
                   code quality, proof of progress, contribution equity, and five layers of\n\
                   plagiarism defense.\n\n\
                   Examples:\n  \
                     guardian init                          Create .pbl/config.json\n  \
                     guardian evaluate --timestamp 2026-02-28T10:30:00+05:30\n  \
                     guardian timing 2026-03-01T01:30:00+05:30\n  \
                     guardian equity --repo .               Gini coefficient over commits\n  \
                     guardian fingerprint --path src        AI-fingerprint score"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .pbl/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run every check and write the evaluation report
    #[command(long_about = "Run every check and write the evaluation report.\n\n\
        Mines git history, scans Python sources, checks proofs for the evaluated commit,\n\
        and runs pylint, copydetect, and GitHub code search concurrently. The markdown\n\
        report is written to --report-file. Exits with code 1 if any check fails.\n\n\
        Examples:\n  guardian evaluate\n  guardian evaluate --sha abc1234 --output results.json")]
    Evaluate {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        /// Student source directory, relative to the repository
        #[arg(long, default_value = "src")]
        source_dir: PathBuf,
        /// Reference corpus directory, relative to the repository
        #[arg(long, default_value = "references")]
        reference_dir: PathBuf,
        /// Commit whose changes are checked for proofs
        #[arg(long, env = "GITHUB_SHA", default_value = "HEAD")]
        sha: String,
        /// Commit timestamp (ISO 8601 with offset)
        #[arg(long, env = "COMMIT_TIMESTAMP")]
        timestamp: Option<String>,
        /// Commit author shown in the report
        #[arg(long, env = "COMMIT_AUTHOR", default_value = "unknown")]
        author: String,
        /// GitHub token for code search
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,
        /// Python interpreter used for pylint and copydetect
        #[arg(long, default_value = "python3")]
        python: String,
        /// Write the full JSON results to this file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Where to write the markdown report
        #[arg(long, env = "REPORT_FILE", default_value = "evaluation_report.md")]
        report_file: PathBuf,
    },
    /// Resolve a commit timestamp against the milestone schedule
    #[command(long_about = "Resolve a commit timestamp against the milestone schedule.\n\n\
        Converts the timestamp to the team's time zone, finds its phase, and reports\n\
        whether it is late, inside the grace period, or on a class day.\n\n\
        Examples:\n  guardian timing 2026-02-28T10:30:00+05:30")]
    Timing {
        /// Commit timestamp (ISO 8601 with offset)
        #[arg(env = "COMMIT_TIMESTAMP")]
        timestamp: String,
    },
    /// Measure contribution equity across the team
    Equity {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Detect code dumps, last-minute rushes, and infrequent commits
    Patterns {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Score how AI-authored the Python sources look
    Fingerprint {
        /// Source directory (default: src)
        #[arg(long, default_value = "src")]
        path: PathBuf,
    },
    /// Create a default .pbl/config.json
    #[command(long_about = "Create a default .pbl/config.json.\n\n\
        Fails if the file already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("guardian v{version} - process-integrity checks for student teams\n");

    println!("Quick start:");
    println!("  guardian init                 Create a .pbl/config.json file");
    println!("  guardian evaluate             Run every check on the current repository\n");

    println!("All commands:");
    println!("  evaluate     Full evaluation with markdown report");
    println!("  timing       Milestone phase and lateness of a timestamp");
    println!("  equity       Contribution Gini coefficient and warnings");
    println!("  patterns     Code dumps, rushes, and low commit frequency");
    println!("  fingerprint  AI-fingerprint score of the sources");
    println!("  init         Create default configuration\n");

    println!("Run 'guardian <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GuardianConfig> {
    let config = match path {
        Some(path) => GuardianConfig::from_file(path)
            .wrap_err_with(|| format!("loading {}", path.display()))?,
        None => GuardianConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
    };
    Ok(config)
}

/// Print one verdict in the requested format.
fn emit<T: Serialize + Signal>(
    format: OutputFormat,
    name: &str,
    verdict: &T,
    body: Vec<String>,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(verdict).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("| Metric | Result | Status |");
            println!("|---|---|---|");
            println!(
                "| {name} | {} | {} |",
                verdict.detail(),
                verdict.status().emoji()
            );
            if !body.is_empty() {
                println!();
                for line in body {
                    println!("{line}");
                }
            }
        }
        OutputFormat::Text => {
            println!("{} {name}: {}", verdict.status().emoji(), verdict.detail());
            for line in body {
                println!("  {line}");
            }
        }
    }
    Ok(())
}

fn mine_or_warn(repo: &Path, config: &GuardianConfig) -> Option<Vec<CommitEvent>> {
    match mine_history(repo, &MiningOptions::from(&config.mining)) {
        Ok(commits) => Some(commits),
        Err(e) => {
            tracing::warn!(error = %e, "history unavailable");
            None
        }
    }
}

fn equity_lines(report: &EquityReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .contributors
        .iter()
        .map(|c| {
            format!(
                "{}: {} commits ({}%), +{}/-{}",
                c.name, c.commits, c.commit_pct, c.additions, c.deletions
            )
        })
        .collect();
    lines.extend(report.warnings.iter().map(|w| format!("warning: {w}")));
    lines
}

fn pattern_lines(report: &BehaviorReport) -> Vec<String> {
    report
        .flags
        .iter()
        .map(|f| format!("[{}] {}", f.severity, f.message))
        .collect()
}

fn print_evaluation(report: &EvaluationReport) {
    for (name, signal) in report.checks() {
        println!("{} {name}: {}", signal.status().emoji(), signal.detail());
    }
    let layers: [(&str, &dyn Signal); 5] = [
        ("L1 corpus", &report.plagiarism.corpus),
        ("L2 peer", &report.plagiarism.peer),
        ("L3 code search", &report.plagiarism.code_search),
        ("L4 AI fingerprint", &report.plagiarism.fingerprint),
        ("L5 commit patterns", &report.plagiarism.commit_patterns),
    ];
    for (name, signal) in layers {
        println!("    {} {name}: {}", signal.status().emoji(), signal.detail());
    }
    println!();
    if report.passed {
        println!("All checks passed");
    } else {
        println!("Failed checks: {}", report.failed_checks().join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        print_welcome();
        return Ok(());
    };

    match command {
        Command::Init => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                miette::bail!("{DEFAULT_CONFIG_PATH} already exists");
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).into_diagnostic()?;
            }
            let content =
                serde_json::to_string_pretty(&GuardianConfig::default()).into_diagnostic()?;
            std::fs::write(path, content + "\n").into_diagnostic()?;
            println!("Created {DEFAULT_CONFIG_PATH} with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "guardian", &mut std::io::stdout());
        }
        Command::Timing { timestamp } => {
            let config = load_config(cli.config.as_deref())?;
            let schedule = Schedule::from_config(&config)?;
            let verdict = evaluate_timestamp(&schedule, &timestamp)?;
            let mut body = vec![
                format!(
                    "phase: {}",
                    verdict.current_phase.as_deref().unwrap_or("none")
                ),
                format!("day: {}", verdict.commit_day),
                format!("class day: {}", verdict.is_class_day),
                format!("late: {}", verdict.is_late),
            ];
            if verdict.is_within_grace {
                body.push("inside grace period".into());
            }
            emit(cli.format, "Timing", &verdict, body)?;
        }
        Command::Equity { repo } => {
            let config = load_config(cli.config.as_deref())?;
            let report = match mine_or_warn(&repo, &config) {
                Some(commits) => analyze_equity(
                    tally_contributors(&commits),
                    config.min_contribution_pct,
                    &config.equity,
                ),
                None => EquityReport::no_history("No git history available"),
            };
            let body = equity_lines(&report);
            emit(cli.format, "Contribution", &report, body)?;
        }
        Command::Patterns { repo } => {
            let config = load_config(cli.config.as_deref())?;
            let report = match mine_or_warn(&repo, &config) {
                Some(commits) => analyze_commits(&commits, &config.patterns),
                None => BehaviorReport::unavailable("No git history available"),
            };
            let body = pattern_lines(&report);
            emit(cli.format, "Commit Patterns", &report, body)?;
        }
        Command::Fingerprint { path } => {
            let report = guardian_fingerprint::analyze_tree(&path)?;
            let body = report
                .rules
                .iter()
                .map(|r| {
                    if r.applicable {
                        format!("{}: {}", r.rule, r.score)
                    } else {
                        format!("{}: not enough data", r.rule)
                    }
                })
                .collect();
            emit(cli.format, "AI Detection", &report, body)?;
        }
        Command::Evaluate {
            repo,
            source_dir,
            reference_dir,
            sha,
            timestamp,
            author,
            github_token,
            python,
            output,
            report_file,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let mut request = EvaluationRequest::new(repo);
            request.source_dir = source_dir;
            request.reference_dir = reference_dir;
            request.commit_sha = sha;
            request.commit_timestamp = timestamp;
            request.commit_author = author;
            request.github_token = github_token;
            request.tools.python = python;

            let spinner = if std::io::stderr().is_terminal() {
                let pb = indicatif::ProgressBar::new_spinner();
                if let Ok(style) =
                    indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                {
                    pb.set_style(style);
                }
                pb.set_message("Evaluating...");
                pb.enable_steady_tick(std::time::Duration::from_millis(120));
                Some(pb)
            } else {
                None
            };

            let evaluation = run_evaluation(&config, &request).await.inspect_err(|_| {
                if let Some(pb) = &spinner {
                    pb.finish_with_message("Failed");
                }
            })?;
            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }

            std::fs::write(&report_file, &evaluation.markdown)
                .into_diagnostic()
                .wrap_err_with(|| format!("writing {}", report_file.display()))?;
            if let Some(path) = &output {
                let json = serde_json::to_string_pretty(&evaluation.report).into_diagnostic()?;
                std::fs::write(path, json)
                    .into_diagnostic()
                    .wrap_err_with(|| format!("writing {}", path.display()))?;
            }

            match cli.format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&evaluation.report).into_diagnostic()?
                ),
                OutputFormat::Markdown => println!("{}", evaluation.markdown),
                OutputFormat::Text => print_evaluation(&evaluation.report),
            }

            if !evaluation.report.passed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
