use std::process::Stdio;
use std::time::Duration;

use guardian_core::GuardianError;
use tokio::process::Command;

/// How external Python tools are launched.
///
/// # Examples
///
/// ```
/// use guardian_external::ToolSettings;
///
/// let settings = ToolSettings::default();
/// assert_eq!(settings.python, "python3");
/// assert_eq!(settings.lint_timeout_secs, 120);
/// ```
#[derive(Debug, Clone)]
pub struct ToolSettings {
    /// Interpreter used to run `-m pylint` and `-m copydetect`.
    pub python: String,
    pub lint_timeout_secs: u64,
    pub corpus_timeout_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            python: "python3".into(),
            lint_timeout_secs: 120,
            corpus_timeout_secs: 180,
        }
    }
}

/// Captured output of a finished tool run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Run `program args...` to completion, killing it after `timeout`.
///
/// A non-zero exit code is not an error: linters report findings that way.
///
/// # Errors
///
/// Returns [`GuardianError::Tool`] if the program cannot be started or does
/// not finish in time.
pub async fn run_tool(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<ToolOutput, GuardianError> {
    tracing::debug!(program, ?args, "running external tool");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| GuardianError::Tool(format!("failed to start {program}: {e}")))?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            GuardianError::Tool(format!(
                "{program} timed out after {}s",
                timeout.as_secs()
            ))
        })?
        .map_err(|e| GuardianError::Tool(format!("failed to wait for {program}: {e}")))?;

    Ok(ToolOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_a_tool_error() {
        let err = run_tool("guardian-no-such-tool", &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, GuardianError::Tool(_)));
        assert!(err.to_string().contains("guardian-no-such-tool"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_output_and_exit_code() {
        let args = vec!["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let output = run_tool("sh", &args, Duration::from_secs(10)).await.unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(output.combined().contains("out\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_program_times_out() {
        let args = vec!["5".to_string()];
        let err = run_tool("sleep", &args, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
