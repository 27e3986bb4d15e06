use std::path::PathBuf;

/// Errors that can occur across the Guardian workspace.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary reports it through `miette` at the boundary.
///
/// Analyzers never return these for missing or malformed data: they degrade
/// to a neutral verdict instead. Only configuration problems that leave no
/// meaningful reference point (an unknown time zone, an unordered milestone
/// list) reach the caller.
///
/// # Examples
///
/// ```
/// use guardian_core::GuardianError;
///
/// let err = GuardianError::Config("milestones out of order".into());
/// assert!(err.to_string().contains("milestones out of order"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum GuardianError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("check the milestone list and tunables in .pbl/config.json"))]
    Config(String),

    /// The configured time zone is not a known IANA identifier.
    #[error("unknown time zone: {0}")]
    #[diagnostic(help("use an IANA zone name such as \"Asia/Kolkata\" or \"UTC\""))]
    TimeZone(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Timestamp or tool-output parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// An external tool could not be run or returned unusable output.
    #[error("tool error: {0}")]
    Tool(String),

    /// Remote API failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GuardianError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = GuardianError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn time_zone_error_names_the_zone() {
        let err = GuardianError::TimeZone("Mars/Olympus".into());
        assert_eq!(err.to_string(), "unknown time zone: Mars/Olympus");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = GuardianError::FileNotFound(PathBuf::from("/tmp/.pbl/config.json"));
        assert!(err.to_string().contains("/tmp/.pbl/config.json"));
    }
}
