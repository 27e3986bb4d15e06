use std::path::{Path, PathBuf};

use guardian_core::GuardianError;

/// Maximum file size to process (1 MB).
const MAX_FILE_SIZE: u64 = 1_048_576;

/// Number of bytes to check for binary detection.
const BINARY_CHECK_SIZE: usize = 8192;

/// A Python source file discovered during tree walking.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use guardian_fingerprint::walker::SourceFile;
///
/// let file = SourceFile {
///     path: PathBuf::from("app/main.py"),
///     content: "print('hi')\n".to_string(),
/// };
/// assert_eq!(file.path.extension().unwrap(), "py");
/// ```
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the walked root.
    pub path: PathBuf,
    /// Full file content.
    pub content: String,
}

/// Walk a source tree, returning every `.py` file.
///
/// Hidden entries and `__pycache__` directories are skipped, as are
/// binary files and files larger than 1 MB. Results are sorted by path so
/// repeated walks yield identical metric bundles.
///
/// # Errors
///
/// Returns [`GuardianError::FileNotFound`] if `root` is not a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use guardian_fingerprint::walker::walk_python;
///
/// let files = walk_python(Path::new("src")).unwrap();
/// for f in &files {
///     println!("{}", f.path.display());
/// }
/// ```
pub fn walk_python(root: &Path) -> Result<Vec<SourceFile>, GuardianError> {
    if !root.is_dir() {
        return Err(GuardianError::FileNotFound(root.to_path_buf()));
    }

    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .filter_entry(|entry| entry.file_name() != "__pycache__")
        .build();
    let mut files = Vec::new();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::debug!(%err, "skipping unreadable entry");
                continue;
            }
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }

        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(_) => continue,
        };
        if metadata.len() > MAX_FILE_SIZE {
            continue;
        }

        // Undecodable bytes are replaced rather than dropping the file.
        let content = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => continue,
        };

        let check_len = content.len().min(BINARY_CHECK_SIZE);
        if content.as_bytes()[..check_len].contains(&0) {
            continue;
        }

        let relative = match path.strip_prefix(root) {
            Ok(r) => r.to_path_buf(),
            Err(_) => path.to_path_buf(),
        };

        files.push(SourceFile {
            path: relative,
            content,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}
