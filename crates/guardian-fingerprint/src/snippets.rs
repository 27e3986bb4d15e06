//! Distinctive function snippets for code search.

use std::path::PathBuf;

use guardian_core::GuardianError;
use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::metrics::python_parser;
use crate::walker::SourceFile;

/// Functions with fewer non-comment lines than this are too generic to search.
const MIN_BODY_LINES: usize = 4;

/// Lines after the signature joined into a snippet.
const SNIPPET_LINES: usize = 5;

/// Maximum snippet length in characters.
const MAX_SNIPPET_CHARS: usize = 200;

/// A short, searchable excerpt of one function.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use guardian_fingerprint::snippets::FunctionSnippet;
///
/// let snippet = FunctionSnippet {
///     name: "parse_grades".into(),
///     file: PathBuf::from("grades.py"),
///     snippet: "rows = read_csv(path) totals = {}".into(),
///     length: 6,
/// };
/// assert_eq!(snippet.length, 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSnippet {
    /// Function name.
    pub name: String,
    /// File containing the function, relative to the walked root.
    pub file: PathBuf,
    /// Stripped body lines joined by spaces.
    pub snippet: String,
    /// Non-blank, non-comment lines in the whole function.
    pub length: usize,
}

/// Extract the `max` longest functions as search snippets.
///
/// Files with syntax errors are skipped. Ties keep discovery order.
///
/// # Errors
///
/// Returns [`GuardianError::Parse`] if the Python grammar cannot be loaded.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use guardian_fingerprint::snippets::extract_snippets;
/// use guardian_fingerprint::walker::SourceFile;
///
/// let file = SourceFile {
///     path: PathBuf::from("a.py"),
///     content: "def f(x):\n    a = x\n    b = a * 2\n    return b\n".into(),
/// };
/// let snippets = extract_snippets(&[file], 5).unwrap();
/// assert_eq!(snippets[0].snippet, "a = x b = a * 2 return b");
/// ```
pub fn extract_snippets(
    files: &[SourceFile],
    max: usize,
) -> Result<Vec<FunctionSnippet>, GuardianError> {
    let mut parser = python_parser()?;
    let mut found = Vec::new();

    for file in files {
        let Some(tree) = parser.parse(&file.content, None) else {
            continue;
        };
        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(file = %file.path.display(), "skipping file with syntax errors");
            continue;
        }
        let lines: Vec<&str> = file.content.split('\n').collect();
        collect_functions(root, file, &lines, &mut found);
    }

    found.sort_by(|a, b| b.length.cmp(&a.length));
    found.truncate(max);
    Ok(found)
}

fn collect_functions(
    node: Node,
    file: &SourceFile,
    lines: &[&str],
    out: &mut Vec<FunctionSnippet>,
) {
    if node.kind() == "function_definition" {
        if let Some(snippet) = snippet_for(&node, file, lines) {
            out.push(snippet);
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_functions(child, file, lines, out);
    }
}

fn snippet_for(node: &Node, file: &SourceFile, lines: &[&str]) -> Option<FunctionSnippet> {
    let name_node = node.child_by_field_name("name")?;
    let name = file
        .content
        .get(name_node.start_byte()..name_node.end_byte())?
        .to_string();

    let start = node.start_position().row;
    let end = node.end_position().row.min(lines.len().saturating_sub(1));
    let body: Vec<&str> = lines
        .get(start..=end)?
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    if body.len() < MIN_BODY_LINES {
        return None;
    }

    let joined = body
        .iter()
        .skip(1)
        .take(SNIPPET_LINES)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    let snippet: String = joined.chars().take(MAX_SNIPPET_CHARS).collect();

    Some(FunctionSnippet {
        name,
        file: file.path.clone(),
        snippet,
        length: body.len(),
    })
}
