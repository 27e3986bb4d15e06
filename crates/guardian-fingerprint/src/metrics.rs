//! Code-shape metrics collected from Python sources with tree-sitter.

use guardian_core::GuardianError;
use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};

use crate::walker::SourceFile;

/// Aggregate code-shape counts across a source tree.
///
/// Line counts cover every file. Syntax-tree counts (functions, docstrings,
/// identifiers, blocks) only cover files that parse without errors.
///
/// # Examples
///
/// ```
/// use guardian_fingerprint::metrics::CodeMetricBundle;
///
/// let bundle = CodeMetricBundle {
///     comment_lines: 30,
///     code_lines: 70,
///     ..CodeMetricBundle::default()
/// };
/// assert_eq!(bundle.comment_ratio(), Some(0.3));
/// assert_eq!(bundle.docstring_ratio(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMetricBundle {
    /// Files scanned.
    pub files: usize,
    /// Files whose syntax tree had errors.
    pub unparsed_files: usize,
    /// Non-blank lines starting with `#`.
    pub comment_lines: u64,
    /// Other non-blank lines.
    pub code_lines: u64,
    /// Function definitions, including methods and nested functions.
    pub functions: u64,
    /// Functions whose body opens with a string literal.
    pub functions_with_docstring: u64,
    /// Lines across all docstrings.
    pub docstring_lines: u64,
    /// Length in characters of every name bound by assignment.
    pub identifier_lengths: Vec<usize>,
    /// `try` statements.
    pub try_blocks: u64,
    /// `try`, `if`, `elif`, `for`, and `while` blocks.
    pub control_blocks: u64,
}

impl CodeMetricBundle {
    /// `comment / (comment + code)`, or `None` without code lines.
    pub fn comment_ratio(&self) -> Option<f64> {
        if self.code_lines == 0 {
            return None;
        }
        Some(self.comment_lines as f64 / (self.comment_lines + self.code_lines) as f64)
    }

    /// Share of functions carrying a docstring, or `None` without functions.
    pub fn docstring_ratio(&self) -> Option<f64> {
        if self.functions == 0 {
            return None;
        }
        Some(self.functions_with_docstring as f64 / self.functions as f64)
    }

    /// Mean bound-name length, or `None` without names.
    pub fn avg_identifier_length(&self) -> Option<f64> {
        if self.identifier_lengths.is_empty() {
            return None;
        }
        let total: usize = self.identifier_lengths.iter().sum();
        Some(total as f64 / self.identifier_lengths.len() as f64)
    }

    /// Share of bound names longer than `min_len` characters.
    pub fn long_identifier_fraction(&self, min_len: usize) -> Option<f64> {
        if self.identifier_lengths.is_empty() {
            return None;
        }
        let long = self
            .identifier_lengths
            .iter()
            .filter(|&&len| len > min_len)
            .count();
        Some(long as f64 / self.identifier_lengths.len() as f64)
    }

    /// `try` blocks over all control blocks, or `None` without blocks.
    pub fn error_handling_ratio(&self) -> Option<f64> {
        if self.control_blocks == 0 {
            return None;
        }
        Some(self.try_blocks as f64 / self.control_blocks as f64)
    }

    /// Add the counts of one source file.
    ///
    /// # Errors
    ///
    /// Returns [`GuardianError::Parse`] if the Python grammar cannot be loaded.
    pub fn add_source(&mut self, parser: &mut Parser, content: &str) -> Result<(), GuardianError> {
        self.files += 1;

        for line in content.lines() {
            let stripped = line.trim();
            if stripped.is_empty() {
                continue;
            }
            if stripped.starts_with('#') {
                self.comment_lines += 1;
            } else {
                self.code_lines += 1;
            }
        }

        let Some(tree) = parser.parse(content, None) else {
            self.unparsed_files += 1;
            return Ok(());
        };
        let root = tree.root_node();
        if root.has_error() {
            self.unparsed_files += 1;
            return Ok(());
        }

        self.visit(root, content.as_bytes());
        Ok(())
    }

    fn visit(&mut self, node: Node, source: &[u8]) {
        match node.kind() {
            "function_definition" => {
                self.functions += 1;
                if let Some(lines) = docstring_lines(&node, source) {
                    self.functions_with_docstring += 1;
                    self.docstring_lines += lines;
                }
            }
            "try_statement" => {
                self.try_blocks += 1;
                self.control_blocks += 1;
            }
            "if_statement" | "elif_clause" | "for_statement" | "while_statement" => {
                self.control_blocks += 1;
            }
            _ => {}
        }

        let target = match node.kind() {
            "assignment" | "augmented_assignment" | "for_statement" | "for_in_clause" => {
                node.child_by_field_name("left")
            }
            "named_expression" => node.child_by_field_name("name"),
            "with_item" => node.child_by_field_name("value").and_then(|v| with_alias(&v)),
            _ => None,
        };
        if let Some(target) = target {
            collect_bound_names(target, source, &mut self.identifier_lengths);
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, source);
        }
    }
}

/// Build a metric bundle across all files.
///
/// # Errors
///
/// Returns [`GuardianError::Parse`] if the Python grammar cannot be loaded.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use guardian_fingerprint::metrics::collect_metrics;
/// use guardian_fingerprint::walker::SourceFile;
///
/// let file = SourceFile {
///     path: PathBuf::from("a.py"),
///     content: "# greet\ndef hello():\n    \"\"\"Say hi.\"\"\"\n    name = 'x'\n".into(),
/// };
/// let bundle = collect_metrics(&[file]).unwrap();
/// assert_eq!(bundle.comment_lines, 1);
/// assert_eq!(bundle.functions, 1);
/// assert_eq!(bundle.functions_with_docstring, 1);
/// assert_eq!(bundle.identifier_lengths, vec![4]);
/// ```
pub fn collect_metrics(files: &[SourceFile]) -> Result<CodeMetricBundle, GuardianError> {
    let mut parser = python_parser()?;
    let mut bundle = CodeMetricBundle::default();
    for file in files {
        bundle.add_source(&mut parser, &file.content)?;
    }
    if bundle.unparsed_files > 0 {
        tracing::debug!(
            unparsed = bundle.unparsed_files,
            "files with syntax errors contributed line counts only"
        );
    }
    Ok(bundle)
}

/// A tree-sitter parser loaded with the Python grammar.
///
/// # Errors
///
/// Returns [`GuardianError::Parse`] if the grammar cannot be loaded.
pub fn python_parser() -> Result<Parser, GuardianError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| GuardianError::Parse(format!("failed to set language: {e}")))?;
    Ok(parser)
}

/// Line count of the docstring opening a function body, if any.
fn docstring_lines(function: &Node, source: &[u8]) -> Option<u64> {
    let body = function.child_by_field_name("body")?;
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = first.named_child(0)?;
    if !matches!(literal.kind(), "string" | "concatenated_string") {
        return None;
    }
    let text = node_text(&literal, source);
    Some(text.split('\n').count() as u64)
}

/// Push the length of every plain name bound by an assignment target.
///
/// Attribute and subscript targets bind no new name and are skipped.
fn collect_bound_names(target: Node, source: &[u8], out: &mut Vec<usize>) {
    match target.kind() {
        "identifier" => out.push(node_text(&target, source).chars().count()),
        "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple" | "list"
        | "list_splat_pattern" | "parenthesized_expression" | "as_pattern_target" => {
            let mut cursor = target.walk();
            for child in target.named_children(&mut cursor) {
                collect_bound_names(child, source, out);
            }
        }
        _ => {}
    }
}

/// The `as` target of a `with` item, if it has one.
fn with_alias<'t>(value: &Node<'t>) -> Option<Node<'t>> {
    if value.kind() != "as_pattern" {
        return None;
    }
    value.child_by_field_name("alias").or_else(|| {
        let mut cursor = value.walk();
        let found = value
            .named_children(&mut cursor)
            .find(|c| c.kind() == "as_pattern_target");
        found
    })
}

fn node_text(node: &Node, source: &[u8]) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    if start >= source.len() || end > source.len() {
        return String::new();
    }
    String::from_utf8_lossy(&source[start..end]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bundle_of(content: &str) -> CodeMetricBundle {
        collect_metrics(&[SourceFile {
            path: PathBuf::from("t.py"),
            content: content.to_string(),
        }])
        .unwrap()
    }

    #[test]
    fn counts_comment_and_code_lines() {
        let bundle = bundle_of("# one\n\n    # two\nx = 1\n\ny = 2  # trailing\n");
        assert_eq!(bundle.comment_lines, 2);
        assert_eq!(bundle.code_lines, 2);
        assert_eq!(bundle.comment_ratio(), Some(0.5));
    }

    #[test]
    fn counts_functions_and_docstrings() {
        let source = r#"
def documented(a):
    """First line.

    Second line.
    """
    return a

async def fetch():
    '''One line.'''
    return 1

def bare():
    return None

class Service:
    def method(self):
        """Method doc."""
        def inner():
            pass
        return inner
"#;
        let bundle = bundle_of(source);
        assert_eq!(bundle.functions, 5);
        assert_eq!(bundle.functions_with_docstring, 3);
        assert_eq!(bundle.docstring_lines, 4 + 1 + 1);
        assert_eq!(bundle.docstring_ratio(), Some(0.6));
    }

    #[test]
    fn counts_control_and_try_blocks() {
        let source = r#"
for i in range(3):
    if i == 0:
        pass
    elif i == 1:
        pass
    else:
        pass
while False:
    pass
try:
    x = 1
except ValueError:
    pass
"#;
        let bundle = bundle_of(source);
        assert_eq!(bundle.try_blocks, 1);
        assert_eq!(bundle.control_blocks, 5);
        assert_eq!(bundle.error_handling_ratio(), Some(0.2));
    }

    #[test]
    fn collects_bound_names_only() {
        let source = r#"
total_count = 0
a, (b, c) = 1, (2, 3)
obj.attr = 5
items[0] = 6
total_count += 1
for idx in range(2):
    pass
squares = [n * n for n in range(4)]
if (found := 3):
    pass
with open("log.txt") as handle, lock:
    pass
with open("a") as (src, dst):
    pass
"#;
        let bundle = bundle_of(source);
        // total_count, a, b, c, total_count, idx, squares, n, found, handle, src, dst
        assert_eq!(
            bundle.identifier_lengths,
            vec![11, 1, 1, 1, 11, 3, 7, 1, 5, 6, 3, 3]
        );
        assert_eq!(bundle.long_identifier_fraction(10), Some(2.0 / 12.0));
    }

    #[test]
    fn syntax_errors_keep_line_counts_only() {
        let bundle = bundle_of("# note\ndef broken(:\n    return 1\n");
        assert_eq!(bundle.unparsed_files, 1);
        assert_eq!(bundle.comment_lines, 1);
        assert_eq!(bundle.code_lines, 2);
        assert_eq!(bundle.functions, 0);
    }

    #[test]
    fn empty_bundle_has_no_ratios() {
        let bundle = CodeMetricBundle::default();
        assert!(bundle.comment_ratio().is_none());
        assert!(bundle.docstring_ratio().is_none());
        assert!(bundle.avg_identifier_length().is_none());
        assert!(bundle.error_handling_ratio().is_none());
    }
}
