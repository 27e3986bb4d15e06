//! AI-fingerprint scoring of Python source trees via tree-sitter.
//!
//! Walks a source tree with the `ignore` crate, collects code-shape metrics
//! from tree-sitter syntax trees, and combines independent heuristic rules
//! into a single "looks AI-authored" score. Also extracts distinctive
//! function snippets for internet code search.

pub mod heuristics;
pub mod metrics;
pub mod score;
pub mod snippets;
pub mod walker;

pub use metrics::{collect_metrics, CodeMetricBundle};
pub use score::{analyze_tree, score, FingerprintLabel, FingerprintReport};
