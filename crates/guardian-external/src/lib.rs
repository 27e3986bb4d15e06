//! Wrappers around the external collaborators of an evaluation.
//!
//! Each probe shells out to a tool or calls a remote API, enforces its own
//! timeout, and turns every failure into a neutral verdict so a missing tool
//! never fails a team.
//!
//! - [`lint`]: pylint quality score
//! - [`corpus`]: copydetect similarity against a reference corpus
//! - [`code_search`]: GitHub code search for distinctive function snippets

pub mod code_search;
pub mod corpus;
pub mod lint;
pub mod tool;

pub use code_search::{check_code_search, scan_snippets, CodeSearchClient, CodeSearchReport};
pub use corpus::{check_corpus, CorpusReport};
pub use lint::{check_quality, QualityReport};
pub use tool::ToolSettings;
