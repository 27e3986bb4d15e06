//! Aggregation, rendering, and orchestration of an evaluation.
//!
//! - [`aggregate`]: folds every check into one [`EvaluationReport`]
//! - [`markdown`]: renders the report as a commit comment
//! - [`pipeline`]: gathers collaborator data and runs the whole evaluation

pub mod aggregate;
pub mod markdown;
pub mod pipeline;

pub use aggregate::{aggregate, EvaluationInputs, EvaluationReport, PlagiarismSummary};
pub use markdown::render_markdown;
pub use pipeline::{run_evaluation, Evaluation, EvaluationRequest};
