//! Git history analysis: contribution equity, commit behavior, and proofs.
//!
//! Mines git history using git2 into a commit timeline, then derives
//! judgments from it: how evenly work is spread across the team, whether
//! commits look like incremental work, and whether code changes came with
//! proof of progress.

pub mod behavior;
pub mod equity;
pub mod mining;
pub mod proofs;
