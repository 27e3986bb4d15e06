//! Milestone timing evaluation for PBL Guardian.
//!
//! Resolves a commit timestamp against the team's milestone schedule in the
//! team's IANA time zone:
//! - [`schedule`]: [`Schedule`] built from configuration, phase resolution
//! - [`verdict`]: per-commit [`TimingVerdict`]

pub mod schedule;
pub mod verdict;

pub use schedule::{PhaseSlot, PhaseWindow, Schedule};
pub use verdict::{evaluate, evaluate_timestamp, TimingVerdict};
