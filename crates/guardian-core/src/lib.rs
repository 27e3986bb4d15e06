//! Core types, configuration, and error handling for PBL Guardian.
//!
//! This crate provides the shared foundation used by all other Guardian crates:
//! - [`GuardianError`]: unified error type using `thiserror`
//! - [`GuardianConfig`]: team configuration loaded from `.pbl/config.json`
//! - Shared types: [`Severity`], [`Status`], [`OutputFormat`], and the
//!   [`Signal`] trait every verdict implements

mod config;
mod error;
mod types;

pub use config::{
    EquityConfig, GuardianConfig, Milestone, MiningConfig, PatternConfig, DEFAULT_CONFIG_PATH,
};
pub use error::GuardianError;
pub use types::{round_to, OutputFormat, Severity, Signal, Status};

/// A convenience `Result` type for Guardian operations.
pub type Result<T> = std::result::Result<T, GuardianError>;
