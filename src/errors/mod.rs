//! # Error Handling
//!
//! Build-time errors for the fullstack component. Configuration problems are
//! reported synchronously and never retried; there is no operational error
//! category because provisioning belongs to the orchestration engine.

pub mod types;

pub use types::{FullStackError, Result};

/// Short alias used across the builders
pub type Error = FullStackError;
