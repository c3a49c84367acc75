//! # Configuration Management
//!
//! Stack configuration (what to build) and logging configuration (how the
//! CLI reports). A [`StackConfig`] can be written in code, loaded from a
//! YAML/TOML/JSON file, or assembled from environment variables.

pub mod env;
pub mod file;
pub mod observability;
pub mod stack;

pub use observability::LoggingConfig;
pub use stack::{
    ApiConfig, ApiGatewayConfig, IdentityMode, JwtAuth, NetworkConfig, SecretBinding,
    ServiceLimits, ServiceSettings, StackConfig, Upstream,
};
