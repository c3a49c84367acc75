//! # GCP Fullstack
//!
//! Declarative builder for a two-tier web application on Google Cloud: a
//! backend API service and a frontend web service on Cloud Run, an optional
//! multi-region API Gateway, a global HTTPS load balancer with a managed
//! certificate, optional Cloud Armor, and Secret Manager bindings.
//!
//! ## Architecture
//!
//! The crate produces resource descriptors; an orchestration engine applies
//! them. Nothing here talks to GCP.
//!
//! ```text
//! StackConfig → FullStackBuilder → ResourceGraph → orchestration engine
//!                  ↓        ↓
//!       ServiceBuilder   NetworkBuilder
//!         (+ secrets)    (gateway, LB, armor)
//! ```
//!
//! ## Core Components
//!
//! - **Configuration**: `serde` + `validator` typed config, loaded from code,
//!   files or the environment
//! - **Resource graph**: ordered descriptors with explicit dependencies and
//!   deferred [`graph::Output`] values
//! - **Naming**: deterministic, length-bounded GCP resource names
//! - **Builders**: services, secrets, gateway, load balancer, security policy
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gcp_fullstack::{FullStackBuilder, Result, StackConfig};
//!
//! fn main() -> Result<()> {
//!     let config = StackConfig::from_env()?;
//!     let stack = FullStackBuilder::new("shop", &config).build()?;
//!     for resource in stack.resources() {
//!         println!("{} {}", resource.type_token, resource.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod builders;
pub mod cli;
pub mod config;
pub mod errors;
pub mod graph;
pub mod naming;
pub mod observability;
pub mod validation;

// Re-export commonly used types
pub use builders::{build_fullstack, FullStackBuilder, FullStackResult};
pub use config::StackConfig;
pub use errors::{Error, FullStackError, Result};
pub use graph::{Output, Resource, ResourceGraph};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
