//! # Stack Builders
//!
//! One-shot builders that turn a validated [`StackConfig`] into resource
//! descriptors. They run synchronously in dependency order:
//!
//! ```text
//! ServiceBuilder (backend, frontend) ──┐
//!        └─ SecretBinder               ├─> NetworkBuilder ─> FullStackResult
//!                                      ┘
//! ```
//!
//! Builders never perform I/O. Values that only exist after the engine has
//! applied the graph (service URLs, IP addresses) are carried as [`Output`]s.
//!
//! [`StackConfig`]: crate::config::StackConfig
//! [`Output`]: crate::graph::Output

pub mod fullstack;
pub mod network;
pub mod secrets;
pub mod service;

pub use fullstack::{build_fullstack, FullStackBuilder, FullStackResult};
pub use network::{GatewayInstance, GatewayRef, LoadBalancerRef, NetworkBuilder, NetworkRefs};
pub use secrets::{BoundSecrets, SecretBinder};
pub use service::{ServiceBuilder, ServiceIdentity, ServiceRef, ServiceRole};

use std::collections::BTreeMap;

use crate::config::StackConfig;
use crate::naming;

/// Values shared by every builder of one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackContext {
    pub name: String,
    pub project: String,
    pub region: String,
    pub labels: BTreeMap<String, String>,
}

impl StackContext {
    pub fn new(name: impl Into<String>, config: &StackConfig) -> Self {
        Self {
            name: name.into(),
            project: config.project.clone(),
            region: config.region.clone(),
            labels: config.labels.clone(),
        }
    }

    /// `{stack}-{suffix}`, truncated to the GCP name limit
    pub fn resource_name(&self, suffix: &str) -> String {
        naming::resource_name(&self.name, suffix)
    }
}
