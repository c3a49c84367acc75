//! # Network Builder
//!
//! Everything between the internet and the two Cloud Run services: the
//! optional API Gateway tier, the optional Cloud Armor policy and the global
//! HTTPS load balancer.

pub mod cors;
pub mod gateway;
pub mod jwt;
pub mod load_balancer;
pub mod security;

pub use gateway::{GatewayInstance, GatewayRef, DEFAULT_BACKEND_PATHS};
pub use load_balancer::{BackendTarget, LoadBalancerRef};
pub use security::SecurityPolicyRef;

use super::service::ServiceRef;
use super::StackContext;
use crate::component_span;
use crate::config::NetworkConfig;
use crate::errors::Result;
use crate::graph::ResourceGraph;
use crate::validation::domain_host;

use gateway::{build_gateway, validate_path};
use load_balancer::{build_load_balancer, cloud_run_neg, LoadBalancerInputs};
use security::build_security_policy;

/// Network resources produced for one stack
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRefs {
    pub api_gateway: Option<GatewayRef>,
    pub load_balancer: LoadBalancerRef,
    pub security_policy: Option<SecurityPolicyRef>,
    pub warnings: Vec<String>,
}

pub struct NetworkBuilder<'a> {
    stack: &'a StackContext,
    network: &'a NetworkConfig,
}

impl<'a> NetworkBuilder<'a> {
    pub fn new(stack: &'a StackContext, network: &'a NetworkConfig) -> Self {
        Self { stack, network }
    }

    /// Build the network tier. Both services must already be in `graph`.
    pub fn build(
        &self,
        backend: &ServiceRef,
        frontend: &ServiceRef,
        graph: &mut ResourceGraph,
    ) -> Result<NetworkRefs> {
        let _span = component_span!("network", &self.stack.name).entered();
        let host = domain_host(&self.network.domain_url)?;

        let mut warnings = Vec::new();
        if self.network.enable_private_traffic_only {
            let warning = format!(
                "private traffic only: Cloud Run accepts traffic from the load balancer alone, \
                 while {} stays publicly reachable through it",
                host
            );
            tracing::warn!(stack = %self.stack.name, domain = %host, "{}", warning);
            warnings.push(warning);
        }

        let security_policy = build_security_policy(self.stack, self.network, graph)?;

        let (api_gateway, api_targets, api_paths) = match self.network.enabled_gateway() {
            Some(gateway_config) => {
                let gateway = build_gateway(self.stack, gateway_config, backend, frontend, graph)?;
                let targets: Vec<BackendTarget> = gateway
                    .gateways
                    .iter()
                    .map(|instance| BackendTarget {
                        name: instance.neg.clone(),
                        id: instance.neg_id.clone(),
                    })
                    .collect();
                let paths = gateway.routed_paths.clone();
                (Some(gateway), targets, paths)
            }
            None => {
                let paths = self.direct_backend_paths()?;
                let target = cloud_run_neg(self.stack, backend, graph)?;
                (None, vec![target], paths)
            }
        };

        let load_balancer = build_load_balancer(
            self.stack,
            LoadBalancerInputs {
                host: &host,
                frontend,
                api_targets,
                api_paths,
                security_policy: security_policy.as_ref(),
                http_redirect: self.network.enable_http_redirect,
            },
            graph,
        )?;

        Ok(NetworkRefs { api_gateway, load_balancer, security_policy, warnings })
    }

    /// Backend paths when the load balancer routes to Cloud Run directly.
    /// A disabled gateway block still contributes its backend paths.
    fn direct_backend_paths(&self) -> Result<Vec<String>> {
        let configured = self
            .network
            .api_gateway
            .as_ref()
            .map(|gateway| gateway.config.backend.paths.clone())
            .unwrap_or_default();
        let paths = if configured.is_empty() {
            DEFAULT_BACKEND_PATHS.iter().map(|p| p.to_string()).collect()
        } else {
            configured
        };
        for path in &paths {
            validate_path(path, "network.api_gateway.config.backend")?;
        }
        Ok(paths)
    }
}
