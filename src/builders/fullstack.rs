//! # Full Stack Builder
//!
//! Root of the build: validates the configuration, builds both services and
//! the network tier, and aggregates everything into a [`FullStackResult`].
//! The first error aborts the build; no partial result is returned.

use serde::Serialize;
use std::collections::BTreeMap;

use super::network::{GatewayRef, LoadBalancerRef, NetworkBuilder};
use super::service::{ServiceBuilder, ServiceRef, ServiceRole};
use super::StackContext;
use crate::build_span;
use crate::config::StackConfig;
use crate::errors::Result;
use crate::graph::{Output, Resource, ResourceGraph};
use crate::validation::validate_stack_name;

pub const OUTPUT_BACKEND_URL: &str = "backendUrl";
pub const OUTPUT_FRONTEND_URL: &str = "frontendUrl";
pub const OUTPUT_API_GATEWAY_HOSTNAME: &str = "apiGatewayHostname";
pub const OUTPUT_LOAD_BALANCER_IP: &str = "loadBalancerIp";

/// Builds one fullstack unit from a [`StackConfig`]
pub struct FullStackBuilder<'a> {
    name: String,
    config: &'a StackConfig,
}

impl<'a> FullStackBuilder<'a> {
    pub fn new(name: impl Into<String>, config: &'a StackConfig) -> Self {
        Self { name: name.into(), config }
    }

    pub fn build(&self) -> Result<FullStackResult> {
        let span = build_span!(self.name, project = %self.config.project, region = %self.config.region);
        let _guard = span.enter();

        validate_stack_name(&self.name)?;
        self.config.validate()?;

        let stack = StackContext::new(self.name.clone(), self.config);
        let network = &self.config.network;
        let mut graph = ResourceGraph::new();

        let backend = ServiceBuilder::new(
            &stack,
            ServiceRole::Backend,
            &self.config.backend_image,
            &self.config.backend,
        )
        .private(network.enable_private_traffic_only)
        .build(&mut graph)?;
        let frontend = ServiceBuilder::new(
            &stack,
            ServiceRole::Frontend,
            &self.config.frontend_image,
            &self.config.frontend,
        )
        .private(network.enable_private_traffic_only)
        .build(&mut graph)?;

        let refs = NetworkBuilder::new(&stack, network).build(&backend, &frontend, &mut graph)?;

        let mut outputs = BTreeMap::new();
        outputs.insert(OUTPUT_BACKEND_URL.to_string(), backend.url.clone());
        outputs.insert(OUTPUT_FRONTEND_URL.to_string(), frontend.url.clone());
        if let Some(hostname) = refs.api_gateway.as_ref().and_then(GatewayRef::hostname) {
            outputs.insert(OUTPUT_API_GATEWAY_HOSTNAME.to_string(), hostname.clone());
        }
        outputs.insert(OUTPUT_LOAD_BALANCER_IP.to_string(), refs.load_balancer.ip_address.clone());

        tracing::info!(
            resources = graph.len(),
            api_gateway = refs.api_gateway.is_some(),
            warnings = refs.warnings.len(),
            "stack built"
        );

        Ok(FullStackResult {
            name: self.name.clone(),
            graph,
            outputs,
            warnings: refs.warnings,
            backend,
            frontend,
            api_gateway: refs.api_gateway,
            load_balancer: refs.load_balancer,
        })
    }
}

/// Shorthand for `FullStackBuilder::new(name, config).build()`
pub fn build_fullstack(name: impl Into<String>, config: &StackConfig) -> Result<FullStackResult> {
    FullStackBuilder::new(name, config).build()
}

/// Everything a build produced. Serializes as the stack manifest handed to
/// the orchestration engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullStackResult {
    #[serde(rename = "stack")]
    name: String,
    #[serde(rename = "resources", serialize_with = "serialize_resources")]
    graph: ResourceGraph,
    outputs: BTreeMap<String, Output<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip)]
    backend: ServiceRef,
    #[serde(skip)]
    frontend: ServiceRef,
    #[serde(skip)]
    api_gateway: Option<GatewayRef>,
    #[serde(skip)]
    load_balancer: LoadBalancerRef,
}

impl FullStackResult {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend_service(&self) -> &ServiceRef {
        &self.backend
    }

    pub fn frontend_service(&self) -> &ServiceRef {
        &self.frontend
    }

    /// `None` when the API Gateway is disabled
    pub fn api_gateway(&self) -> Option<&GatewayRef> {
        self.api_gateway.as_ref()
    }

    pub fn load_balancer(&self) -> &LoadBalancerRef {
        &self.load_balancer
    }

    /// Resource descriptors in creation order
    pub fn resources(&self) -> &[Resource] {
        self.graph.resources()
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output<String>> {
        &self.outputs
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

fn serialize_resources<S>(graph: &ResourceGraph, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    graph.resources().serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, ApiGatewayConfig, IdentityMode, JwtAuth};

    fn config() -> StackConfig {
        StackConfig::new("p", "us-central1", "gcr.io/p/api:1", "gcr.io/p/web:1", "app.example.com")
    }

    #[test]
    fn builds_minimal_stack() {
        let result = FullStackBuilder::new("shop", &config()).build().unwrap();

        assert_eq!(result.name(), "shop");
        assert_eq!(result.backend_service().name, "shop-backend");
        assert_eq!(result.frontend_service().name, "shop-frontend");
        assert!(result.api_gateway().is_none());
        assert_eq!(result.load_balancer().url_map, "shop-lb");
        assert!(result.warnings().is_empty());

        let outputs: Vec<&String> = result.outputs().keys().collect();
        assert_eq!(outputs, vec!["backendUrl", "frontendUrl", "loadBalancerIp"]);
        assert_eq!(result.outputs()["backendUrl"].interpolation(), "${shop-backend.uri}");
    }

    #[test]
    fn invalid_stack_name_is_rejected() {
        let err = FullStackBuilder::new("Shop", &config()).build().unwrap_err();
        assert_eq!(err.field(), Some("name"));
    }

    #[test]
    fn validation_runs_before_anything_is_built() {
        let mut config = config();
        config.frontend_image.clear();
        let err = build_fullstack("shop", &config).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn gateway_adds_hostname_output() {
        let mut config = config();
        config.network.api_gateway = Some(ApiGatewayConfig {
            enabled: true,
            regions: vec![],
            config: ApiConfig { openapi_spec_path: "openapi.yaml".into(), ..Default::default() },
        });
        let result = build_fullstack("shop", &config).unwrap();
        assert_eq!(
            result.outputs()[OUTPUT_API_GATEWAY_HOSTNAME].interpolation(),
            "${shop-gateway-us-central1.defaultHostname}"
        );
    }

    #[test]
    fn jwt_without_frontend_identity_fails() {
        let mut config = config();
        config.frontend.identity = IdentityMode::ProjectDefault;
        let mut api = ApiConfig { openapi_spec_path: "openapi.yaml".into(), ..Default::default() };
        api.backend.jwt_auth = Some(JwtAuth::default());
        config.network.api_gateway =
            Some(ApiGatewayConfig { enabled: true, regions: vec![], config: api });

        let err = build_fullstack("shop", &config).unwrap_err();
        assert_eq!(err.field(), Some("network.api_gateway.config.backend.jwt_auth"));
    }

    #[test]
    fn manifest_serializes_resources_and_outputs() {
        let result = build_fullstack("shop", &config()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["stack"], "shop");
        assert_eq!(json["resources"].as_array().unwrap().len(), result.resources().len());
        assert_eq!(json["outputs"]["loadBalancerIp"], "${shop-lb-ip.address}");
        assert!(json.get("warnings").is_none());
    }
}
