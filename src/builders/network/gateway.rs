//! API Gateway resources: one API, one API config and a gateway plus a
//! serverless NEG per region.

use super::cors::resolve_cors;
use super::jwt::resolve_jwt;
use crate::builders::service::{ServiceIdentity, ServiceRef};
use crate::builders::StackContext;
use crate::component_span;
use crate::config::{ApiGatewayConfig, Upstream};
use crate::errors::{FullStackError, Result};
use crate::graph::{
    ApiGatewayApi, ApiGatewayApiConfig, ApiGatewayGateway, OpenApiDocument, Output,
    RegionNetworkEndpointGroup, Resource, ResourceGraph, ResourceSpec, ServerlessDeployment,
    UpstreamRoute,
};
use crate::naming::SUFFIX_GATEWAY;
use crate::validation::validate_region;

pub const API_GATEWAY_PLATFORM: &str = "apigateway.googleapis.com";
pub const SERVERLESS_NEG: &str = "SERVERLESS";
pub const DEFAULT_BACKEND_PATHS: [&str; 1] = ["/api/*"];
pub const DEFAULT_FRONTEND_PATHS: [&str; 1] = ["/*"];

const FIELD: &str = "network.api_gateway.config";

/// One regional gateway and the NEG that fronts it
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayInstance {
    pub region: String,
    pub gateway_id: String,
    pub hostname: Output<String>,
    /// Logical name of the serverless NEG
    pub neg: String,
    pub neg_id: Output<String>,
}

/// Handle to the gateway tier
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRef {
    pub api_id: String,
    pub api_config: String,
    pub gateways: Vec<GatewayInstance>,
    /// Paths the load balancer should send to the gateway
    pub routed_paths: Vec<String>,
}

impl GatewayRef {
    /// Hostname of the first gateway, used as the stack output
    pub fn hostname(&self) -> Option<&Output<String>> {
        self.gateways.first().map(|gateway| &gateway.hostname)
    }
}

pub(crate) fn build_gateway(
    stack: &StackContext,
    gateway: &ApiGatewayConfig,
    backend: &ServiceRef,
    frontend: &ServiceRef,
    graph: &mut ResourceGraph,
) -> Result<GatewayRef> {
    let api_id = stack.resource_name(SUFFIX_GATEWAY);
    let _span = component_span!("api_gateway", &api_id).entered();
    let api = &gateway.config;

    let openapi_path = api.openapi_spec_path.trim();
    if openapi_path.is_empty() {
        return Err(FullStackError::config_field(
            "an OpenAPI document path is required when the API Gateway is enabled",
            format!("{}.openapi_spec_path", FIELD),
        ));
    }

    let frontend_identity = frontend.identity.as_ref();
    let backend_route =
        upstream_route(&api.backend, backend, &DEFAULT_BACKEND_PATHS, frontend_identity, "backend")?;
    let frontend_route = api
        .frontend
        .as_ref()
        .map(|upstream| {
            upstream_route(upstream, frontend, &DEFAULT_FRONTEND_PATHS, frontend_identity, "frontend")
        })
        .transpose()?;
    let cors = resolve_cors(api)?;

    let mut routed_paths = backend_route.paths.clone();
    if let Some(route) = &frontend_route {
        routed_paths.extend(route.paths.iter().cloned());
    }

    let api_resource = Resource::new(
        api_id.clone(),
        ResourceSpec::ApiGatewayApi(ApiGatewayApi {
            api_id: api_id.clone(),
            project: stack.project.clone(),
            labels: stack.labels.clone(),
        }),
    );
    let api_output = graph.add(api_resource)?;

    let config_name = stack.resource_name(&format!("{}-config", SUFFIX_GATEWAY));
    let mut config_deps = vec![api_id.clone(), backend.name.clone()];
    if frontend_route.is_some() {
        config_deps.push(frontend.name.clone());
    }
    let config_resource = Resource::new(
        config_name.clone(),
        ResourceSpec::ApiGatewayApiConfig(Box::new(ApiGatewayApiConfig {
            api: api_output,
            api_config_id_prefix: format!("{}-", config_name),
            project: stack.project.clone(),
            openapi_documents: vec![OpenApiDocument { path: openapi_path.to_string() }],
            backend: backend_route,
            frontend: frontend_route,
            cors,
            labels: stack.labels.clone(),
        })),
    )
    .depends_on(config_deps);
    let config_output = graph.add(config_resource)?;

    let mut gateways = Vec::new();
    for region in gateway.effective_regions(&stack.region) {
        validate_region(&region, "network.api_gateway.regions")?;

        let gateway_id = stack.resource_name(&format!("{}-{}", SUFFIX_GATEWAY, region));
        let gateway_resource = Resource::new(
            gateway_id.clone(),
            ResourceSpec::ApiGatewayGateway(ApiGatewayGateway {
                gateway_id: gateway_id.clone(),
                project: stack.project.clone(),
                region: region.clone(),
                api_config: config_output.clone(),
                labels: stack.labels.clone(),
            }),
        )
        .depends_on([config_name.as_str()]);
        let hostname = gateway_resource.output("defaultHostname");
        let gateway_output = gateway_resource.output("gatewayId");
        graph.add(gateway_resource)?;

        let neg = stack.resource_name(&format!("{}-neg-{}", SUFFIX_GATEWAY, region));
        let neg_resource = Resource::new(
            neg.clone(),
            ResourceSpec::RegionNetworkEndpointGroup(RegionNetworkEndpointGroup {
                name: neg.clone(),
                project: stack.project.clone(),
                region: region.clone(),
                network_endpoint_type: SERVERLESS_NEG.to_string(),
                cloud_run: None,
                serverless_deployment: Some(ServerlessDeployment {
                    platform: API_GATEWAY_PLATFORM.to_string(),
                    resource: gateway_output,
                }),
            }),
        )
        .depends_on([gateway_id.as_str()]);
        let neg_id = graph.add(neg_resource)?;

        tracing::debug!(gateway = %gateway_id, region = %region, "added regional gateway");
        gateways.push(GatewayInstance { region, gateway_id, hostname, neg, neg_id });
    }

    Ok(GatewayRef { api_id, api_config: config_name, gateways, routed_paths })
}

fn upstream_route(
    upstream: &Upstream,
    service: &ServiceRef,
    default_paths: &[&str],
    frontend_identity: Option<&ServiceIdentity>,
    name: &str,
) -> Result<UpstreamRoute> {
    let field = format!("{}.{}", FIELD, name);
    let paths: Vec<String> = if upstream.paths.is_empty() {
        default_paths.iter().map(|p| p.to_string()).collect()
    } else {
        upstream.paths.clone()
    };
    for path in &paths {
        validate_path(path, &field)?;
    }

    Ok(UpstreamRoute {
        address: service.url.clone(),
        paths,
        deadline_seconds: upstream.deadline_seconds,
        jwt_auth: resolve_jwt(upstream.jwt_auth.as_ref(), frontend_identity, &field)?,
    })
}

/// URL map path patterns: absolute, with `*` only as a trailing `/*`
pub(crate) fn validate_path(path: &str, field: &str) -> Result<()> {
    let wildcard_ok = match path.find('*') {
        None => true,
        Some(index) => index == path.len() - 1 && path.ends_with("/*"),
    };
    if !path.starts_with('/') || !wildcard_ok {
        return Err(FullStackError::config_field(
            format!("'{}' is not a valid path pattern", path),
            format!("{}.paths", field),
        ));
    }
    Ok(())
}
