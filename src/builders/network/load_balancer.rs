//! Global external HTTPS load balancer in front of the stack.
//!
//! The URL map sends API paths to the API backend service (Cloud Run backend
//! or the regional gateways) and everything else to the frontend.

use super::security::SecurityPolicyRef;
use crate::builders::service::ServiceRef;
use crate::builders::StackContext;
use crate::component_span;
use crate::errors::Result;
use crate::graph::{
    Backend, BackendLogConfig, BackendService, CloudRunEndpoint, GlobalAddress,
    GlobalForwardingRule, HostRule, ManagedDomains, ManagedSslCertificate, Output, PathMatcher,
    PathRule, RegionNetworkEndpointGroup, Resource, ResourceGraph, ResourceSpec,
    TargetHttpProxy, TargetHttpsProxy, UrlMap, UrlRedirect,
};
use crate::naming::SUFFIX_LB;

pub const EXTERNAL_MANAGED: &str = "EXTERNAL_MANAGED";
const SERVERLESS_NEG: &str = "SERVERLESS";
const PATH_MATCHER: &str = "routes";

/// A backend group (serverless NEG) the load balancer can route to
#[derive(Debug, Clone, PartialEq)]
pub struct BackendTarget {
    pub name: String,
    pub id: Output<String>,
}

/// Handle to the built load balancer
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalancerRef {
    pub url_map: String,
    pub address: String,
    pub ip_address: Output<String>,
    pub certificate: String,
    pub https_forwarding_rule: String,
    pub api_backend_service: String,
    pub web_backend_service: String,
    /// NEGs behind the API backend service
    pub api_targets: Vec<String>,
    pub web_target: String,
    /// Port-80 forwarding rule, when the HTTPS redirect is enabled
    pub http_redirect: Option<String>,
    pub security_policy: Option<String>,
}

/// Inputs the load balancer is wired from
pub(crate) struct LoadBalancerInputs<'a> {
    pub host: &'a str,
    pub frontend: &'a ServiceRef,
    pub api_targets: Vec<BackendTarget>,
    pub api_paths: Vec<String>,
    pub security_policy: Option<&'a SecurityPolicyRef>,
    pub http_redirect: bool,
}

/// Serverless NEG pointing straight at a Cloud Run service
pub(crate) fn cloud_run_neg(
    stack: &StackContext,
    service: &ServiceRef,
    graph: &mut ResourceGraph,
) -> Result<BackendTarget> {
    let name = stack.resource_name(&format!("{}-neg", service.role.suffix()));
    let resource = Resource::new(
        name.clone(),
        ResourceSpec::RegionNetworkEndpointGroup(RegionNetworkEndpointGroup {
            name: name.clone(),
            project: stack.project.clone(),
            region: service.region.clone(),
            network_endpoint_type: SERVERLESS_NEG.to_string(),
            cloud_run: Some(CloudRunEndpoint { service: service.service.clone() }),
            serverless_deployment: None,
        }),
    )
    .depends_on([service.name.as_str()]);
    let id = graph.add(resource)?;
    Ok(BackendTarget { name, id })
}

pub(crate) fn build_load_balancer(
    stack: &StackContext,
    inputs: LoadBalancerInputs<'_>,
    graph: &mut ResourceGraph,
) -> Result<LoadBalancerRef> {
    let url_map = stack.resource_name(SUFFIX_LB);
    let _span = component_span!("load_balancer", &url_map).entered();

    let web_target = cloud_run_neg(stack, inputs.frontend, graph)?;
    let security = inputs.security_policy;

    let api_backend_service = stack.resource_name(&format!("{}-api", SUFFIX_LB));
    let api_service_id =
        add_backend_service(stack, &api_backend_service, &inputs.api_targets, security, graph)?;
    let web_backend_service = stack.resource_name(&format!("{}-web", SUFFIX_LB));
    let web_service_id = add_backend_service(
        stack,
        &web_backend_service,
        std::slice::from_ref(&web_target),
        security,
        graph,
    )?;

    let url_map_id = graph.add(
        Resource::new(
            url_map.clone(),
            ResourceSpec::UrlMap(UrlMap {
                name: url_map.clone(),
                project: stack.project.clone(),
                default_service: Some(web_service_id.clone()),
                default_url_redirect: None,
                host_rules: vec![HostRule {
                    hosts: vec![inputs.host.to_string()],
                    path_matcher: PATH_MATCHER.to_string(),
                }],
                path_matchers: vec![PathMatcher {
                    name: PATH_MATCHER.to_string(),
                    default_service: web_service_id,
                    path_rules: vec![PathRule { paths: inputs.api_paths.clone(), service: api_service_id }],
                }],
            }),
        )
        .depends_on([api_backend_service.as_str(), web_backend_service.as_str()]),
    )?;

    let certificate = stack.resource_name(&format!("{}-cert", SUFFIX_LB));
    let certificate_id = graph.add(Resource::new(
        certificate.clone(),
        ResourceSpec::ManagedSslCertificate(ManagedSslCertificate {
            name: certificate.clone(),
            project: stack.project.clone(),
            managed: ManagedDomains { domains: vec![inputs.host.to_string()] },
        }),
    ))?;

    let address = stack.resource_name(&format!("{}-ip", SUFFIX_LB));
    let address_resource = Resource::new(
        address.clone(),
        ResourceSpec::GlobalAddress(GlobalAddress {
            name: address.clone(),
            project: stack.project.clone(),
            ip_version: "IPV4".to_string(),
            address_type: "EXTERNAL".to_string(),
        }),
    );
    let ip_address = address_resource.output("address");
    graph.add(address_resource)?;

    let https_proxy = stack.resource_name(&format!("{}-https-proxy", SUFFIX_LB));
    let https_proxy_id = graph.add(
        Resource::new(
            https_proxy.clone(),
            ResourceSpec::TargetHttpsProxy(TargetHttpsProxy {
                name: https_proxy.clone(),
                project: stack.project.clone(),
                url_map: url_map_id,
                ssl_certificates: vec![certificate_id],
            }),
        )
        .depends_on([url_map.as_str(), certificate.as_str()]),
    )?;

    let https_forwarding_rule = stack.resource_name(&format!("{}-https", SUFFIX_LB));
    add_forwarding_rule(
        stack,
        &https_forwarding_rule,
        "443",
        &ip_address,
        https_proxy_id,
        [address.as_str(), https_proxy.as_str()],
        graph,
    )?;

    let http_redirect = if inputs.http_redirect {
        Some(add_http_redirect(stack, &address, &ip_address, graph)?)
    } else {
        None
    };

    tracing::debug!(
        url_map = %url_map,
        host = %inputs.host,
        api_targets = inputs.api_targets.len(),
        api_paths = ?inputs.api_paths,
        http_redirect = http_redirect.is_some(),
        "built load balancer"
    );

    Ok(LoadBalancerRef {
        url_map,
        address,
        ip_address,
        certificate,
        https_forwarding_rule,
        api_backend_service,
        web_backend_service,
        api_targets: inputs.api_targets.into_iter().map(|target| target.name).collect(),
        web_target: web_target.name,
        http_redirect,
        security_policy: security.map(|policy| policy.name.clone()),
    })
}

fn add_backend_service(
    stack: &StackContext,
    name: &str,
    targets: &[BackendTarget],
    security: Option<&SecurityPolicyRef>,
    graph: &mut ResourceGraph,
) -> Result<Output<String>> {
    let resource = Resource::new(
        name.to_string(),
        ResourceSpec::BackendService(BackendService {
            name: name.to_string(),
            project: stack.project.clone(),
            protocol: "HTTPS".to_string(),
            load_balancing_scheme: EXTERNAL_MANAGED.to_string(),
            backends: targets.iter().map(|target| Backend { group: target.id.clone() }).collect(),
            security_policy: security.map(|policy| policy.id.clone()),
            log_config: BackendLogConfig { enable: true, sample_rate: 1.0 },
        }),
    )
    .depends_on(targets.iter().map(|target| target.name.clone()))
    .depends_on(security.map(|policy| policy.name.clone()));
    graph.add(resource)
}

fn add_forwarding_rule(
    stack: &StackContext,
    name: &str,
    port: &str,
    ip_address: &Output<String>,
    target: Output<String>,
    depends_on: [&str; 2],
    graph: &mut ResourceGraph,
) -> Result<Output<String>> {
    graph.add(
        Resource::new(
            name.to_string(),
            ResourceSpec::GlobalForwardingRule(GlobalForwardingRule {
                name: name.to_string(),
                project: stack.project.clone(),
                ip_address: ip_address.clone(),
                ip_protocol: "TCP".to_string(),
                port_range: port.to_string(),
                target,
                load_balancing_scheme: EXTERNAL_MANAGED.to_string(),
                labels: stack.labels.clone(),
            }),
        )
        .depends_on(depends_on),
    )
}

/// Port 80 on the same address, answering every request with a 301 to HTTPS
fn add_http_redirect(
    stack: &StackContext,
    address: &str,
    ip_address: &Output<String>,
    graph: &mut ResourceGraph,
) -> Result<String> {
    let redirect_map = stack.resource_name(&format!("{}-http-redirect", SUFFIX_LB));
    let redirect_map_id = graph.add(Resource::new(
        redirect_map.clone(),
        ResourceSpec::UrlMap(UrlMap {
            name: redirect_map.clone(),
            project: stack.project.clone(),
            default_service: None,
            default_url_redirect: Some(UrlRedirect {
                https_redirect: true,
                redirect_response_code: "MOVED_PERMANENTLY_DEFAULT".to_string(),
                strip_query: false,
            }),
            host_rules: Vec::new(),
            path_matchers: Vec::new(),
        }),
    ))?;

    let http_proxy = stack.resource_name(&format!("{}-http-proxy", SUFFIX_LB));
    let http_proxy_id = graph.add(
        Resource::new(
            http_proxy.clone(),
            ResourceSpec::TargetHttpProxy(TargetHttpProxy {
                name: http_proxy.clone(),
                project: stack.project.clone(),
                url_map: redirect_map_id,
            }),
        )
        .depends_on([redirect_map.as_str()]),
    )?;

    let rule = stack.resource_name(&format!("{}-http", SUFFIX_LB));
    add_forwarding_rule(
        stack,
        &rule,
        "80",
        ip_address,
        http_proxy_id,
        [address, http_proxy.as_str()],
        graph,
    )?;
    Ok(rule)
}
