//! Resource descriptors understood by the orchestration engine.
//!
//! Each descriptor mirrors the desired state of one GCP resource. Field names
//! follow the provider's camelCase schema so the engine can pass properties
//! through without translation. Collections are ordered (`Vec`, `BTreeMap`)
//! so that identical input always serializes identically.

use serde::Serialize;
use std::collections::BTreeMap;

use super::Output;

pub const TYPE_CLOUD_RUN_SERVICE: &str = "gcp:cloudrunv2/service:Service";
pub const TYPE_CLOUD_RUN_IAM_MEMBER: &str = "gcp:cloudrunv2/serviceIamMember:ServiceIamMember";
pub const TYPE_SERVICE_ACCOUNT: &str = "gcp:serviceaccount/account:Account";
pub const TYPE_SECRET_IAM_MEMBER: &str = "gcp:secretmanager/secretIamMember:SecretIamMember";
pub const TYPE_REGION_NEG: &str = "gcp:compute/regionNetworkEndpointGroup:RegionNetworkEndpointGroup";
pub const TYPE_BACKEND_SERVICE: &str = "gcp:compute/backendService:BackendService";
pub const TYPE_URL_MAP: &str = "gcp:compute/uRLMap:URLMap";
pub const TYPE_MANAGED_SSL_CERTIFICATE: &str =
    "gcp:compute/managedSslCertificate:ManagedSslCertificate";
pub const TYPE_GLOBAL_ADDRESS: &str = "gcp:compute/globalAddress:GlobalAddress";
pub const TYPE_TARGET_HTTPS_PROXY: &str = "gcp:compute/targetHttpsProxy:TargetHttpsProxy";
pub const TYPE_TARGET_HTTP_PROXY: &str = "gcp:compute/targetHttpProxy:TargetHttpProxy";
pub const TYPE_GLOBAL_FORWARDING_RULE: &str =
    "gcp:compute/globalForwardingRule:GlobalForwardingRule";
pub const TYPE_SECURITY_POLICY: &str = "gcp:compute/securityPolicy:SecurityPolicy";
pub const TYPE_API_GATEWAY_API: &str = "gcp:apigateway/api:Api";
pub const TYPE_API_GATEWAY_API_CONFIG: &str = "gcp:apigateway/apiConfig:ApiConfig";
pub const TYPE_API_GATEWAY_GATEWAY: &str = "gcp:apigateway/gateway:Gateway";

/// Typed properties of a single resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceSpec {
    CloudRunService(CloudRunService),
    CloudRunIamMember(CloudRunIamMember),
    ServiceAccount(ServiceAccount),
    SecretIamMember(SecretIamMember),
    RegionNetworkEndpointGroup(RegionNetworkEndpointGroup),
    BackendService(BackendService),
    UrlMap(UrlMap),
    ManagedSslCertificate(ManagedSslCertificate),
    GlobalAddress(GlobalAddress),
    TargetHttpsProxy(TargetHttpsProxy),
    TargetHttpProxy(TargetHttpProxy),
    GlobalForwardingRule(GlobalForwardingRule),
    SecurityPolicy(SecurityPolicy),
    ApiGatewayApi(ApiGatewayApi),
    ApiGatewayApiConfig(Box<ApiGatewayApiConfig>),
    ApiGatewayGateway(ApiGatewayGateway),
}

impl ResourceSpec {
    /// Provider type token used by the engine to pick a resource provider
    pub fn type_token(&self) -> &'static str {
        match self {
            ResourceSpec::CloudRunService(_) => TYPE_CLOUD_RUN_SERVICE,
            ResourceSpec::CloudRunIamMember(_) => TYPE_CLOUD_RUN_IAM_MEMBER,
            ResourceSpec::ServiceAccount(_) => TYPE_SERVICE_ACCOUNT,
            ResourceSpec::SecretIamMember(_) => TYPE_SECRET_IAM_MEMBER,
            ResourceSpec::RegionNetworkEndpointGroup(_) => TYPE_REGION_NEG,
            ResourceSpec::BackendService(_) => TYPE_BACKEND_SERVICE,
            ResourceSpec::UrlMap(_) => TYPE_URL_MAP,
            ResourceSpec::ManagedSslCertificate(_) => TYPE_MANAGED_SSL_CERTIFICATE,
            ResourceSpec::GlobalAddress(_) => TYPE_GLOBAL_ADDRESS,
            ResourceSpec::TargetHttpsProxy(_) => TYPE_TARGET_HTTPS_PROXY,
            ResourceSpec::TargetHttpProxy(_) => TYPE_TARGET_HTTP_PROXY,
            ResourceSpec::GlobalForwardingRule(_) => TYPE_GLOBAL_FORWARDING_RULE,
            ResourceSpec::SecurityPolicy(_) => TYPE_SECURITY_POLICY,
            ResourceSpec::ApiGatewayApi(_) => TYPE_API_GATEWAY_API,
            ResourceSpec::ApiGatewayApiConfig(_) => TYPE_API_GATEWAY_API_CONFIG,
            ResourceSpec::ApiGatewayGateway(_) => TYPE_API_GATEWAY_GATEWAY,
        }
    }
}

// ---------------------------------------------------------------------------
// Cloud Run
// ---------------------------------------------------------------------------

/// Ingress setting of a Cloud Run service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ingress {
    IngressTrafficAll,
    IngressTrafficInternalLoadBalancer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudRunService {
    pub name: String,
    pub project: String,
    pub location: String,
    pub ingress: Ingress,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub template: ServiceTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    pub scaling: Scaling,
    pub max_instance_request_concurrency: u32,
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scaling {
    pub min_instance_count: u32,
    pub max_instance_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub image: String,
    pub ports: Vec<ContainerPort>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<EnvVar>,
    pub resources: ContainerResources,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    pub container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerResources {
    pub limits: BTreeMap<String, String>,
}

/// Environment variable, either literal or sourced from Secret Manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_source: Option<EnvVarSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    pub secret_key_ref: SecretKeyRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretKeyRef {
    /// Secret id or full `projects/*/secrets/*` path
    pub secret: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudRunIamMember {
    pub name: Output<String>,
    pub project: String,
    pub location: String,
    pub role: String,
    pub member: String,
}

// ---------------------------------------------------------------------------
// IAM and secrets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub account_id: String,
    pub project: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretIamMember {
    pub project: String,
    pub secret_id: String,
    pub role: String,
    pub member: String,
}

// ---------------------------------------------------------------------------
// Load balancing
// ---------------------------------------------------------------------------

/// Serverless NEG pointing at either a Cloud Run service or an API Gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionNetworkEndpointGroup {
    pub name: String,
    pub project: String,
    pub region: String,
    pub network_endpoint_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_run: Option<CloudRunEndpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serverless_deployment: Option<ServerlessDeployment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudRunEndpoint {
    pub service: Output<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerlessDeployment {
    pub platform: String,
    pub resource: Output<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendService {
    pub name: String,
    pub project: String,
    pub protocol: String,
    pub load_balancing_scheme: String,
    pub backends: Vec<Backend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_policy: Option<Output<String>>,
    pub log_config: BackendLogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Backend {
    pub group: Output<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendLogConfig {
    pub enable: bool,
    pub sample_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlMap {
    pub name: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_service: Option<Output<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_url_redirect: Option<UrlRedirect>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub host_rules: Vec<HostRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path_matchers: Vec<PathMatcher>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlRedirect {
    pub https_redirect: bool,
    pub redirect_response_code: String,
    pub strip_query: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRule {
    pub hosts: Vec<String>,
    pub path_matcher: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathMatcher {
    pub name: String,
    pub default_service: Output<String>,
    pub path_rules: Vec<PathRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRule {
    pub paths: Vec<String>,
    pub service: Output<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedSslCertificate {
    pub name: String,
    pub project: String,
    pub managed: ManagedDomains,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedDomains {
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalAddress {
    pub name: String,
    pub project: String,
    pub ip_version: String,
    pub address_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHttpsProxy {
    pub name: String,
    pub project: String,
    pub url_map: Output<String>,
    pub ssl_certificates: Vec<Output<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHttpProxy {
    pub name: String,
    pub project: String,
    pub url_map: Output<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalForwardingRule {
    pub name: String,
    pub project: String,
    pub ip_address: Output<String>,
    pub ip_protocol: String,
    pub port_range: String,
    pub target: Output<String>,
    pub load_balancing_scheme: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Cloud Armor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPolicy {
    pub name: String,
    pub project: String,
    pub description: String,
    pub rules: Vec<SecurityPolicyRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityPolicyRule {
    pub action: String,
    pub priority: u32,
    pub description: String,
    #[serde(rename = "match")]
    pub rule_match: RuleMatch,
}

/// Either a source IP range match or a CEL expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuleMatch {
    #[serde(rename_all = "camelCase")]
    SourceRanges { versioned_expr: String, config: SourceRangeConfig },
    Expression { expr: Expr },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRangeConfig {
    pub src_ip_ranges: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expr {
    pub expression: String,
}

// ---------------------------------------------------------------------------
// API Gateway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayApi {
    pub api_id: String,
    pub project: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayApiConfig {
    pub api: Output<String>,
    pub api_config_id_prefix: String,
    pub project: String,
    pub openapi_documents: Vec<OpenApiDocument>,
    pub backend: UpstreamRoute,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend: Option<UpstreamRoute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsPolicy>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenApiDocument {
    pub path: String,
}

/// `x-google-backend` routing for one upstream service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamRoute {
    pub address: Output<String>,
    pub paths: Vec<String>,
    pub deadline_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_auth: Option<JwtProvider>,
}

/// Resolved JWT security definition; both fields are always set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtProvider {
    pub issuer: String,
    pub jwks_uri: String,
    pub audiences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayGateway {
    pub gateway_id: String,
    pub project: String,
    pub region: String,
    pub api_config: Output<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}
