//! # Stack Configuration
//!
//! User-facing configuration for one fullstack unit. Values are immutable once
//! handed to the builder; optional blocks are `Option` so that "absent" and
//! "empty" stay distinguishable (the CORS defaulting rules depend on it).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::errors::{FullStackError, Result};
use crate::validation::{
    parse_cidr, validate_image, validate_label, validate_project_id, validate_region,
    validate_region_format,
};

/// Root configuration for a fullstack deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StackConfig {
    /// GCP project id
    #[validate(custom(function = "validate_project_id"))]
    pub project: String,

    /// Region for both Cloud Run services (and the default gateway region)
    #[validate(custom(function = "validate_region_format"))]
    pub region: String,

    /// Container image for the API service
    #[validate(length(min = 1, message = "backend image is required"))]
    pub backend_image: String,

    /// Container image for the web frontend
    #[validate(length(min = 1, message = "frontend image is required"))]
    pub frontend_image: String,

    #[validate(nested)]
    pub network: NetworkConfig,

    /// Labels applied to every labelable resource
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Backend runtime settings
    #[serde(default)]
    #[validate(nested)]
    pub backend: ServiceSettings,

    /// Frontend runtime settings
    #[serde(default)]
    #[validate(nested)]
    pub frontend: ServiceSettings,
}

impl StackConfig {
    /// Minimal configuration with every optional block defaulted
    pub fn new(
        project: impl Into<String>,
        region: impl Into<String>,
        backend_image: impl Into<String>,
        frontend_image: impl Into<String>,
        domain_url: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
            backend_image: backend_image.into(),
            frontend_image: frontend_image.into(),
            network: NetworkConfig::new(domain_url),
            labels: BTreeMap::new(),
            backend: ServiceSettings::default(),
            frontend: ServiceSettings::default(),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(FullStackError::from)?;
        self.validate_custom()
    }

    /// Rules the `validator` derive cannot express
    fn validate_custom(&self) -> Result<()> {
        validate_image(&self.backend_image, "backend_image")?;
        validate_image(&self.frontend_image, "frontend_image")?;

        for (key, value) in &self.labels {
            validate_label(key, value)?;
        }

        self.network.allowlist_cidrs()?;

        if let Some(gateway) = self.network.api_gateway.as_ref().filter(|g| g.enabled) {
            for region in &gateway.regions {
                validate_region(region, "network.api_gateway.regions")?;
            }
            if self.network.enable_private_traffic_only {
                return Err(FullStackError::config_field(
                    "enable_private_traffic_only cannot be combined with an enabled API Gateway: \
                     the gateway reaches Cloud Run outside the load balancer",
                    "network.enable_private_traffic_only",
                ));
            }
        }

        for (field, settings) in [("backend", &self.backend), ("frontend", &self.frontend)] {
            settings.limits.check_bounds(field)?;
        }

        Ok(())
    }
}

/// Ingress, certificate and edge-security settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NetworkConfig {
    /// Public domain served by the managed certificate
    #[validate(length(min = 1, message = "domain URL is required"))]
    pub domain_url: String,

    #[serde(default)]
    pub enable_cloud_armor: bool,

    /// Ordered CIDR allowlist; empty means no restriction
    #[serde(default)]
    pub client_ip_allowlist: Vec<String>,

    /// Restrict Cloud Run ingress to traffic from the load balancer
    #[serde(default)]
    pub enable_private_traffic_only: bool,

    /// Add a port-80 forwarding rule that redirects to HTTPS
    #[serde(default = "default_true")]
    pub enable_http_redirect: bool,

    #[serde(default)]
    pub api_gateway: Option<ApiGatewayConfig>,
}

impl NetworkConfig {
    pub fn new(domain_url: impl Into<String>) -> Self {
        Self {
            domain_url: domain_url.into(),
            enable_cloud_armor: false,
            client_ip_allowlist: Vec::new(),
            enable_private_traffic_only: false,
            enable_http_redirect: true,
            api_gateway: None,
        }
    }

    /// Allowlist entries normalised to `addr/prefix`, order preserved
    pub fn allowlist_cidrs(&self) -> Result<Vec<String>> {
        self.client_ip_allowlist.iter().map(|cidr| parse_cidr(cidr)).collect()
    }

    /// The gateway block, only when present and enabled
    pub fn enabled_gateway(&self) -> Option<&ApiGatewayConfig> {
        self.api_gateway.as_ref().filter(|gateway| gateway.enabled)
    }
}

/// API Gateway placement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGatewayConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Regions to deploy a gateway in; empty means the stack region only
    #[serde(default)]
    pub regions: Vec<String>,

    #[serde(default)]
    pub config: ApiConfig,
}

impl ApiGatewayConfig {
    /// Requested regions with the stack region as fallback, duplicates removed
    pub fn effective_regions(&self, stack_region: &str) -> Vec<String> {
        let mut regions: Vec<String> = Vec::new();
        for region in &self.regions {
            if !regions.contains(region) {
                regions.push(region.clone());
            }
        }
        if regions.is_empty() {
            regions.push(stack_region.to_string());
        }
        regions
    }
}

/// Gateway API definition and routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Path of the OpenAPI document the gateway serves
    #[serde(default)]
    pub openapi_spec_path: String,

    #[serde(default)]
    pub backend: Upstream,

    #[serde(default)]
    pub frontend: Option<Upstream>,

    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// `None` or empty: substitute `["*"]`
    #[serde(default)]
    pub cors_allowed_origins: Option<Vec<String>>,

    /// `None` or empty: substitute the full verb set
    #[serde(default)]
    pub cors_allowed_methods: Option<Vec<String>>,

    /// `None` or empty: substitute `["*"]`
    #[serde(default)]
    pub cors_allowed_headers: Option<Vec<String>>,

    #[serde(default)]
    pub cors_allow_credentials: bool,

    #[serde(default = "default_cors_max_age")]
    pub cors_max_age_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            openapi_spec_path: String::new(),
            backend: Upstream::default(),
            frontend: None,
            enable_cors: true,
            cors_allowed_origins: None,
            cors_allowed_methods: None,
            cors_allowed_headers: None,
            cors_allow_credentials: false,
            cors_max_age_seconds: default_cors_max_age(),
        }
    }
}

/// Backend target behind the gateway or load balancer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upstream {
    /// Routed path patterns; the backend defaults to `/api/*`
    #[serde(default)]
    pub paths: Vec<String>,

    #[serde(default)]
    pub jwt_auth: Option<JwtAuth>,

    #[serde(default = "default_deadline")]
    pub deadline_seconds: u32,
}

impl Default for Upstream {
    fn default() -> Self {
        Self { paths: Vec::new(), jwt_auth: None, deadline_seconds: default_deadline() }
    }
}

/// JWT validation settings. Issuer and JWKS URI are set together or not at
/// all; leaving both empty requests derivation from the frontend identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwtAuth {
    #[serde(default)]
    pub issuer: Option<String>,

    #[serde(default)]
    pub jwks_uri: Option<String>,

    #[serde(default)]
    pub audiences: Vec<String>,
}

impl JwtAuth {
    /// Both fields unset (or blank)
    pub fn is_unresolved(&self) -> bool {
        blank(&self.issuer) && blank(&self.jwks_uri)
    }

    /// Exactly one of issuer / JWKS URI set
    pub fn is_partial(&self) -> bool {
        blank(&self.issuer) != blank(&self.jwks_uri)
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Per-service runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ServiceSettings {
    /// Literal environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Environment variables sourced from Secret Manager
    #[serde(default)]
    pub secrets: Vec<SecretBinding>,

    #[serde(default)]
    #[validate(nested)]
    pub limits: ServiceLimits,

    #[serde(default)]
    pub identity: IdentityMode,

    #[serde(default = "default_container_port")]
    #[validate(range(min = 1, message = "container port must be between 1 and 65535"))]
    pub container_port: u16,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            env: BTreeMap::new(),
            secrets: Vec::new(),
            limits: ServiceLimits::default(),
            identity: IdentityMode::default(),
            container_port: default_container_port(),
        }
    }
}

/// One secret exposed to a service as an environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretBinding {
    /// Secret id, or a full `projects/{project}/secrets/{id}` path
    pub secret: String,

    pub env_var: String,

    /// Secret version; defaults to `latest`
    #[serde(default)]
    pub version: Option<String>,
}

impl SecretBinding {
    pub fn new(secret: impl Into<String>, env_var: impl Into<String>) -> Self {
        Self { secret: secret.into(), env_var: env_var.into(), version: None }
    }
}

/// Scaling and resource bounds for a Cloud Run service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ServiceLimits {
    #[serde(default)]
    #[validate(range(max = 1000, message = "min instances must be at most 1000"))]
    pub min_instances: u32,

    #[serde(default = "default_max_instances")]
    #[validate(range(min = 1, max = 1000, message = "max instances must be between 1 and 1000"))]
    pub max_instances: u32,

    #[serde(default = "default_cpu")]
    #[validate(length(min = 1, message = "cpu limit cannot be empty"))]
    pub cpu: String,

    #[serde(default = "default_memory")]
    #[validate(length(min = 1, message = "memory limit cannot be empty"))]
    pub memory: String,

    #[serde(default = "default_concurrency")]
    #[validate(range(min = 1, max = 1000, message = "concurrency must be between 1 and 1000"))]
    pub concurrency: u32,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        Self {
            min_instances: 0,
            max_instances: default_max_instances(),
            cpu: default_cpu(),
            memory: default_memory(),
            concurrency: default_concurrency(),
        }
    }
}

impl ServiceLimits {
    fn check_bounds(&self, service: &str) -> Result<()> {
        if self.min_instances > self.max_instances {
            return Err(FullStackError::config_field(
                format!(
                    "{} min instances ({}) exceeds max instances ({})",
                    service, self.min_instances, self.max_instances
                ),
                format!("{}.limits", service),
            ));
        }
        Ok(())
    }
}

/// Which identity a Cloud Run service runs as
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IdentityMode {
    /// Create a service account for this service
    #[default]
    Dedicated,
    /// Run as an existing service account
    Existing { email: String },
    /// Run as the project's default compute identity (no explicit account)
    ProjectDefault,
}

fn default_true() -> bool {
    true
}

fn default_cors_max_age() -> u64 {
    3600
}

fn default_deadline() -> u32 {
    15
}

fn default_container_port() -> u16 {
    8080
}

fn default_max_instances() -> u32 {
    10
}

fn default_cpu() -> String {
    "1".to_string()
}

fn default_memory() -> String {
    "512Mi".to_string()
}

fn default_concurrency() -> u32 {
    80
}
