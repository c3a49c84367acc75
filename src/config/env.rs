//! Environment-variable loader for [`StackConfig`].
//!
//! The loader runs once at startup and returns an immutable value that is
//! passed explicitly to the builder. Any missing required variable is a
//! `Load` error.

use std::collections::BTreeMap;

use super::stack::{NetworkConfig, ServiceSettings, StackConfig};
use crate::errors::{FullStackError, Result};

pub const ENV_GCP_PROJECT: &str = "GCP_PROJECT";
pub const ENV_GCP_REGION: &str = "GCP_REGION";
pub const ENV_BACKEND_IMAGE: &str = "BACKEND_IMAGE";
pub const ENV_FRONTEND_IMAGE: &str = "FRONTEND_IMAGE";
pub const ENV_DOMAIN_URL: &str = "DOMAIN_URL";
pub const ENV_ENABLE_CLOUD_ARMOR: &str = "ENABLE_CLOUD_ARMOR";
pub const ENV_CLIENT_IP_ALLOWLIST: &str = "CLIENT_IP_ALLOWLIST";
pub const ENV_ENABLE_PRIVATE_TRAFFIC_ONLY: &str = "ENABLE_PRIVATE_TRAFFIC_ONLY";

impl StackConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).ok_or_else(|| {
                FullStackError::load_var(format!("required environment variable {} is not set", key), key)
            })
        };

        let project = required(ENV_GCP_PROJECT)?;
        let region = required(ENV_GCP_REGION)?;
        let backend_image = required(ENV_BACKEND_IMAGE)?;
        let frontend_image = required(ENV_FRONTEND_IMAGE)?;
        let domain_url = required(ENV_DOMAIN_URL)?;

        let enable_cloud_armor = parse_bool(ENV_ENABLE_CLOUD_ARMOR, lookup(ENV_ENABLE_CLOUD_ARMOR))?;
        let enable_private_traffic_only =
            parse_bool(ENV_ENABLE_PRIVATE_TRAFFIC_ONLY, lookup(ENV_ENABLE_PRIVATE_TRAFFIC_ONLY))?;
        let client_ip_allowlist = parse_list(lookup(ENV_CLIENT_IP_ALLOWLIST));

        Ok(Self {
            project,
            region,
            backend_image,
            frontend_image,
            network: NetworkConfig {
                enable_cloud_armor,
                client_ip_allowlist,
                enable_private_traffic_only,
                ..NetworkConfig::new(domain_url)
            },
            labels: BTreeMap::new(),
            backend: ServiceSettings::default(),
            frontend: ServiceSettings::default(),
        })
    }
}

/// Unset or blank means `false`
fn parse_bool(key: &str, value: Option<String>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_lowercase().as_str() {
        "" | "false" | "0" | "no" | "off" => Ok(false),
        "true" | "1" | "yes" | "on" => Ok(true),
        other => Err(FullStackError::load_var(
            format!("{} must be a boolean, got '{}'", key, other),
            key,
        )),
    }
}

/// Comma separated, blanks dropped, order preserved
fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        (ENV_GCP_PROJECT, "p"),
        (ENV_GCP_REGION, "us-central1"),
        (ENV_BACKEND_IMAGE, "img-b"),
        (ENV_FRONTEND_IMAGE, "img-f"),
        (ENV_DOMAIN_URL, "a.com"),
    ];

    #[test]
    fn loads_required_and_defaults() {
        let config = StackConfig::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(config.project, "p");
        assert_eq!(config.network.domain_url, "a.com");
        assert!(!config.network.enable_cloud_armor);
        assert!(!config.network.enable_private_traffic_only);
        assert!(config.network.client_ip_allowlist.is_empty());
        assert!(config.network.api_gateway.is_none());
    }

    #[test]
    fn missing_required_var_is_load_error() {
        for missing in REQUIRED.iter().map(|(k, _)| *k) {
            let vars: Vec<_> = REQUIRED.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = StackConfig::from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(err.is_load());
            assert_eq!(err.field(), Some(missing));
        }
    }

    #[test]
    fn blank_required_var_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[2] = (ENV_BACKEND_IMAGE, "   ");
        let err = StackConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert_eq!(err.field(), Some(ENV_BACKEND_IMAGE));
    }

    #[test]
    fn parses_optional_vars() {
        let mut vars = REQUIRED.to_vec();
        vars.push((ENV_ENABLE_CLOUD_ARMOR, "TRUE"));
        vars.push((ENV_ENABLE_PRIVATE_TRAFFIC_ONLY, "1"));
        vars.push((ENV_CLIENT_IP_ALLOWLIST, "10.0.0.0/8, ,192.168.1.0/24"));
        let config = StackConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert!(config.network.enable_cloud_armor);
        assert!(config.network.enable_private_traffic_only);
        assert_eq!(config.network.client_ip_allowlist, vec!["10.0.0.0/8", "192.168.1.0/24"]);
    }

    #[test]
    fn malformed_bool_is_load_error() {
        let mut vars = REQUIRED.to_vec();
        vars.push((ENV_ENABLE_CLOUD_ARMOR, "maybe"));
        let err = StackConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(err.is_load());
        assert_eq!(err.field(), Some(ENV_ENABLE_CLOUD_ARMOR));
    }
}
