//! Integration tests for configuration loading
//!
//! These tests read stack configuration from the process environment and
//! from files, then build the stack from the loaded value.

use gcp_fullstack::config::env::{
    ENV_BACKEND_IMAGE, ENV_CLIENT_IP_ALLOWLIST, ENV_DOMAIN_URL, ENV_ENABLE_CLOUD_ARMOR,
    ENV_ENABLE_PRIVATE_TRAFFIC_ONLY, ENV_FRONTEND_IMAGE, ENV_GCP_PROJECT, ENV_GCP_REGION,
};
use gcp_fullstack::{build_fullstack, Result, StackConfig};
use std::env;
use std::io::Write;
use std::sync::Mutex;

// Use a mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ALL_VARS: [&str; 8] = [
    ENV_GCP_PROJECT,
    ENV_GCP_REGION,
    ENV_BACKEND_IMAGE,
    ENV_FRONTEND_IMAGE,
    ENV_DOMAIN_URL,
    ENV_ENABLE_CLOUD_ARMOR,
    ENV_CLIENT_IP_ALLOWLIST,
    ENV_ENABLE_PRIVATE_TRAFFIC_ONLY,
];

/// Run `test` with the given variables set and every other stack variable
/// removed, restoring the original environment afterwards
fn with_env<T>(vars: &[(&str, &str)], test: impl FnOnce() -> T) -> T {
    let _guard = ENV_MUTEX.lock().unwrap();

    let original: Vec<(&str, Option<String>)> =
        ALL_VARS.iter().map(|key| (*key, env::var(key).ok())).collect();
    for key in ALL_VARS {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let result = test();

    for (key, value) in original {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
    result
}

fn required_vars() -> Vec<(&'static str, &'static str)> {
    vec![
        (ENV_GCP_PROJECT, "p"),
        (ENV_GCP_REGION, "us-central1"),
        (ENV_BACKEND_IMAGE, "img-b"),
        (ENV_FRONTEND_IMAGE, "img-f"),
        (ENV_DOMAIN_URL, "a.com"),
    ]
}

#[test]
fn test_env_config_with_defaults() -> Result<()> {
    let config = with_env(&required_vars(), StackConfig::from_env)?;

    assert_eq!(config.project, "p");
    assert_eq!(config.network.domain_url, "a.com");
    assert!(!config.network.enable_cloud_armor);
    assert!(!config.network.enable_private_traffic_only);
    assert!(config.network.client_ip_allowlist.is_empty());

    let result = build_fullstack("shop", &config)?;
    assert_eq!(result.load_balancer().url_map, "shop-lb");
    Ok(())
}

#[test]
fn test_env_config_optional_values() -> Result<()> {
    let mut vars = required_vars();
    vars.push((ENV_ENABLE_CLOUD_ARMOR, "true"));
    vars.push((ENV_CLIENT_IP_ALLOWLIST, "10.0.0.0/8, 192.168.0.1"));
    let config = with_env(&vars, StackConfig::from_env)?;

    assert!(config.network.enable_cloud_armor);
    assert_eq!(config.network.client_ip_allowlist, vec!["10.0.0.0/8", "192.168.0.1"]);

    let result = build_fullstack("shop", &config)?;
    assert_eq!(result.load_balancer().security_policy.as_deref(), Some("shop-armor"));
    Ok(())
}

#[test]
fn test_env_config_missing_variable() {
    let vars: Vec<_> =
        required_vars().into_iter().filter(|(key, _)| *key != ENV_DOMAIN_URL).collect();
    let err = with_env(&vars, StackConfig::from_env).unwrap_err();
    assert!(err.is_load());
    assert!(err.to_string().contains(ENV_DOMAIN_URL));
}

#[test]
fn test_env_config_invalid_bool() {
    let mut vars = required_vars();
    vars.push((ENV_ENABLE_PRIVATE_TRAFFIC_ONLY, "maybe"));
    let err = with_env(&vars, StackConfig::from_env).unwrap_err();
    assert!(err.is_load());
}

#[test]
fn test_file_config_builds_gateway_stack() -> Result<()> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
project = "p"
region = "us-central1"
backend_image = "gcr.io/p/api:1.2.0"
frontend_image = "gcr.io/p/web:1.2.0"

[labels]
team = "web"

[network]
domain_url = "https://shop.example.com"
client_ip_allowlist = ["203.0.113.0/24"]

[network.api_gateway]
enabled = true
regions = ["us-central1", "us-east1"]

[network.api_gateway.config]
openapi_spec_path = "openapi.yaml"
cors_allowed_origins = ["https://shop.example.com"]

[network.api_gateway.config.backend]
paths = ["/api/*", "/healthz"]

[network.api_gateway.config.backend.jwt_auth]

[[backend.secrets]]
secret = "db-password"
env_var = "DB_PASSWORD"
"#
    )
    .unwrap();

    let config = StackConfig::from_file(file.path())?;
    let result = build_fullstack("shop", &config)?;

    let gateway = result.api_gateway().expect("gateway enabled");
    assert_eq!(gateway.gateways.len(), 2);
    assert_eq!(gateway.routed_paths, vec!["/api/*", "/healthz"]);
    assert_eq!(result.load_balancer().security_policy.as_deref(), Some("shop-fw-allowlist"));
    assert!(result.graph().contains("shop-secrets-backend-db-password"));
    Ok(())
}

#[test]
fn test_file_config_unknown_extension() {
    let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
    let err = StackConfig::from_file(file.path()).unwrap_err();
    assert!(err.is_load());
}
