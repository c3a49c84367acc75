//! # Validation Helpers
//!
//! Format checks shared by the config layer and the builders. Static patterns
//! are compiled once and reused by the `validator` derives.

use lazy_static::lazy_static;
use regex::Regex;
use std::net::IpAddr;
use validator::ValidationError;

use crate::errors::{FullStackError, Result};

lazy_static! {
    /// Project ids: up to 30 lowercase letters, digits and hyphens.
    pub static ref PROJECT_ID_REGEX: Regex = Regex::new(r"^[a-z]([a-z0-9-]{0,28}[a-z0-9])?$")
        .expect("PROJECT_ID_REGEX should be a valid regex pattern");
    /// GCP regions such as `us-central1` or `europe-west4`.
    pub static ref REGION_REGEX: Regex = Regex::new(r"^[a-z]+(-[a-z]+)+[0-9]+$")
        .expect("REGION_REGEX should be a valid regex pattern");
    /// Stack names become the prefix of every resource name.
    pub static ref STACK_NAME_REGEX: Regex = Regex::new(r"^[a-z]([-a-z0-9]*[a-z0-9])?$")
        .expect("STACK_NAME_REGEX should be a valid regex pattern");
    // [registry/]path[:tag][@sha256:digest], no whitespace
    static ref IMAGE_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._\-/:]*(@sha256:[a-f0-9]{64})?$")
            .expect("IMAGE_REGEX should be a valid regex pattern");
    static ref ENV_VAR_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
        .expect("ENV_VAR_REGEX should be a valid regex pattern");
    static ref SECRET_ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,255}$")
        .expect("SECRET_ID_REGEX should be a valid regex pattern");
    static ref SECRET_PATH_REGEX: Regex =
        Regex::new(r"^projects/[a-z0-9-]+/secrets/[A-Za-z0-9_-]{1,255}$")
            .expect("SECRET_PATH_REGEX should be a valid regex pattern");
    static ref LABEL_KEY_REGEX: Regex = Regex::new(r"^[a-z][a-z0-9_-]{0,62}$")
        .expect("LABEL_KEY_REGEX should be a valid regex pattern");
    static ref LABEL_VALUE_REGEX: Regex = Regex::new(r"^[a-z0-9_-]{0,63}$")
        .expect("LABEL_VALUE_REGEX should be a valid regex pattern");
}

/// `validator` hook for `StackConfig::project`
pub fn validate_project_id(project: &str) -> std::result::Result<(), ValidationError> {
    if PROJECT_ID_REGEX.is_match(project) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_project_id")
            .with_message("must be a valid GCP project id".into()))
    }
}

/// `validator` hook for region fields
pub fn validate_region_format(region: &str) -> std::result::Result<(), ValidationError> {
    if REGION_REGEX.is_match(region) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_region").with_message("must be a valid GCP region".into()))
    }
}

/// Validate a stack name used as the resource name prefix
pub fn validate_stack_name(name: &str) -> Result<()> {
    if !STACK_NAME_REGEX.is_match(name) {
        return Err(FullStackError::config_field(
            format!(
                "stack name '{}' must start with a lowercase letter and contain only lowercase letters, digits and hyphens",
                name
            ),
            "name",
        ));
    }
    Ok(())
}

pub fn validate_image(image: &str, field: &str) -> Result<()> {
    if image.trim().is_empty() {
        return Err(FullStackError::config_field(format!("{} is required", field), field));
    }
    if !IMAGE_REGEX.is_match(image) {
        return Err(FullStackError::config_field(
            format!("{} '{}' is not a valid container image reference", field, image),
            field,
        ));
    }
    Ok(())
}

pub fn validate_region(region: &str, field: &str) -> Result<()> {
    if region.trim().is_empty() {
        return Err(FullStackError::config_field(format!("{} is required", field), field));
    }
    if !REGION_REGEX.is_match(region) {
        return Err(FullStackError::config_field(
            format!("{} '{}' is not a valid GCP region", field, region),
            field,
        ));
    }
    Ok(())
}

pub fn validate_env_var_name(name: &str, field: &str) -> Result<()> {
    if !ENV_VAR_REGEX.is_match(name) {
        return Err(FullStackError::config_field(
            format!("'{}' is not a valid environment variable name", name),
            field,
        ));
    }
    Ok(())
}

/// Accepts a bare secret id or a full `projects/{project}/secrets/{id}` path
pub fn validate_secret_reference(secret: &str, field: &str) -> Result<()> {
    if SECRET_ID_REGEX.is_match(secret) || SECRET_PATH_REGEX.is_match(secret) {
        return Ok(());
    }
    Err(FullStackError::config_field(
        format!("'{}' is not a valid Secret Manager secret reference", secret),
        field,
    ))
}

pub fn validate_label(key: &str, value: &str) -> Result<()> {
    if !LABEL_KEY_REGEX.is_match(key) {
        return Err(FullStackError::config_field(format!("invalid label key '{}'", key), "labels"));
    }
    if !LABEL_VALUE_REGEX.is_match(value) {
        return Err(FullStackError::config_field(
            format!("invalid value '{}' for label '{}'", value, key),
            "labels",
        ));
    }
    Ok(())
}

/// Parse and normalise a CIDR block. A bare address is treated as a host
/// route (`/32` or `/128`).
pub fn parse_cidr(value: &str) -> Result<String> {
    let value = value.trim();
    let invalid = || {
        FullStackError::config_field(
            format!("'{}' is not a valid CIDR range", value),
            "network.client_ip_allowlist",
        )
    };

    let (addr, prefix) = match value.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (value, None),
    };
    let ip: IpAddr = addr.parse().map_err(|_| invalid())?;
    let max_prefix = if ip.is_ipv4() { 32 } else { 128 };
    let prefix = match prefix {
        Some(prefix) => prefix.parse::<u8>().map_err(|_| invalid())?,
        None => max_prefix,
    };
    if prefix > max_prefix {
        return Err(invalid());
    }

    Ok(format!("{}/{}", ip, prefix))
}

/// Extract the host from a bare domain or an `http(s)://` URL
pub fn domain_host(domain_url: &str) -> Result<String> {
    let field = "network.domain_url";
    let trimmed = domain_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(FullStackError::config_field("domain URL is required", field));
    }

    let host = if trimmed.contains("://") {
        let url = url::Url::parse(trimmed).map_err(|e| {
            FullStackError::config_field(format!("invalid domain URL '{}': {}", domain_url, e), field)
        })?;
        url.host_str().map(str::to_string)
    } else {
        Some(trimmed.to_string())
    };

    match host.as_deref().map(url::Host::parse) {
        Some(Ok(url::Host::Domain(domain))) if domain.contains('.') => Ok(domain.to_lowercase()),
        _ => Err(FullStackError::config_field(
            format!("'{}' must be a fully qualified domain name for a managed certificate", domain_url),
            field,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_names() {
        assert!(validate_stack_name("shop").is_ok());
        assert!(validate_stack_name("shop-prod-1").is_ok());
        assert!(validate_stack_name("Shop").is_err());
        assert!(validate_stack_name("1shop").is_err());
        assert!(validate_stack_name("shop-").is_err());
        assert!(validate_stack_name("").is_err());
    }

    #[test]
    fn images() {
        assert!(validate_image("img-b", "backend_image").is_ok());
        assert!(validate_image("us-docker.pkg.dev/p/repo/api:1.2.3", "backend_image").is_ok());
        let err = validate_image("", "backend_image").unwrap_err();
        assert_eq!(err.field(), Some("backend_image"));
        assert!(validate_image("my image", "backend_image").is_err());
    }

    #[test]
    fn regions() {
        assert!(validate_region("us-central1", "region").is_ok());
        assert!(validate_region("europe-west4", "region").is_ok());
        assert!(validate_region("northamerica-northeast1", "region").is_ok());
        assert!(validate_region("central", "region").is_err());
        assert!(validate_region("", "region").is_err());
    }

    #[test]
    fn cidrs_are_normalised() {
        assert_eq!(parse_cidr("10.0.0.0/8").unwrap(), "10.0.0.0/8");
        assert_eq!(parse_cidr(" 203.0.113.7 ").unwrap(), "203.0.113.7/32");
        assert_eq!(parse_cidr("2001:db8::/32").unwrap(), "2001:db8::/32");
        assert!(parse_cidr("10.0.0.0/33").is_err());
        assert!(parse_cidr("10.0.0/8").is_err());
        assert!(parse_cidr("not-an-ip").is_err());
    }

    #[test]
    fn domains() {
        assert_eq!(domain_host("a.com").unwrap(), "a.com");
        assert_eq!(domain_host("https://App.Example.com/").unwrap(), "app.example.com");
        assert!(domain_host("").is_err());
        assert!(domain_host("localhost").is_err());
        assert!(domain_host("10.0.0.1").is_err());
    }

    #[test]
    fn secrets_and_env_names() {
        assert!(validate_secret_reference("db-password", "secrets").is_ok());
        assert!(validate_secret_reference("projects/p-123/secrets/db", "secrets").is_ok());
        assert!(validate_secret_reference("db password", "secrets").is_err());
        assert!(validate_env_var_name("DATABASE_URL", "env").is_ok());
        assert!(validate_env_var_name("1BAD", "env").is_err());
    }

    #[test]
    fn project_ids() {
        assert!(validate_project_id("my-project-123").is_ok());
        assert!(validate_project_id("p").is_ok());
        assert!(validate_project_id("").is_err());
        assert!(validate_project_id("project-").is_err());
        assert!(validate_project_id("My-Project").is_err());
    }

    #[test]
    fn labels() {
        assert!(validate_label("team", "platform").is_ok());
        assert!(validate_label("Team", "platform").is_err());
        assert!(validate_label("team", "Platform").is_err());
    }
}
