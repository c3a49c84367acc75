//! CORS policy resolution for the API Gateway config.
//!
//! Absent and empty lists are treated the same way: both fall back to the
//! permissive defaults below.

use http::{HeaderName, Method};

use crate::config::ApiConfig;
use crate::errors::{FullStackError, Result};
use crate::graph::CorsPolicy;

pub const WILDCARD: &str = "*";

pub const DEFAULT_ALLOWED_METHODS: [&str; 7] =
    ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD"];

const FIELD: &str = "network.api_gateway.config";

/// Resolve the CORS policy, or `None` when CORS is disabled
pub fn resolve_cors(config: &ApiConfig) -> Result<Option<CorsPolicy>> {
    if !config.enable_cors {
        return Ok(None);
    }

    let allowed_origins = or_default(&config.cors_allowed_origins, || vec![WILDCARD.to_string()]);
    let allowed_methods = or_default(&config.cors_allowed_methods, || {
        DEFAULT_ALLOWED_METHODS.iter().map(|m| m.to_string()).collect()
    });
    let allowed_headers = or_default(&config.cors_allowed_headers, || vec![WILDCARD.to_string()]);

    for origin in &allowed_origins {
        validate_origin(origin)?;
    }
    let allowed_methods = allowed_methods
        .iter()
        .map(|method| normalize_method(method))
        .collect::<Result<Vec<_>>>()?;
    for header in &allowed_headers {
        validate_header(header)?;
    }

    if config.cors_allow_credentials && allowed_origins.iter().any(|o| o == WILDCARD) {
        return Err(FullStackError::config_field(
            "cors_allow_credentials requires explicit origins; '*' is not allowed with credentials",
            format!("{}.cors_allowed_origins", FIELD),
        ));
    }

    Ok(Some(CorsPolicy {
        allowed_origins,
        allowed_methods,
        allowed_headers,
        allow_credentials: config.cors_allow_credentials,
        max_age_seconds: config.cors_max_age_seconds,
    }))
}

fn or_default(values: &Option<Vec<String>>, default: impl FnOnce() -> Vec<String>) -> Vec<String> {
    match values {
        Some(values) if !values.is_empty() => values.clone(),
        _ => default(),
    }
}

fn validate_origin(origin: &str) -> Result<()> {
    if origin == WILDCARD {
        return Ok(());
    }
    let parsed = url::Url::parse(origin).map_err(|e| {
        FullStackError::config_field(
            format!("invalid CORS origin '{}': {}", origin, e),
            format!("{}.cors_allowed_origins", FIELD),
        )
    })?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(FullStackError::config_field(
            format!("CORS origin '{}' must be an http(s) origin", origin),
            format!("{}.cors_allowed_origins", FIELD),
        ));
    }
    Ok(())
}

fn normalize_method(method: &str) -> Result<String> {
    let upper = method.trim().to_ascii_uppercase();
    if upper == WILDCARD {
        return Ok(upper);
    }
    Method::from_bytes(upper.as_bytes()).map(|m| m.as_str().to_string()).map_err(|_| {
        FullStackError::config_field(
            format!("'{}' is not a valid HTTP method", method),
            format!("{}.cors_allowed_methods", FIELD),
        )
    })
}

fn validate_header(header: &str) -> Result<()> {
    if header == WILDCARD {
        return Ok(());
    }
    HeaderName::from_bytes(header.as_bytes()).map(|_| ()).map_err(|_| {
        FullStackError::config_field(
            format!("'{}' is not a valid HTTP header name", header),
            format!("{}.cors_allowed_headers", FIELD),
        )
    })
}
