//! # Structured Logging
//!
//! Span macros and subscriber setup using the tracing ecosystem. The library
//! only emits events; installing a subscriber is left to the binary.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::errors::{FullStackError, Result};

/// Create a tracing span for one stack build.
///
/// ```rust,ignore
/// let span = build_span!("shop", project = "my-project");
/// ```
#[macro_export]
macro_rules! build_span {
    ($stack:expr) => {
        tracing::info_span!("stack_build", stack = %$stack)
    };
    ($stack:expr, $($field:tt)*) => {
        tracing::info_span!("stack_build", stack = %$stack, $($field)*)
    };
}

/// Create a tracing span for one sub-builder (service, secrets, network)
#[macro_export]
macro_rules! component_span {
    ($component:expr, $name:expr) => {
        tracing::debug_span!("component_build", component = %$component, resource = %$name)
    };
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| FullStackError::config(format!("invalid log level '{}': {}", config.log_level, e)))?;

    let builder = fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr);
    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = installed {
        // A global subscriber is already set, as in integration tests.
        tracing::debug!(error = %e, "logging already initialised");
    }
    Ok(())
}

/// Log the stack configuration at startup
pub fn log_stack_info(name: &str, config: &crate::config::StackConfig) {
    tracing::info!(
        stack = %name,
        project = %config.project,
        region = %config.region,
        domain = %config.network.domain_url,
        cloud_armor = config.network.enable_cloud_armor,
        allowlist_entries = config.network.client_ip_allowlist.len(),
        private_traffic_only = config.network.enable_private_traffic_only,
        api_gateway = config.network.enabled_gateway().is_some(),
        "Fullstack configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        let _span = build_span!("shop");
        let _span = build_span!("shop", project = "p");
        let _span = component_span!("service", "shop-backend");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging(&config).is_ok());
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_log_stack_info() {
        let config = crate::config::StackConfig::new("p", "us-central1", "b", "f", "a.com");
        // This should not panic
        log_stack_info("shop", &config);
    }
}
