//! # Observability
//!
//! Structured logging for stack builds. Builders log through `tracing`; the
//! CLI installs a `tracing-subscriber` formatter driven by [`LoggingConfig`].
//!
//! [`LoggingConfig`]: crate::config::LoggingConfig

pub mod logging;

pub use logging::{init_logging, log_stack_info};
