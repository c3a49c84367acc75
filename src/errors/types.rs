//! # Error Types
//!
//! Error types for stack construction using `thiserror`.

/// Custom result type for fullstack operations
pub type Result<T> = std::result::Result<T, FullStackError>;

/// Main error type for building a fullstack resource graph
#[derive(thiserror::Error, Debug)]
pub enum FullStackError {
    /// Invalid or conflicting stack configuration, surfaced at build time
    #[error("Configuration error: {message}")]
    Config { message: String, field: Option<String> },

    /// Loading configuration from the environment or a file failed
    #[error("Load error: {message}")]
    Load {
        message: String,
        variable: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },

    /// Graph invariants broken by the builder itself
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FullStackError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), field: None }
    }

    /// Create a configuration error pointing at a config field
    pub fn config_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Config { message: message.into(), field: Some(field.into()) }
    }

    /// Create a load error for a missing or malformed environment variable
    pub fn load_var<S: Into<String>, V: Into<String>>(message: S, variable: V) -> Self {
        Self::Load { message: message.into(), variable: Some(variable.into()), source: None }
    }

    /// Create a load error with source
    pub fn load_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Load { message: message.into(), variable: None, source: Some(source) }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// The config field or environment variable this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            FullStackError::Config { field, .. } => field.as_deref(),
            FullStackError::Load { variable, .. } => variable.as_deref(),
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, FullStackError::Config { .. })
    }

    pub fn is_load(&self) -> bool {
        matches!(self, FullStackError::Load { .. })
    }
}

impl From<serde_json::Error> for FullStackError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization { source: error, context: "JSON serialization failed".to_string() }
    }
}

impl From<serde_yaml::Error> for FullStackError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::load_with_source("Failed to parse YAML stack configuration", Box::new(error))
    }
}

impl From<toml::de::Error> for FullStackError {
    fn from(error: toml::de::Error) -> Self {
        Self::load_with_source("Failed to parse TOML stack configuration", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for FullStackError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut entries = Vec::new();
        collect_validation_errors("", &errors, &mut entries);
        entries.sort();

        let field = entries.first().map(|(field, _)| field.clone());
        let message =
            entries.iter().map(|(field, msg)| format!("{}: {}", field, msg)).collect::<Vec<_>>();

        Self::Config { message: format!("Validation failed: {}", message.join("; ")), field }
    }
}

/// Flatten nested validator output into `(dotted.path, message)` pairs.
fn collect_validation_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<(String, String)>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map_or_else(|| "Invalid value".to_string(), |m| m.to_string());
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "must not be empty"))]
        image: String,
        #[validate(nested)]
        limits: Limits,
    }

    #[derive(Validate)]
    struct Limits {
        #[validate(range(min = 1, message = "must be at least 1"))]
        max_instances: u32,
    }

    #[test]
    fn test_error_creation() {
        let error = FullStackError::config("backend image is required");
        assert!(error.is_config());
        assert_eq!(error.to_string(), "Configuration error: backend image is required");
    }

    #[test]
    fn test_config_field() {
        let error = FullStackError::config_field("duplicate env var", "backend.secrets");
        assert_eq!(error.field(), Some("backend.secrets"));
    }

    #[test]
    fn test_load_error() {
        let error = FullStackError::load_var("missing required variable", "GCP_PROJECT");
        assert!(error.is_load());
        assert!(!error.is_config());
        assert_eq!(error.field(), Some("GCP_PROJECT"));
    }

    #[test]
    fn test_validation_errors_map_to_config() {
        let probe = Probe { image: String::new(), limits: Limits { max_instances: 1 } };
        let error: FullStackError = probe.validate().unwrap_err().into();
        assert!(error.is_config());
        assert_eq!(error.field(), Some("image"));
        assert!(error.to_string().contains("image: must not be empty"));
    }

    #[test]
    fn test_nested_validation_errors_use_dotted_path() {
        let probe = Probe { image: "img".to_string(), limits: Limits { max_instances: 0 } };
        let error: FullStackError = probe.validate().unwrap_err().into();
        assert_eq!(error.field(), Some("limits.max_instances"));
        assert!(error.to_string().contains("must be at least 1"));
    }

    #[test]
    fn test_error_conversions() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error: FullStackError = json_error.into();
        assert!(matches!(error, FullStackError::Serialization { .. }));
    }
}
