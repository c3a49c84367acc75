//! File loader for [`StackConfig`]. The format is picked from the extension:
//! `.yaml`/`.yml`, `.toml` or `.json`.

use std::path::Path;

use super::stack::StackConfig;
use crate::errors::{FullStackError, Result};

impl StackConfig {
    /// Read a stack configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FullStackError::load_with_source(
                format!("failed to read stack configuration {}", path.display()),
                Box::new(e),
            )
        })?;

        let extension =
            path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).unwrap_or_default();
        let config = match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&contents)?,
            "toml" => toml::from_str(&contents)?,
            "json" => serde_json::from_str(&contents).map_err(|e| {
                FullStackError::load_with_source("Failed to parse JSON stack configuration", Box::new(e))
            })?,
            other => {
                return Err(FullStackError::load_with_source(
                    format!("unsupported stack configuration format '{}'", other),
                    format!("expected .yaml, .yml, .toml or .json: {}", path.display()).into(),
                ))
            }
        };

        tracing::debug!(path = %path.display(), "loaded stack configuration file");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_yaml() {
        let file = write_temp(
            ".yaml",
            "project: p\nregion: us-central1\nbackend_image: img-b\nfrontend_image: img-f\nnetwork:\n  domain_url: a.com\n",
        );
        let config = StackConfig::from_file(file.path()).unwrap();
        assert_eq!(config.backend_image, "img-b");
        assert_eq!(config.network.domain_url, "a.com");
    }

    #[test]
    fn loads_toml() {
        let file = write_temp(
            ".toml",
            r#"
project = "p"
region = "us-central1"
backend_image = "img-b"
frontend_image = "img-f"

[network]
domain_url = "a.com"
enable_cloud_armor = true
client_ip_allowlist = ["10.0.0.0/8"]

[labels]
team = "web"
"#,
        );
        let config = StackConfig::from_file(file.path()).unwrap();
        assert!(config.network.enable_cloud_armor);
        assert_eq!(config.labels.get("team").map(String::as_str), Some("web"));
    }

    #[test]
    fn unknown_extension_is_load_error() {
        let file = write_temp(".ini", "project = p");
        assert!(StackConfig::from_file(file.path()).unwrap_err().is_load());
    }

    #[test]
    fn missing_file_is_load_error() {
        let err = StackConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(err.is_load());
    }

    #[test]
    fn malformed_yaml_is_load_error() {
        let file = write_temp(".yaml", "project: [unterminated");
        assert!(StackConfig::from_file(file.path()).unwrap_err().is_load());
    }
}
