//! Output formatting for CLI commands
//!
//! Manifests are printed as JSON or YAML; resource listings as a plain table.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::graph::Resource;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => anyhow::bail!("Unsupported output format: '{}'. Use 'json' or 'yaml'.", s),
        }
    }
}

/// Serialize data in the requested format
pub fn render<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(data).context("Failed to serialize to JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(data).context("Failed to serialize to YAML"),
    }
}

/// Print data in the requested format
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    println!("{}", render(data, format)?);
    Ok(())
}

/// Truncate string to maximum length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One line per resource: logical name, then provider type
pub fn resource_rows(resources: &[Resource], name_width: usize) -> Vec<String> {
    resources
        .iter()
        .map(|r| format!("{:<width$} {}", truncate(&r.name, name_width), r.type_token, width = name_width))
        .collect()
}

pub fn print_resource_table(resources: &[Resource]) {
    let name_width = resources.iter().map(|r| r.name.len()).max().unwrap_or(4).clamp(4, 63);

    println!();
    println!("{:<width$} TYPE", "NAME", width = name_width);
    println!("{}", "-".repeat(name_width + 1 + 4));
    for row in resource_rows(resources, name_width) {
        println!("{}", row);
    }
}
