//! # Command Line Interface
//!
//! Builds a stack from a configuration file or the environment and prints
//! the resulting manifest, a validation summary, or the derived resource
//! names.

pub mod output;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

use crate::builders::{FullStackBuilder, FullStackResult};
use crate::config::{LoggingConfig, StackConfig};
use crate::observability::{init_logging, log_stack_info};
use output::{print_output, print_resource_table, OutputFormat};

#[derive(Parser)]
#[command(name = "gcp-fullstack")]
#[command(about = "Build the resource graph for a Cloud Run fullstack deployment")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Stack name, used as the prefix of every resource name
    #[arg(long, global = true, default_value = "app")]
    pub name: String,

    /// Configuration file (YAML, TOML or JSON); the environment is used when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the stack and print its manifest
    Render {
        /// Output format (json or yaml)
        #[arg(short, long, default_value = "yaml")]
        output: String,
    },

    /// Build the stack and report whether the configuration is valid
    Validate,

    /// List the resources the stack would create
    Names,
}

/// Run CLI commands
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig::from_env().with_verbose(cli.verbose);
    init_logging(&logging)?;

    let config = load_config(cli.config.as_ref())?;
    log_stack_info(&cli.name, &config);

    match cli.command {
        Commands::Render { output } => {
            let format: OutputFormat = output.parse()?;
            let result = build(&cli.name, &config)?;
            print_output(&result, format)?;
        }
        Commands::Validate => {
            let result = build(&cli.name, &config)?;
            print_summary(&result);
        }
        Commands::Names => {
            let result = build(&cli.name, &config)?;
            print_resource_table(result.resources());
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<StackConfig> {
    match path {
        Some(path) => StackConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => StackConfig::from_env().context("Failed to load configuration from the environment"),
    }
}

fn build(name: &str, config: &StackConfig) -> anyhow::Result<FullStackResult> {
    FullStackBuilder::new(name, config)
        .build()
        .with_context(|| format!("Failed to build stack '{}'", name))
}

fn print_summary(result: &FullStackResult) {
    println!(
        "{}",
        format!("Stack '{}' is valid: {} resources", result.name(), result.resources().len()).green()
    );
    if let Some(gateway) = result.api_gateway() {
        println!("API Gateway regions: {}", gateway.gateways.len());
    }
    if let Some(policy) = &result.load_balancer().security_policy {
        println!("Security policy: {}", policy);
    }
    for warning in result.warnings() {
        println!("{} {}", "warning:".yellow(), warning);
    }
}
