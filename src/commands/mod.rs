//! CLI command definitions and dispatch.

pub mod collect;
pub mod config;
pub mod define_domain;
pub mod pre_cloud_init;
pub mod shutdown;
pub mod sidecars;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use vmhooks_core::config::AppConfig;
use vmhooks_core::AppResult;
use vmhooks_core::error::{AppError, ErrorKind};
use vmhooks_manager::HookManager;

use crate::output::OutputFormat;

/// vmhooks: hook sidecar orchestration for VM definition
#[derive(Debug, Parser)]
#[command(name = "vmhooks", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/vmhooks.toml")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Override the shared socket directory
    #[arg(long, global = true)]
    pub socket_dir: Option<PathBuf>,

    /// Override the number of sidecars to wait for
    #[arg(long, global = true)]
    pub expected: Option<usize>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover sidecars and print the ordering index
    Collect(collect::CollectArgs),
    /// Run a domain definition through the OnDefineDomain chain
    DefineDomain(define_domain::DefineDomainArgs),
    /// Run first-boot data through the PreCloudInitIso chain
    PreCloudInit(pre_cloud_init::PreCloudInitArgs),
    /// Ask every sidecar to terminate
    Shutdown,
    /// Parse the sidecar descriptor annotation
    Sidecars(sidecars::SidecarsArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> AppResult<()> {
        let config = self.load_config()?;
        vmhooks_core::logging::init(&config.logging);

        match &self.command {
            Commands::Collect(args) => collect::execute(args, &config, self.format).await,
            Commands::DefineDomain(args) => define_domain::execute(args, &config).await,
            Commands::PreCloudInit(args) => pre_cloud_init::execute(args, &config).await,
            Commands::Shutdown => shutdown::execute(&config).await,
            Commands::Sidecars(args) => sidecars::execute(args, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, &config, self.format).await,
        }
    }

    /// Loads the configuration file and applies command-line overrides.
    pub fn load_config(&self) -> AppResult<AppConfig> {
        let mut config = AppConfig::load(&self.config)?;
        if let Some(dir) = &self.socket_dir {
            config.hooks.socket_dir = dir.clone();
            config.sidecar.socket_dir = dir.clone();
        }
        if let Some(expected) = self.expected {
            config.hooks.expected_sidecars = expected;
        }
        Ok(config)
    }
}

/// Helper: discover sidecars with the hooks section
pub async fn collect_manager(config: &AppConfig) -> AppResult<HookManager> {
    tracing::info!(
        dir = %config.hooks.socket_dir.display(),
        expected = config.hooks.expected_sidecars,
        "Collecting hook sidecars"
    );
    Ok(HookManager::collect(&config.hooks).await?)
}

/// Helper: read and parse a JSON file
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let raw = read_file(path).await?;
    serde_json::from_slice(&raw)
        .map_err(|e| AppError::validation(format!("Invalid JSON in '{}': {}", path.display(), e)))
}

/// Helper: read a file
pub async fn read_file(path: &Path) -> AppResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        AppError::with_source(ErrorKind::Io, format!("Failed to read '{}'", path.display()), e)
    })
}

/// Helper: write to a file, or stdout when no path is given
pub async fn write_output(path: Option<&Path>, bytes: &[u8]) -> AppResult<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, bytes).await?;
            crate::output::print_success(&format!("Written to '{}'", path.display()));
        }
        None => {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(bytes).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
