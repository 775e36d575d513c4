//! Configuration management CLI commands.

use std::path::Path;

use clap::{Args, Subcommand};
use vmhooks_core::config::AppConfig;
use vmhooks_core::AppResult;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &Path,
    config: &AppConfig,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        ConfigCommand::Show => {
            output::print_item(config, format);
        }
        ConfigCommand::Validate => {
            output::print_success(&format!("Configuration '{}' is valid", config_path.display()));
            output::print_kv("Socket dir", &config.hooks.socket_dir.display().to_string());
            output::print_kv("Expected sidecars", &config.hooks.expected_sidecars.to_string());
            output::print_kv(
                "Collect timeout",
                &format!("{}s", config.hooks.collect_timeout_seconds),
            );
            output::print_kv(
                "Callback timeout",
                &format!("{}s", config.hooks.callback_timeout_seconds),
            );
            output::print_kv("Log level", &config.logging.level);
        }
    }

    Ok(())
}
