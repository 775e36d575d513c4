//! Discovery command: resolves the expected sidecars and prints the index.

use std::path::PathBuf;

use clap::Args;
use vmhooks_core::config::AppConfig;
use vmhooks_core::AppResult;

use crate::output::{self, IndexRow, OutputFormat};

/// Arguments for the collect command
#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Annotations file (JSON object); the sidecar list sets the expected count
    #[arg(long)]
    pub annotations: Option<PathBuf>,

    /// Print the resolved plugins instead of the ordering index
    #[arg(long)]
    pub plugins: bool,
}

/// Execute the collect command
pub async fn execute(args: &CollectArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let mut config = config.clone();
    if let Some(path) = &args.annotations {
        let list = super::sidecars::load_list(path).await?;
        config.hooks.expected_sidecars = list.len();
    }

    let manager = super::collect_manager(&config).await?;
    let index = manager.index();

    if args.plugins {
        let summaries: Vec<_> = index.plugins().iter().map(|p| p.summary()).collect();
        output::print_item(&summaries, format);
        return Ok(());
    }

    output::print_list(&IndexRow::from_index(index), format);
    if format == OutputFormat::Table {
        output::print_kv("Plugins", &index.plugin_count().to_string());
    }
    Ok(())
}
