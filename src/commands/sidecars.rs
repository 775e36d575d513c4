//! Sidecar list command: parses the descriptor annotation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Args;
use vmhooks_core::AppResult;
use vmhooks_manager::SidecarList;

use crate::output::{self, OutputFormat, SidecarRow};

/// Arguments for the sidecars command
#[derive(Debug, Args)]
pub struct SidecarsArgs {
    /// Annotations file: a JSON object of annotation key to value
    #[arg(long)]
    pub annotations: PathBuf,
}

/// Execute the sidecars command
pub async fn execute(args: &SidecarsArgs, format: OutputFormat) -> AppResult<()> {
    let list = load_list(&args.annotations).await?;
    output::print_list(&SidecarRow::from_list(&list), format);
    Ok(())
}

/// Reads the sidecar list from an annotations file.
pub async fn load_list(path: &Path) -> AppResult<SidecarList> {
    let annotations: HashMap<String, String> = super::read_json(path).await?;
    Ok(SidecarList::from_annotations(&annotations)?)
}
