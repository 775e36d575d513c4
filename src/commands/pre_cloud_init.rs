//! First-boot data command: runs a CloudInitData file through the chain.

use std::path::PathBuf;

use clap::Args;
use serde_json::Value;
use vmhooks_core::config::AppConfig;
use vmhooks_core::AppResult;
use vmhooks_manager::CloudInitData;

/// Arguments for the pre-cloud-init command
#[derive(Debug, Args)]
pub struct PreCloudInitArgs {
    /// First-boot data file (JSON CloudInitData)
    #[arg(long)]
    pub data: PathBuf,

    /// VM descriptor file (JSON)
    #[arg(long)]
    pub vmi: PathBuf,

    /// Where to write the final data (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the pre-cloud-init command
pub async fn execute(args: &PreCloudInitArgs, config: &AppConfig) -> AppResult<()> {
    let data: CloudInitData = super::read_json(&args.data).await?;
    let vmi: Value = super::read_json(&args.vmi).await?;

    let manager = super::collect_manager(config).await?;
    let result = manager.pre_cloud_init_iso(data, &vmi).await?;

    let mut rendered = serde_json::to_vec_pretty(&result)?;
    rendered.push(b'\n');
    super::write_output(args.output.as_deref(), &rendered).await
}
