//! Domain definition command: runs a definition file through the chain.

use std::path::PathBuf;

use clap::Args;
use serde_json::Value;
use vmhooks_core::config::AppConfig;
use vmhooks_core::AppResult;

/// Arguments for the define-domain command
#[derive(Debug, Args)]
pub struct DefineDomainArgs {
    /// Domain definition file
    #[arg(long)]
    pub domain: PathBuf,

    /// VM descriptor file (JSON)
    #[arg(long)]
    pub vmi: PathBuf,

    /// Where to write the final definition (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the define-domain command
pub async fn execute(args: &DefineDomainArgs, config: &AppConfig) -> AppResult<()> {
    let domain_xml = super::read_file(&args.domain).await?;
    let vmi: Value = super::read_json(&args.vmi).await?;

    let manager = super::collect_manager(config).await?;
    let result = manager.on_define_domain(&domain_xml, &vmi).await?;

    tracing::info!(
        before = domain_xml.len(),
        after = result.len(),
        "Domain definition processed"
    );

    super::write_output(args.output.as_deref(), &result).await
}
