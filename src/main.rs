//! vmhooks: drive hook sidecars from the command line.
//!
//! Discovers the sidecars in the shared socket directory and runs the
//! definition and first-boot chains against files on disk.

use clap::Parser;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
