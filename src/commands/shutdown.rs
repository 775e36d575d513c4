//! Shutdown command.

use vmhooks_core::config::AppConfig;
use vmhooks_core::AppResult;
use vmhooks_manager::HookName;

use crate::output;

/// Execute the shutdown command
pub async fn execute(config: &AppConfig) -> AppResult<()> {
    let manager = super::collect_manager(config).await?;
    let count = manager.index().handler_count(HookName::Shutdown);

    manager.shutdown().await?;

    output::print_success(&format!("Shutdown sent to {} sidecar(s)", count));
    Ok(())
}
