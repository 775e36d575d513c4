//! Hook dispatcher: runs the ordered plugins of one hook point.
//!
//! - [`HookDispatcher::fold`] threads a value through every plugin in order.
//!   The first failure aborts the chain and the partially transformed value
//!   is dropped.
//! - [`HookDispatcher::fan_out`] calls every plugin regardless of individual
//!   failures and reports the first one.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::definitions::HookName;
use super::registry::{HookEntry, OrderingIndex};
use crate::error::HookError;
use crate::registry::ResolvedPlugin;

/// Dispatches one hook point over its ordered plugins.
#[derive(Debug, Clone, Copy)]
pub struct HookDispatcher<'a> {
    hook: HookName,
    entries: &'a [HookEntry],
}

impl<'a> HookDispatcher<'a> {
    /// Creates a dispatcher for `hook` over the plugins registered in `index`.
    pub fn new(index: &'a OrderingIndex, hook: HookName) -> Self {
        Self {
            hook,
            entries: index.get(hook),
        }
    }

    /// Hook point being dispatched.
    pub fn hook(&self) -> HookName {
        self.hook
    }

    /// Number of plugins in the chain.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Composes `link` over every plugin, feeding each output to the next.
    ///
    /// An empty chain returns `input` unchanged.
    pub async fn fold<T, F, Fut>(&self, input: T, mut link: F) -> Result<T, HookError>
    where
        F: FnMut(Arc<ResolvedPlugin>, T) -> Fut,
        Fut: Future<Output = Result<T, HookError>>,
    {
        if self.entries.is_empty() {
            return Ok(input);
        }

        info!(hook = %self.hook, plugins = self.entries.len(), "Running hook chain");

        let mut current = input;
        for (position, entry) in self.entries.iter().enumerate() {
            debug!(
                hook = %self.hook,
                position = position,
                plugin = %entry.plugin.name(),
                priority = entry.priority,
                "Calling hook plugin"
            );

            current = match link(Arc::clone(&entry.plugin), current).await {
                Ok(next) => next,
                Err(e) => {
                    error!(
                        hook = %self.hook,
                        position = position,
                        plugin = %entry.plugin.name(),
                        socket = %entry.plugin.socket_path().display(),
                        error = %e,
                        "Hook chain aborted"
                    );
                    return Err(e);
                }
            };
        }

        info!(hook = %self.hook, "Hook chain completed");
        Ok(current)
    }

    /// Calls `call` on every plugin and returns the first failure, if any.
    pub async fn fan_out<F, Fut>(&self, mut call: F) -> Result<(), HookError>
    where
        F: FnMut(Arc<ResolvedPlugin>) -> Fut,
        Fut: Future<Output = Result<(), HookError>>,
    {
        let mut first_error = None;

        for entry in self.entries {
            debug!(hook = %self.hook, plugin = %entry.plugin.name(), "Notifying hook plugin");
            if let Err(e) = call(Arc::clone(&entry.plugin)).await {
                warn!(
                    hook = %self.hook,
                    plugin = %entry.plugin.name(),
                    error = %e,
                    "Hook plugin failed, continuing"
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
