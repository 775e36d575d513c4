//! Ordering index: hook point → deterministically ordered plugins.
//!
//! Built once after every expected socket is resolved and never re-sorted.
//! Within a hook point, plugins run by priority descending, then name
//! ascending, then socket path ascending.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::definitions::HookName;
use crate::registry::ResolvedPlugin;

/// Entry in the ordering index.
#[derive(Debug, Clone)]
pub struct HookEntry {
    /// The plugin.
    pub plugin: Arc<ResolvedPlugin>,
    /// Priority the plugin declared for this hook point.
    pub priority: i32,
}

/// Per-hook-point ordered plugin lists.
#[derive(Debug, Default)]
pub struct OrderingIndex {
    /// Hook point → sorted entries.
    entries: HashMap<HookName, Vec<HookEntry>>,
    /// Every resolved plugin, sorted by name then socket.
    plugins: Vec<Arc<ResolvedPlugin>>,
}

impl OrderingIndex {
    /// Creates an index with no plugins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from the complete set of resolved plugins.
    ///
    /// Hook points with an unknown name are ignored. Known hook points the
    /// plugin's negotiated revision cannot serve are skipped with a warning.
    /// A plugin declaring the same hook point twice is registered once, with
    /// the first declared priority.
    pub fn build(plugins: Vec<ResolvedPlugin>) -> Self {
        let mut plugins: Vec<Arc<ResolvedPlugin>> = plugins.into_iter().map(Arc::new).collect();
        plugins.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| a.socket_path().cmp(b.socket_path()))
        });

        let mut entries: HashMap<HookName, Vec<HookEntry>> = HashMap::new();

        for plugin in &plugins {
            let mut registered: Vec<HookName> = Vec::new();

            for point in plugin.hook_points() {
                let Some(hook) = point.hook() else {
                    debug!(
                        plugin = %plugin.name(),
                        hook = %point.name,
                        "Ignoring unknown hook point"
                    );
                    continue;
                };

                if !plugin.version().supports(hook) {
                    warn!(
                        plugin = %plugin.name(),
                        hook = %hook,
                        version = %plugin.version(),
                        "Negotiated version does not expose this hook point, skipping"
                    );
                    continue;
                }

                if registered.contains(&hook) {
                    debug!(plugin = %plugin.name(), hook = %hook, "Duplicate hook point ignored");
                    continue;
                }
                registered.push(hook);

                entries.entry(hook).or_default().push(HookEntry {
                    plugin: Arc::clone(plugin),
                    priority: point.priority,
                });
            }
        }

        for (hook, list) in entries.iter_mut() {
            list.sort_by(compare_entries);
            for (position, entry) in list.iter().enumerate() {
                info!(
                    hook = %hook,
                    position = position,
                    plugin = %entry.plugin.name(),
                    priority = entry.priority,
                    version = %entry.plugin.version(),
                    "Hook callback registered"
                );
            }
        }

        Self { entries, plugins }
    }

    /// Returns the ordered entries for a hook point.
    pub fn get(&self, hook: HookName) -> &[HookEntry] {
        self.entries.get(&hook).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns whether any plugin is registered for a hook point.
    pub fn has_handlers(&self, hook: HookName) -> bool {
        !self.get(hook).is_empty()
    }

    /// Returns the number of plugins registered for a hook point.
    pub fn handler_count(&self, hook: HookName) -> usize {
        self.get(hook).len()
    }

    /// Returns every hook point with at least one plugin, in pipeline order.
    pub fn registered_hooks(&self) -> Vec<HookName> {
        HookName::ALL
            .into_iter()
            .filter(|hook| self.has_handlers(*hook))
            .collect()
    }

    /// Returns every resolved plugin, sorted by name.
    pub fn plugins(&self) -> &[Arc<ResolvedPlugin>] {
        &self.plugins
    }

    /// Number of resolved plugins.
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }
}

fn compare_entries(a: &HookEntry, b: &HookEntry) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.plugin.name().cmp(b.plugin.name()))
        .then_with(|| a.plugin.socket_path().cmp(b.plugin.socket_path()))
}
