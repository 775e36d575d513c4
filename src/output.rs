//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};
use vmhooks_manager::hooks::OrderingIndex;
use vmhooks_manager::sidecar::SidecarList;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One row of the ordering index.
#[derive(Debug, Serialize, Tabled)]
pub struct IndexRow {
    /// Hook point.
    #[tabled(rename = "Hook")]
    pub hook: String,
    /// Position in the chain, starting at 0.
    #[tabled(rename = "#")]
    pub position: usize,
    /// Plugin name.
    #[tabled(rename = "Plugin")]
    pub plugin: String,
    /// Declared priority.
    #[tabled(rename = "Priority")]
    pub priority: i32,
    /// Negotiated revision.
    #[tabled(rename = "Version")]
    pub version: String,
    /// Socket path.
    #[tabled(rename = "Socket")]
    pub socket: String,
}

impl IndexRow {
    /// Flattens an ordering index in pipeline order.
    pub fn from_index(index: &OrderingIndex) -> Vec<Self> {
        index
            .registered_hooks()
            .into_iter()
            .flat_map(|hook| {
                index
                    .get(hook)
                    .iter()
                    .enumerate()
                    .map(move |(position, entry)| Self {
                        hook: hook.to_string(),
                        position,
                        plugin: entry.plugin.name().to_string(),
                        priority: entry.priority,
                        version: entry.plugin.version().to_string(),
                        socket: entry.plugin.socket_path().display().to_string(),
                    })
            })
            .collect()
    }
}

/// One row of the sidecar descriptor list.
#[derive(Debug, Serialize, Tabled)]
pub struct SidecarRow {
    /// Container image.
    #[tabled(rename = "Image")]
    pub image: String,
    /// Pull policy.
    #[tabled(rename = "Pull Policy")]
    pub pull_policy: String,
    /// Entrypoint override.
    #[tabled(rename = "Command")]
    pub command: String,
    /// Argument override.
    #[tabled(rename = "Args")]
    pub args: String,
}

impl SidecarRow {
    /// Converts a descriptor list.
    pub fn from_list(list: &SidecarList) -> Vec<Self> {
        list.iter()
            .map(|d| Self {
                image: d.image.clone(),
                pull_policy: d
                    .image_pull_policy
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                command: d.command.join(" "),
                args: d.args.join(" "),
            })
            .collect()
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                let table = Table::new(items).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:#?}", item);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    eprintln!("✓ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    eprintln!("  {:<24} {}", format!("{}:", key), value);
}
