//! Hook system: vocabulary, ordering index, and chain dispatcher.

pub mod definitions;
pub mod dispatcher;
pub mod registry;

pub use definitions::{HookName, HookPoint};
pub use dispatcher::HookDispatcher;
pub use registry::{HookEntry, OrderingIndex};
