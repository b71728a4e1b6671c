//! Tool registry: records, snapshots, and the shared in-memory store

pub mod record;
pub mod store;

pub use record::{RegistrySnapshot, ToolRecord};
pub use store::{RegistryStats, SearchResult, ToolRegistry, NO_QUERY_MARKER};
