//! Durable key-value store boundary for cart snapshots.
//!
//! The manager reads one blob at startup and writes one blob after every
//! successful mutation; nothing else touches the store.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use r#trait::{DurableStore, StoreError};
