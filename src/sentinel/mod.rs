//! Persisted Sentinel Store
//!
//! Durable key -> string storage that survives process restarts, plus the
//! typed sentinel records the startup watchdog writes into it.
//!
//! - `FileStore`: JSON map on disk, every write is temp file + rename
//! - `MemoryStore`: in-process map for tests and hosts without storage

mod record;
mod store;
#[cfg(test)]
mod tests;

pub use record::{SentinelRecord, SentinelState, SentinelStore};
pub use store::{FileStore, KeyValueStore, MemoryStore};
