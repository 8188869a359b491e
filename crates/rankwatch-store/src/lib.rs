//! Storage for tracked entities and per-guild configuration.
//!
//! Every write is keyed by entity id and is a full-document merge applied
//! atomically, so the sweep and command paths can write concurrently
//! without clobbering each other's subscriber changes. Removing the last
//! subscriber deletes the entity in the same operation.

pub mod data;
pub mod error;
pub mod file;
pub mod lock;
pub mod memory;
pub mod traits;

pub use data::StoreData;
pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use lock::FileLock;
pub use memory::MemoryStore;
pub use traits::{EntityStore, EntityUpsert, GuildConfigStore};
