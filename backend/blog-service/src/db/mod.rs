/// Persistence layer: JSON collections on disk (or in memory for tests)
pub mod backend;
pub mod retry;
pub mod store;

pub use backend::{JsonFileBackend, MemoryBackend, StorageBackend};
pub use retry::RetryConfig;
pub use store::{Collection, RecordStore};
