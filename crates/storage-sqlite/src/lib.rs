//! SQLite-backed local progress cache for StrideQuest.

mod error;
mod progress_cache;

pub use error::StorageError;
pub use progress_cache::SqliteProgressCache;
