//! Store contracts the persistence collaborators implement.

use async_trait::async_trait;

use crate::challenges::ProgressRecord;
use crate::errors::Result;

/// Durable key-value cache on the device. Synchronous: implementations sit on
/// local storage and must not block the event loop for long.
pub trait LocalProgressCache: Send + Sync {
    /// Absence means "no prior session".
    fn get(&self, key: &str) -> Result<Option<ProgressRecord>>;
    fn set(&self, key: &str, record: &ProgressRecord) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// One user's progress as stored remotely, keyed for leaderboard display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgress {
    pub user_id: String,
    pub username: Option<String>,
    pub record: ProgressRecord,
}

/// The per-user remote document store. Writes are best-effort; the engine
/// only observes failures through logs and sync status, never as a gate on
/// progression.
#[async_trait]
pub trait RemoteProgressStore: Send + Sync {
    async fn read(&self, user_id: &str) -> Result<Option<ProgressRecord>>;
    async fn write(&self, user_id: &str, record: &ProgressRecord) -> Result<()>;
    /// Every stored record. Consumed by the leaderboard collaborator only.
    async fn list_all(&self) -> Result<Vec<UserProgress>>;
}
