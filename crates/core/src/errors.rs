//! Error types for the core engine.

use thiserror::Error;

/// Result type alias for core engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the progression engine and sync coordinator.
///
/// None of these are fatal: the engine always keeps a valid in-memory state
/// and persistence failures degrade to in-memory-only operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Completion attempted before the step target was reached.
    #[error("challenge {level} needs {target_steps} steps, only {total_steps} recorded")]
    InsufficientProgress {
        level: u32,
        total_steps: i64,
        target_steps: i64,
    },

    /// Duplicate completion attempt. Recovered silently by callers; rewards
    /// are never granted twice.
    #[error("challenge {0} is already completed")]
    AlreadyCompleted(u32),

    /// Manual steps may only target the active (lowest unlocked, incomplete)
    /// challenge.
    #[error("challenge {0} is not the active challenge")]
    ChallengeNotActive(u32),

    /// No challenge exists at the requested level.
    #[error("no challenge at level {0}")]
    UnknownLevel(u32),

    /// A location sample carried a non-finite or out-of-range coordinate and
    /// was dropped before reaching the accumulator.
    #[error("invalid location sample: {0}")]
    InvalidSample(String),

    /// A local cache or remote store operation failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl Error {
    /// Create an invalid sample error.
    pub fn invalid_sample(message: impl Into<String>) -> Self {
        Self::InvalidSample(message.into())
    }

    /// Create a persistence error.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// True when the operation can simply be retried later without user
    /// intervention (store hiccups, not domain rule violations).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
