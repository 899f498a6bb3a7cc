//! Progress domain events and the sink trait interested views implement.
//!
//! The engine emits, views observe; no view ever mutates progress state
//! directly.

use serde::{Deserialize, Serialize};

/// Events emitted by the progression engine on accepted transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A step delta was accepted for a challenge.
    StepsRecorded { level: u32, total_steps: i64 },
    /// A challenge was completed and its reward claimed.
    ChallengeCompleted { level: u32, reward_gems: i64 },
    /// The final challenge was completed. Terminal; emitted once.
    AllChallengesComplete,
}

/// Sink for progress events. The engine emits synchronously on the caller's
/// task, after its own state lock is released.
pub trait ProgressEventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Default sink that discards all events.
pub struct NoOpProgressEventSink;

impl ProgressEventSink for NoOpProgressEventSink {
    fn emit(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Records every emitted event for assertions.
    pub struct RecordingSink {
        pub events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        pub fn collected(&self) -> Vec<ProgressEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressEventSink for RecordingSink {
        fn emit(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
