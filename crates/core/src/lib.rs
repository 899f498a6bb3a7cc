//! StrideQuest core: challenge progression and step-reconciliation engine.
//!
//! Raw location samples are converted into step deltas, reconciled with
//! user-entered manual counts into per-challenge totals, and fed through the
//! level-unlock/completion state machine. The sync coordinator keeps the
//! in-memory state consistent with a local durable cache and a remote
//! per-user record. Screen rendering, auth, and theming live outside this
//! crate; it only exposes the traits those collaborators implement.

pub mod challenges;
pub mod errors;
pub mod events;
pub mod leaderboard;
pub mod location;
pub mod session;
pub mod sync;

pub use challenges::{
    default_challenge_set, Challenge, ChallengeSet, ProgressRecord, ProgressSnapshot,
    ProgressionEngine, StepSource,
};
pub use errors::{Error, Result};
pub use events::{NoOpProgressEventSink, ProgressEvent, ProgressEventSink};
pub use location::{Coordinate, GpsStepTracker, LocationSample, LocationSampleSource};
pub use session::ProgressSession;
pub use sync::{LocalProgressCache, RemoteProgressStore, SyncCoordinator, UserProgress};
