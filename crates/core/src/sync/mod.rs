//! Progress persistence: store traits, conflict merge, sync coordination.

mod coordinator;
mod merge;
mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::*;
pub use merge::*;
pub use store::*;

/// Debounce window for remote publishes, in milliseconds. GPS callbacks fire
/// every 5-10 s; only the latest snapshot inside this window goes out.
pub const PUBLISH_DEBOUNCE_WINDOW_MS: u64 = 2_000;
