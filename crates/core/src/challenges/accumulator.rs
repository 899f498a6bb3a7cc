//! Step accumulation rules for a single challenge's counters.
//!
//! Both entry points are plain read-modify-write on the counters and never
//! suspend; the engine serializes calls per challenge, which makes each
//! application atomic with respect to the sensor stream and user input.

use log::debug;

use crate::challenges::Challenge;

impl Challenge {
    /// Apply a GPS-derived step delta. Returns whether the counters changed.
    ///
    /// Rejections are side-effect-free, not errors: a delta arriving after
    /// completion is expected sensor-stream lag, and a negative delta is GPS
    /// noise that must never decrease a counter.
    pub fn apply_gps_delta(&mut self, steps: i64) -> bool {
        if self.completed {
            debug!(
                "Ignoring GPS delta of {} for completed challenge {}",
                steps, self.level
            );
            return false;
        }
        if !self.is_unlocked || steps <= 0 {
            return false;
        }
        self.gps_steps += steps;
        self.recompute_total();
        true
    }

    /// Apply a user-entered manual step delta. Increment semantics: the value
    /// adds to `manual_steps` so a concurrent GPS update can never be
    /// overwritten by an absolute set. Returns whether the counters changed.
    pub fn apply_manual_delta(&mut self, steps: i64) -> bool {
        if self.completed || !self.is_unlocked || steps <= 0 {
            return false;
        }
        self.manual_steps += steps;
        self.recompute_total();
        true
    }

    fn recompute_total(&mut self) {
        self.total_steps = self.gps_steps + self.manual_steps;
    }
}
