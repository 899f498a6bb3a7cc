//! Location sample source contract and GPS step derivation.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::location::{meters_between, steps_for_meters};

/// Minimum time between delivered samples, in seconds. The sensor collaborator
/// is configured with this cadence; the tracker itself tolerates any gap.
pub const LOCATION_MIN_INTERVAL_SECS: u64 = 5;

/// Minimum displacement between delivered samples, in meters.
pub const LOCATION_MIN_DISTANCE_METERS: f64 = 10.0;

/// A WGS84 position. Immutable value; degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Rejects non-finite and out-of-range coordinates. This is the input
    /// validation boundary: invalid samples are dropped here so NaN never
    /// reaches the accumulator.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(Error::invalid_sample(format!(
                "non-finite coordinate ({}, {})",
                self.latitude, self.longitude
            )));
        }
        if self.latitude.abs() > 90.0 || self.longitude.abs() > 180.0 {
            return Err(Error::invalid_sample(format!(
                "coordinate out of range ({}, {})",
                self.latitude, self.longitude
            )));
        }
        Ok(())
    }
}

/// One raw position sample from the sensor stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub coordinate: Coordinate,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl LocationSample {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            recorded_at: None,
        }
    }
}

/// Callback invoked for each delivered sample.
pub type SampleCallback = Box<dyn Fn(LocationSample) + Send + Sync>;

/// Handle for an active sensor subscription. Dropping without calling
/// `unsubscribe` is allowed but leaves the sensor running until the
/// collaborator's own teardown.
pub trait LocationSubscription: Send {
    fn unsubscribe(&mut self);
}

/// The location-sensor collaborator. Delivers samples at the configured
/// minimum distance/time granularity; duplicates and gaps are expected.
pub trait LocationSampleSource: Send + Sync {
    fn subscribe(&self, callback: SampleCallback) -> Result<Box<dyn LocationSubscription>>;
}

/// Derives GPS step deltas from consecutive samples.
///
/// Holds the previous accepted fix; each new sample yields the haversine
/// distance from that fix converted to steps. The first sample anchors the
/// track and yields zero. Duplicate or zero-distance samples yield zero,
/// never a negative delta.
pub struct GpsStepTracker {
    last_fix: Mutex<Option<Coordinate>>,
}

impl GpsStepTracker {
    pub fn new() -> Self {
        Self {
            last_fix: Mutex::new(None),
        }
    }

    /// Validate a sample and return the step delta since the previous fix.
    ///
    /// Invalid samples are rejected without disturbing the previous fix, so a
    /// stray NaN in the stream cannot corrupt subsequent deltas.
    pub fn steps_from_sample(&self, sample: &LocationSample) -> Result<i64> {
        sample.coordinate.validate()?;

        let mut last_fix = self.last_fix.lock().unwrap_or_else(|e| e.into_inner());
        let steps = match *last_fix {
            Some(previous) => steps_for_meters(meters_between(previous, sample.coordinate)),
            None => 0,
        };
        *last_fix = Some(sample.coordinate);
        Ok(steps)
    }

    /// Validate-and-convert that drops invalid samples with a warning instead
    /// of surfacing the error. The sample pump uses this: a bad fix is noise,
    /// not a failure of the session.
    pub fn steps_from_sample_lossy(&self, sample: &LocationSample) -> i64 {
        match self.steps_from_sample(sample) {
            Ok(steps) => steps,
            Err(err) => {
                warn!("Dropping location sample: {}", err);
                0
            }
        }
    }

    /// Forget the previous fix, e.g. after a long gap in the stream.
    pub fn reset(&self) {
        *self.last_fix.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl Default for GpsStepTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(latitude: f64, longitude: f64) -> LocationSample {
        LocationSample::new(Coordinate::new(latitude, longitude))
    }

    #[test]
    fn first_sample_anchors_and_yields_zero() {
        let tracker = GpsStepTracker::new();
        assert_eq!(tracker.steps_from_sample(&sample(52.52, 13.405)).unwrap(), 0);
    }

    #[test]
    fn duplicate_sample_yields_zero_delta() {
        let tracker = GpsStepTracker::new();
        tracker.steps_from_sample(&sample(52.52, 13.405)).unwrap();
        assert_eq!(tracker.steps_from_sample(&sample(52.52, 13.405)).unwrap(), 0);
    }

    #[test]
    fn one_meter_apart_yields_one_step() {
        let tracker = GpsStepTracker::new();
        tracker.steps_from_sample(&sample(0.0, 0.0)).unwrap();
        let steps = tracker.steps_from_sample(&sample(0.000009, 0.0)).unwrap();
        assert_eq!(steps, 1);
    }

    #[test]
    fn invalid_sample_is_rejected_and_fix_kept() {
        let tracker = GpsStepTracker::new();
        tracker.steps_from_sample(&sample(0.0, 0.0)).unwrap();

        let err = tracker.steps_from_sample(&sample(f64::NAN, 0.0));
        assert!(matches!(err, Err(Error::InvalidSample(_))));
        let err = tracker.steps_from_sample(&sample(91.0, 0.0));
        assert!(matches!(err, Err(Error::InvalidSample(_))));

        // Previous fix survived; a valid follow-up measures from (0, 0).
        let steps = tracker.steps_from_sample(&sample(0.000009, 0.0)).unwrap();
        assert_eq!(steps, 1);
    }

    #[test]
    fn lossy_conversion_swallows_bad_fixes() {
        let tracker = GpsStepTracker::new();
        assert_eq!(tracker.steps_from_sample_lossy(&sample(f64::NAN, 2.0)), 0);
        assert_eq!(tracker.steps_from_sample_lossy(&sample(1.0, 2.0)), 0);
    }

    #[test]
    fn reset_forgets_the_previous_fix() {
        let tracker = GpsStepTracker::new();
        tracker.steps_from_sample(&sample(10.0, 10.0)).unwrap();
        tracker.reset();
        // Far away, but the first sample after reset only anchors.
        assert_eq!(tracker.steps_from_sample(&sample(11.0, 10.0)).unwrap(), 0);
    }
}
