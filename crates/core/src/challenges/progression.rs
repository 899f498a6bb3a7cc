//! The challenge progression state machine.
//!
//! Per challenge: Locked → Unlocked → Completed (terminal). At most one
//! challenge holds the active role (lowest unlocked, not completed).
//! Completion is an explicit user-triggered transition; reaching the target
//! never auto-completes, because rewards are claimed, not auto-granted.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use log::debug;

use crate::challenges::{ChallengeSet, ProgressSnapshot};
use crate::errors::{Error, Result};
use crate::events::{NoOpProgressEventSink, ProgressEvent, ProgressEventSink};

/// Where a step delta originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSource {
    Gps,
    Manual,
}

struct EngineState {
    challenges: ChallengeSet,
    cumulative_gems: i64,
    active_level: u32,
    streak: i64,
    last_active_date: Option<NaiveDate>,
    badges: Vec<String>,
}

impl EngineState {
    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            challenges: self.challenges.clone(),
            cumulative_gems: self.cumulative_gems,
            active_level: self.active_level,
            streak: self.streak,
            last_active_date: self.last_active_date,
            badges: self.badges.clone(),
        }
    }

    /// First accepted delta of a calendar day extends the streak.
    fn touch_streak(&mut self, today: NaiveDate) {
        if self.last_active_date != Some(today) {
            self.streak += 1;
            self.last_active_date = Some(today);
        }
    }
}

/// Owns the challenge set and drives unlock/completion transitions.
///
/// All counter mutation happens inside a non-suspending critical section, so
/// sensor callbacks, user input, and completion attempts targeting the same
/// challenge serialize cleanly even when they interleave on the event loop.
pub struct ProgressionEngine {
    state: Mutex<EngineState>,
    event_sink: Arc<dyn ProgressEventSink>,
}

impl ProgressionEngine {
    /// Engine over the default journey (level 1 unlocked, counters zero).
    pub fn new() -> Self {
        Self::from_snapshot(ProgressSnapshot::default_session())
    }

    /// Engine hydrated from a persisted snapshot.
    pub fn from_snapshot(snapshot: ProgressSnapshot) -> Self {
        Self {
            state: Mutex::new(EngineState {
                challenges: snapshot.challenges,
                cumulative_gems: snapshot.cumulative_gems,
                active_level: snapshot.active_level,
                streak: snapshot.streak,
                last_active_date: snapshot.last_active_date,
                badges: snapshot.badges,
            }),
            event_sink: Arc::new(NoOpProgressEventSink),
        }
    }

    /// Attach the sink notified on accepted transitions.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn ProgressEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock_state().snapshot()
    }

    pub fn active_level(&self) -> u32 {
        self.lock_state().active_level
    }

    pub fn cumulative_gems(&self) -> i64 {
        self.lock_state().cumulative_gems
    }

    /// Route a step delta to the named challenge.
    ///
    /// Returns `Ok(Some(snapshot))` when the counters changed, `Ok(None)` for
    /// side-effect-free rejections (completed challenge, non-positive delta).
    /// Manual deltas must target the active challenge.
    pub fn record_step_delta(
        &self,
        level: u32,
        source: StepSource,
        amount: i64,
    ) -> Result<Option<ProgressSnapshot>> {
        self.record_step_delta_on(level, source, amount, Utc::now().date_naive())
    }

    fn record_step_delta_on(
        &self,
        level: u32,
        source: StepSource,
        amount: i64,
        today: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        let outcome = {
            let mut state = self.lock_state();
            if source == StepSource::Manual && level != state.active_level {
                return Err(Error::ChallengeNotActive(level));
            }
            let challenge = state
                .challenges
                .get_mut(level)
                .ok_or(Error::UnknownLevel(level))?;
            let accepted = match source {
                StepSource::Gps => challenge.apply_gps_delta(amount),
                StepSource::Manual => challenge.apply_manual_delta(amount),
            };
            if !accepted {
                return Ok(None);
            }
            let total_steps = challenge.total_steps;
            state.touch_streak(today);
            (state.snapshot(), total_steps)
        };

        let (snapshot, total_steps) = outcome;
        self.event_sink
            .emit(ProgressEvent::StepsRecorded { level, total_steps });
        Ok(Some(snapshot))
    }

    /// Claim completion of a challenge.
    ///
    /// Fails with `InsufficientProgress` below target and `AlreadyCompleted`
    /// on retry (idempotent: gems are never re-granted). On success the total
    /// is frozen into `completed_steps`, the reward is added, and — below the
    /// final level — the next challenge unlocks and becomes active. At the
    /// final level the active level is left unchanged and the terminal
    /// all-complete event fires.
    pub fn complete_challenge(&self, level: u32) -> Result<ProgressSnapshot> {
        let (snapshot, events) = {
            let mut state = self.lock_state();
            let max_level = state.challenges.max_level();
            let challenge = state
                .challenges
                .get_mut(level)
                .ok_or(Error::UnknownLevel(level))?;
            if challenge.completed {
                return Err(Error::AlreadyCompleted(level));
            }
            if challenge.total_steps < challenge.target_steps {
                return Err(Error::InsufficientProgress {
                    level,
                    total_steps: challenge.total_steps,
                    target_steps: challenge.target_steps,
                });
            }

            challenge.completed = true;
            challenge.completed_steps = challenge.total_steps;
            let reward_gems = challenge.reward_gems;

            state.cumulative_gems += reward_gems;
            state.badges.push(format!("Level {} completed", level));

            let mut events = vec![ProgressEvent::ChallengeCompleted { level, reward_gems }];
            if level < max_level {
                if let Some(next) = state.challenges.get_mut(level + 1) {
                    next.is_unlocked = true;
                }
                state.active_level = level + 1;
                debug!("Challenge {} completed; level {} unlocked", level, level + 1);
            } else {
                events.push(ProgressEvent::AllChallengesComplete);
                debug!("Final challenge {} completed", level);
            }

            (state.snapshot(), events)
        };

        for event in events {
            self.event_sink.emit(event);
        }
        Ok(snapshot)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self::new()
    }
}
