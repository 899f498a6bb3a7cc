//! Challenge, challenge set, and the persisted progress record shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One level of the step-count journey.
///
/// Serializes to the persisted record contract shared by the local cache and
/// the remote store; field names are part of that contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub level: u32,
    pub target_steps: i64,
    pub reward_gems: i64,
    pub is_unlocked: bool,
    pub completed: bool,
    /// Snapshot of `total_steps` at the instant of completion, else 0.
    #[serde(default)]
    pub completed_steps: i64,
    #[serde(default)]
    pub gps_steps: i64,
    #[serde(default)]
    pub manual_steps: i64,
    #[serde(default)]
    pub total_steps: i64,
}

impl Challenge {
    /// A locked challenge with zeroed counters.
    pub fn new(level: u32, target_steps: i64, reward_gems: i64) -> Self {
        Self {
            level,
            target_steps,
            reward_gems,
            is_unlocked: false,
            completed: false,
            completed_steps: 0,
            gps_steps: 0,
            manual_steps: 0,
            total_steps: 0,
        }
    }

    pub fn unlocked(mut self) -> Self {
        self.is_unlocked = true;
        self
    }

    /// True for the lowest unlocked-and-incomplete challenge role.
    pub fn is_open(&self) -> bool {
        self.is_unlocked && !self.completed
    }
}

/// The ordered, level-indexed sequence of challenges. Owned exclusively by
/// the progression engine; everything else only sees snapshots of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeSet(Vec<Challenge>);

impl ChallengeSet {
    pub fn from_challenges(mut challenges: Vec<Challenge>) -> Self {
        challenges.sort_by_key(|c| c.level);
        Self(challenges)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Challenge> {
        self.0.iter()
    }

    pub fn get(&self, level: u32) -> Option<&Challenge> {
        self.0.iter().find(|c| c.level == level)
    }

    pub(crate) fn get_mut(&mut self, level: u32) -> Option<&mut Challenge> {
        self.0.iter_mut().find(|c| c.level == level)
    }

    pub fn max_level(&self) -> u32 {
        self.0.last().map(|c| c.level).unwrap_or(0)
    }

    /// The active challenge: lowest unlocked and not completed. `None` once
    /// every challenge is completed.
    pub fn active_level(&self) -> Option<u32> {
        self.0.iter().find(|c| c.is_open()).map(|c| c.level)
    }

    pub fn highest_completed_level(&self) -> u32 {
        self.0
            .iter()
            .filter(|c| c.completed)
            .map(|c| c.level)
            .max()
            .unwrap_or(0)
    }

    /// Re-establish the unlock invariant: exactly the levels up to
    /// (highest completed + 1) are unlocked, level 1 always. Used after
    /// merging snapshots from independent stores.
    pub(crate) fn repair_unlock_chain(&mut self) {
        let boundary = self.highest_completed_level() + 1;
        for challenge in &mut self.0 {
            challenge.is_unlocked = challenge.level <= boundary.max(1);
        }
    }

    pub(crate) fn into_vec(self) -> Vec<Challenge> {
        self.0
    }
}

/// The fixed five-level journey a fresh session starts with.
pub fn default_challenge_set() -> ChallengeSet {
    ChallengeSet::from_challenges(vec![
        Challenge::new(1, 6_000, 10).unlocked(),
        Challenge::new(2, 10_000, 20),
        Challenge::new(3, 12_000, 30),
        Challenge::new(4, 16_000, 40),
        Challenge::new(5, 20_000, 50),
    ])
}

/// Immutable point-in-time copy of the full progress state. Created on every
/// accepted transition and superseded, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub challenges: ChallengeSet,
    pub cumulative_gems: i64,
    pub active_level: u32,
    pub streak: i64,
    pub last_active_date: Option<NaiveDate>,
    pub badges: Vec<String>,
}

impl ProgressSnapshot {
    /// Fresh default state: level 1 unlocked, all counters zero.
    pub fn default_session() -> Self {
        Self {
            challenges: default_challenge_set(),
            cumulative_gems: 0,
            active_level: 1,
            streak: 0,
            last_active_date: None,
            badges: Vec::new(),
        }
    }
}

/// Persisted record shape, interchangeable between the local cache and the
/// remote store. `streak`, `lastActiveDate`, and `badges` are additive
/// extensions with defaults so older records still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub level: u32,
    pub gems: i64,
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub streak: i64,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
    #[serde(default)]
    pub badges: Vec<String>,
}

impl From<&ProgressSnapshot> for ProgressRecord {
    fn from(snapshot: &ProgressSnapshot) -> Self {
        Self {
            level: snapshot.active_level,
            gems: snapshot.cumulative_gems,
            challenges: snapshot.challenges.clone().into_vec(),
            streak: snapshot.streak,
            last_active_date: snapshot.last_active_date,
            badges: snapshot.badges.clone(),
        }
    }
}

impl ProgressRecord {
    pub fn into_snapshot(self) -> ProgressSnapshot {
        let challenges = ChallengeSet::from_challenges(self.challenges);
        let max_level = challenges.max_level().max(1);
        ProgressSnapshot {
            active_level: self.level.clamp(1, max_level),
            challenges,
            cumulative_gems: self.gems,
            streak: self.streak,
            last_active_date: self.last_active_date,
            badges: self.badges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_serialization_matches_store_contract() {
        let mut challenge = Challenge::new(2, 10_000, 20).unlocked();
        challenge.gps_steps = 300;
        challenge.manual_steps = 50;
        challenge.total_steps = 350;

        // String form preserves struct field order, so this pins both the
        // wire names and their order.
        let json = serde_json::to_string(&challenge).expect("serialize challenge");
        assert_eq!(
            json,
            r#"{"level":2,"targetSteps":10000,"rewardGems":20,"isUnlocked":true,"completed":false,"completedSteps":0,"gpsSteps":300,"manualSteps":50,"totalSteps":350}"#
        );
    }

    #[test]
    fn counter_fields_default_when_absent() {
        let record: Challenge = serde_json::from_str(
            r#"{"level":1,"targetSteps":6000,"rewardGems":10,"isUnlocked":true,"completed":false}"#,
        )
        .expect("deserialize sparse challenge");
        assert_eq!(record.gps_steps, 0);
        assert_eq!(record.total_steps, 0);
    }

    #[test]
    fn default_set_unlocks_only_level_one() {
        let set = default_challenge_set();
        assert_eq!(set.len(), 5);
        assert_eq!(set.max_level(), 5);
        assert_eq!(set.active_level(), Some(1));
        for challenge in set.iter() {
            assert_eq!(challenge.is_unlocked, challenge.level == 1);
            assert!(!challenge.completed);
            assert_eq!(challenge.total_steps, 0);
        }
    }

    #[test]
    fn active_level_skips_completed() {
        let mut set = default_challenge_set();
        let first = set.get_mut(1).unwrap();
        first.completed = true;
        set.get_mut(2).unwrap().is_unlocked = true;
        assert_eq!(set.active_level(), Some(2));
    }

    #[test]
    fn repair_unlock_chain_follows_highest_completion() {
        let mut set = default_challenge_set();
        set.get_mut(1).unwrap().completed = true;
        set.get_mut(2).unwrap().completed = true;
        set.get_mut(5).unwrap().is_unlocked = true; // stale flag from a bad merge input
        set.repair_unlock_chain();

        let unlocked: Vec<u32> = set.iter().filter(|c| c.is_unlocked).map(|c| c.level).collect();
        assert_eq!(unlocked, vec![1, 2, 3]);
    }

    #[test]
    fn record_snapshot_round_trip() {
        let mut snapshot = ProgressSnapshot::default_session();
        snapshot.cumulative_gems = 30;
        snapshot.active_level = 2;
        snapshot.streak = 4;
        snapshot.badges.push("Level 1 completed".to_string());

        let record = ProgressRecord::from(&snapshot);
        assert_eq!(record.level, 2);
        assert_eq!(record.gems, 30);

        let restored = record.into_snapshot();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn out_of_range_record_level_is_clamped() {
        let record = ProgressRecord {
            level: 9,
            gems: 0,
            challenges: default_challenge_set().into_vec(),
            streak: 0,
            last_active_date: None,
            badges: Vec::new(),
        };
        assert_eq!(record.into_snapshot().active_level, 5);
    }
}
