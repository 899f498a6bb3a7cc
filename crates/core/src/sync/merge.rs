//! Conflict policy for snapshots from independent stores.
//!
//! A stale snapshot must never regress progress, so the merge is
//! max-dominant: component-wise maxima for counters and gems, logical OR for
//! completion flags. `total_steps` is recomputed from the merged components
//! rather than maxed directly; `max(gps) + max(manual) >= max(total)` for any
//! inputs, so the result still dominates both sides while preserving the
//! `total = gps + manual` accounting invariant.

use std::collections::BTreeMap;

use crate::challenges::{Challenge, ChallengeSet, ProgressSnapshot};

/// Merge two candidate snapshots for the same user, e.g. the remote record
/// against the local cache after a restart mid-sync.
pub fn merge_snapshots(a: &ProgressSnapshot, b: &ProgressSnapshot) -> ProgressSnapshot {
    let mut by_level: BTreeMap<u32, Challenge> = BTreeMap::new();
    for challenge in a.challenges.iter() {
        by_level.insert(challenge.level, challenge.clone());
    }
    for challenge in b.challenges.iter() {
        match by_level.get_mut(&challenge.level) {
            Some(existing) => merge_challenge(existing, challenge),
            None => {
                by_level.insert(challenge.level, challenge.clone());
            }
        }
    }

    let mut challenges = ChallengeSet::from_challenges(by_level.into_values().collect());
    challenges.repair_unlock_chain();

    let max_level = challenges.max_level().max(1);
    let recomputed_active = challenges.active_level().unwrap_or(max_level);
    let active_level = recomputed_active
        .max(a.active_level)
        .max(b.active_level)
        .min(max_level);

    let mut badges = a.badges.clone();
    for badge in &b.badges {
        if !badges.contains(badge) {
            badges.push(badge.clone());
        }
    }

    ProgressSnapshot {
        challenges,
        cumulative_gems: a.cumulative_gems.max(b.cumulative_gems),
        active_level,
        streak: a.streak.max(b.streak),
        last_active_date: a.last_active_date.max(b.last_active_date),
        badges,
    }
}

fn merge_challenge(into: &mut Challenge, other: &Challenge) {
    into.gps_steps = into.gps_steps.max(other.gps_steps);
    into.manual_steps = into.manual_steps.max(other.manual_steps);
    into.total_steps = into.gps_steps + into.manual_steps;
    into.completed_steps = into.completed_steps.max(other.completed_steps);
    into.completed = into.completed || other.completed;
    into.is_unlocked = into.is_unlocked || other.is_unlocked;
}
