//! Leaderboard ranking over the remote store's records.
//!
//! Display formatting belongs to the view collaborator; this module only
//! orders users by cumulative gems.

use crate::errors::Result;
use crate::sync::{RemoteProgressStore, UserProgress};

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based dense rank: users with equal gems share a rank.
    pub rank: u32,
    pub user_id: String,
    pub username: Option<String>,
    pub level: u32,
    pub gems: i64,
}

/// Rank users by gems descending. Ties break by level descending, then user
/// id, so the ordering is deterministic across refreshes.
pub fn rank_users(mut entries: Vec<UserProgress>) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| {
        b.record
            .gems
            .cmp(&a.record.gems)
            .then_with(|| b.record.level.cmp(&a.record.level))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    let mut ranked = Vec::with_capacity(entries.len());
    let mut rank = 0u32;
    let mut previous_gems: Option<i64> = None;
    for entry in entries {
        if previous_gems != Some(entry.record.gems) {
            rank += 1;
            previous_gems = Some(entry.record.gems);
        }
        ranked.push(LeaderboardEntry {
            rank,
            user_id: entry.user_id,
            username: entry.username,
            level: entry.record.level,
            gems: entry.record.gems,
        });
    }
    ranked
}

/// Fetch every stored record and rank it.
pub async fn fetch_leaderboard(store: &dyn RemoteProgressStore) -> Result<Vec<LeaderboardEntry>> {
    Ok(rank_users(store.list_all().await?))
}
