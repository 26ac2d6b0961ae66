//! Leaderboard model.

use crate::world::World;
use protocol::{Color, EntityId};

/// Label shown for entities that joined without a name.
pub const UNNAMED: &str = "Unnamed Blob";

/// A leaderboard entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub id: EntityId,
    pub name: String,
    pub color: Color,
    /// Score floored for display.
    pub score: u64,
    pub is_local: bool,
}

/// Every known entity, highest score first, truncated to `limit`.
pub fn leaderboard(world: &World, limit: usize) -> Vec<LeaderboardEntry> {
    let mut ranked: Vec<_> = world
        .local()
        .map(|e| (e, true))
        .into_iter()
        .chain(world.remotes().values().map(|e| (e, false)))
        .collect();
    ranked.sort_by(|(a, _), (b, _)| b.score.total_cmp(&a.score));

    ranked
        .into_iter()
        .take(limit)
        .map(|(entity, is_local)| LeaderboardEntry {
            id: entity.id,
            name: if entity.name.is_empty() {
                UNNAMED.to_string()
            } else {
                entity.name.clone()
            },
            color: entity.color,
            score: entity.score.max(0.0).floor() as u64,
            is_local,
        })
        .collect()
}
