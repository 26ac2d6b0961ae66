//! Collision and elimination resolver.
//!
//! Only the local entity's wins are decided here. A local loss is decided
//! by the absorbing peer and arrives as a `PLAYER_EATEN` message.

use crate::config::CollisionConfig;
use glam::Vec2;
use protocol::{EntityId, SyncMessage};
use tracing::info;

use crate::world::World;

/// One absorption decided by the local resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elimination {
    pub predator: EntityId,
    pub prey: EntityId,
}

impl Elimination {
    pub fn message(&self) -> SyncMessage {
        SyncMessage::PlayerEaten {
            predator_id: self.predator,
            prey_id: self.prey,
        }
    }
}

/// Check whether a predator circle may absorb a prey circle.
///
/// The prey's center must be strictly inside the predator and the predator
/// must be more than `margin` times the prey's radius.
#[inline]
pub fn can_absorb(
    predator_pos: Vec2,
    predator_radius: f32,
    prey_pos: Vec2,
    prey_radius: f32,
    margin: f32,
) -> bool {
    predator_pos.distance(prey_pos) < predator_radius && predator_radius > prey_radius * margin
}

/// Absorb every remote entity the local entity dominates.
///
/// Each absorption grows the local entity before the next remote is checked.
/// Absorbed remotes are removed for good; the caller broadcasts the returned outcomes.
pub fn resolve(world: &mut World, config: &CollisionConfig) -> Vec<Elimination> {
    let Some((local, remotes)) = world.local_and_remotes_mut() else {
        return Vec::new();
    };

    let mut eliminations = Vec::new();
    remotes.retain(|id, other| {
        if !can_absorb(local.position, local.radius, other.position, other.radius, config.dominance_margin) {
            return true;
        }
        let before = local.radius;
        local.absorb(other, config.absorb_growth);
        info!(
            "{} absorbed {} (prey radius {:.1}, own radius {:.1} -> {:.1})",
            local.name, other.name, other.radius, before, local.radius
        );
        eliminations.push(Elimination {
            predator: local.id,
            prey: *id,
        });
        false
    });
    for elimination in &eliminations {
        world.eliminate_remote(&elimination.prey);
    }
    eliminations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entity::Entity;
    use crate::world::Upsert;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn entity(rng: &mut StdRng, pos: Vec2, radius: f32) -> Entity {
        let config = Config::default();
        let bounds = crate::world::MapBounds::new(config.arena.map_size);
        let mut e = Entity::spawn(rng, "blob".into(), &bounds, &config);
        e.position = pos;
        e.radius = radius;
        e
    }

    fn world_with(local: Entity, remotes: Vec<Entity>) -> World {
        let mut world = World::new(3000.0);
        world.replace_local(local);
        for remote in remotes {
            world.upsert_remote(remote);
        }
        world
    }

    #[test]
    fn test_absorbs_dominated_remote() {
        let mut rng = StdRng::seed_from_u64(31);
        let local = entity(&mut rng, Vec2::ZERO, 40.0);
        let mut prey = entity(&mut rng, Vec2::new(10.0, 0.0), 35.0);
        prey.score = 50.0;
        let (local_id, prey_id) = (local.id, prey.id);
        let mut world = world_with(local, vec![prey]);

        let eliminations = resolve(&mut world, &CollisionConfig::default());
        assert_eq!(eliminations, vec![Elimination { predator: local_id, prey: prey_id }]);

        let local = world.local().unwrap();
        assert_eq!(local.radius, 57.5);
        assert_eq!(local.score, 80.0);
        assert!(world.remote(&prey_id).is_none());
        // A late update from the prey does not bring it back.
        let late = entity(&mut rng, Vec2::new(10.0, 0.0), 35.0);
        let late = Entity { id: prey_id, ..late };
        assert_eq!(world.upsert_remote(late), Upsert::Eliminated);
        assert!(world.remotes().is_empty());
    }

    #[test]
    fn test_margin_blocks_near_equal() {
        let mut rng = StdRng::seed_from_u64(32);
        let local = entity(&mut rng, Vec2::ZERO, 40.0);
        let rival = entity(&mut rng, Vec2::new(10.0, 0.0), 37.0);
        let rival_id = rival.id;
        let mut world = world_with(local, vec![rival]);

        assert!(resolve(&mut world, &CollisionConfig::default()).is_empty());
        assert_eq!(world.local().unwrap().radius, 40.0);
        assert!(world.remote(&rival_id).is_some());
    }

    #[test]
    fn test_distance_must_be_inside_radius() {
        assert!(!can_absorb(Vec2::ZERO, 40.0, Vec2::new(40.0, 0.0), 10.0, 1.1));
        assert!(can_absorb(Vec2::ZERO, 40.0, Vec2::new(39.9, 0.0), 10.0, 1.1));
    }

    #[test]
    fn test_local_is_never_removed_by_bigger_remote() {
        let mut rng = StdRng::seed_from_u64(33);
        let local = entity(&mut rng, Vec2::new(500.0, 500.0), 30.0);
        let giant = entity(&mut rng, Vec2::new(505.0, 500.0), 200.0);
        let mut world = world_with(local, vec![giant]);

        assert!(resolve(&mut world, &CollisionConfig::default()).is_empty());
        assert!(world.is_playing());
        assert_eq!(world.remotes().len(), 1);
    }

    #[test]
    fn test_only_dominant_side_fires() {
        let mut rng = StdRng::seed_from_u64(34);
        let big = entity(&mut rng, Vec2::ZERO, 40.0);
        let small = entity(&mut rng, Vec2::new(10.0, 0.0), 35.0);

        let mut big_view = world_with(big.clone(), vec![small.clone()]);
        let mut small_view = world_with(small, vec![big]);

        assert_eq!(resolve(&mut big_view, &CollisionConfig::default()).len(), 1);
        assert!(resolve(&mut small_view, &CollisionConfig::default()).is_empty());
    }

    #[test]
    fn test_no_session_no_eliminations() {
        let mut world = World::new(3000.0);
        assert!(resolve(&mut world, &CollisionConfig::default()).is_empty());
    }

    #[test]
    fn test_elimination_message() {
        let a = EntityId::from_random_bytes([1; 16]);
        let b = EntityId::from_random_bytes([2; 16]);
        let msg = Elimination { predator: a, prey: b }.message();
        assert_eq!(msg, SyncMessage::PlayerEaten { predator_id: a, prey_id: b });
    }
}
