//! Player entity (local or remote).

use crate::config::Config;
use crate::world::{random_color, MapBounds};
use glam::Vec2;
use protocol::{Color, EntityId, PlayerState};
use rand::Rng;

/// A circular blob owned by one participant.
///
/// Remote copies are only ever replaced whole from a [`PlayerState`];
/// radius and score grow only through [`Entity::eat_food`] and [`Entity::absorb`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub position: Vec2,
    pub radius: f32,
    pub color: Color,
    pub score: f32,
    /// Owner's monotonic clock (ms) at the last state-update emission.
    pub last_update: u64,
}

impl Entity {
    /// Create a fresh local entity at a random spot with a random palette color.
    pub fn spawn<R: Rng>(rng: &mut R, name: String, bounds: &MapBounds, config: &Config) -> Self {
        let radius = config.player.initial_radius;
        Self {
            id: EntityId::from_random_bytes(rng.random()),
            name,
            position: bounds.random_position(rng),
            radius,
            color: random_color(rng, &config.palette.colors),
            score: radius,
            last_update: 0,
        }
    }

    /// Grow after eating one food particle.
    #[inline]
    pub fn eat_food(&mut self, growth: f32, points: f32) {
        self.radius += growth;
        self.score += points;
    }

    /// Grow after absorbing `prey`: a share of its radius and all of its score.
    #[inline]
    pub fn absorb(&mut self, prey: &Entity, growth_factor: f32) {
        self.radius += prey.radius * growth_factor;
        self.score += prey.score;
    }

    #[inline]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }

    /// Wire snapshot of this entity.
    pub fn state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            name: self.name.clone(),
            pos: self.position,
            radius: self.radius,
            color: self.color,
            score: self.score,
            last_update: self.last_update,
        }
    }
}

impl From<PlayerState> for Entity {
    fn from(state: PlayerState) -> Self {
        Self {
            id: state.id,
            name: state.name,
            position: state.pos,
            radius: state.radius,
            color: state.color,
            score: state.score,
            last_update: state.last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_spawn_defaults() {
        let config = Config::default();
        let bounds = MapBounds::new(config.arena.map_size);
        let mut rng = StdRng::seed_from_u64(7);
        let entity = Entity::spawn(&mut rng, "blob".into(), &bounds, &config);

        assert_eq!(entity.radius, 30.0);
        assert_eq!(entity.score, 30.0);
        assert!(bounds.contains(entity.position));
        assert!(config.palette.colors.contains(&entity.color));
    }

    #[test]
    fn test_growth() {
        let config = Config::default();
        let bounds = MapBounds::new(config.arena.map_size);
        let mut rng = StdRng::seed_from_u64(1);
        let mut predator = Entity::spawn(&mut rng, "a".into(), &bounds, &config);
        let mut prey = Entity::spawn(&mut rng, "b".into(), &bounds, &config);
        predator.radius = 40.0;
        prey.radius = 35.0;
        prey.score = 12.0;

        predator.absorb(&prey, 0.5);
        assert_eq!(predator.radius, 57.5);
        assert_eq!(predator.score, 42.0);

        predator.eat_food(0.5, 1.0);
        assert_eq!(predator.radius, 58.0);
        assert_eq!(predator.score, 43.0);
    }

    #[test]
    fn test_state_conversion_keeps_identity() {
        let config = Config::default();
        let bounds = MapBounds::new(config.arena.map_size);
        let mut rng = StdRng::seed_from_u64(3);
        let entity = Entity::spawn(&mut rng, "blob".into(), &bounds, &config);
        assert_eq!(Entity::from(entity.state()), entity);
    }
}
