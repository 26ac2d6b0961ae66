//! Food particle.

use crate::world::{random_color, MapBounds};
use glam::Vec2;
use protocol::{Color, FoodId};
use rand::Rng;

/// A stationary food particle. Immutable once spawned.
#[derive(Debug, Clone, PartialEq)]
pub struct Food {
    pub id: FoodId,
    pub position: Vec2,
    pub color: Color,
}

impl Food {
    /// Spawn a particle uniformly inside `bounds` with a palette color.
    pub fn spawn<R: Rng>(rng: &mut R, bounds: &MapBounds, palette: &[Color]) -> Self {
        Self {
            id: FoodId::from_random_bytes(rng.random()),
            position: bounds.random_position(rng),
            color: random_color(rng, palette),
        }
    }
}
