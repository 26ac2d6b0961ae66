//! Movement controller.
//!
//! Speed formula: `base * (initial_radius / radius) * min(d / ref, cap)`
//! where `d` is the pointer's distance from the viewport center.

use crate::config::PlayerConfig;
use crate::entity::Entity;
use crate::input::PointerInput;
use crate::world::MapBounds;
use glam::Vec2;

/// Per-frame displacement for an entity of `radius` steered by `input`.
///
/// A pointer resting on the center (or any degenerate vector) gives zero.
pub fn velocity(input: &PointerInput, radius: f32, config: &PlayerConfig) -> Vec2 {
    let delta = input.pointer - input.viewport_center();
    let distance = delta.length();
    if !(distance > 0.0) || !(radius > 0.0) {
        return Vec2::ZERO;
    }

    let angle = delta.y.atan2(delta.x);
    let size_factor = config.initial_radius / radius;
    let pointer_factor = (distance / config.speed_ref_distance).min(config.max_speed_mult);
    let speed = config.base_speed * size_factor * pointer_factor;

    Vec2::new(angle.cos(), angle.sin()) * speed
}

/// Move `entity` by `velocity` and clamp it into the map.
#[inline]
pub fn advance(entity: &mut Entity, velocity: Vec2, bounds: &MapBounds) {
    entity.position = bounds.clamp(entity.position + velocity);
}

/// Compute and apply one frame of movement. Returns the velocity used.
pub fn step(entity: &mut Entity, input: &PointerInput, config: &PlayerConfig, bounds: &MapBounds) -> Vec2 {
    let v = velocity(input, entity.radius, config);
    advance(entity, v, bounds);
    v
}
