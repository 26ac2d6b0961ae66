use crate::config::Config;
use crate::entity::Entity;
use crate::input::{InputSource, PointerInput};
use crate::world::World;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Bot names to use.
const BOT_NAMES: &[&str] = &[
    "Bot", "Hunter", "Hungry", "Nomnom", "Blob", "Cell", "Eater", "Seeker",
    "Roamer", "Wanderer", "Ghost", "Shadow", "Swift", "Tiny", "Big", "Mega",
];

/// Frames between two steering decisions.
const DECISION_FRAMES: u32 = 3;
/// How far the autopilot looks for food and rivals.
const SEARCH_RADIUS: f32 = 900.0;
/// Pointer offset from the viewport center; past the speed cap.
const POINTER_REACH: f32 = 200.0;

/// Pick a bot display name.
pub fn bot_name<R: Rng>(rng: &mut R, index: usize) -> String {
    let name = BOT_NAMES[rng.random_range(0..BOT_NAMES.len())];
    format!("{}{}", name, index % 100)
}

/// Steers toward food and weaker rivals and away from stronger ones.
///
/// Every visible object adds an influence vector weighted by inverse
/// distance; the pointer is placed along the normalized sum.
pub struct Autopilot {
    config: Arc<Config>,
    viewport: Vec2,
    rng: StdRng,
    /// Current world-space target.
    target: Vec2,
    decision_cooldown: u32,
}

impl Autopilot {
    pub fn new(config: Arc<Config>, viewport: Vec2, rng: StdRng) -> Self {
        Self {
            config,
            viewport,
            rng,
            target: Vec2::ZERO,
            decision_cooldown: 0,
        }
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    fn decide(&mut self, world: &World, me: &Entity) -> Vec2 {
        let margin = self.config.collision.dominance_margin;
        let mut result = Vec2::ZERO;

        for other in world.remotes().values() {
            let displacement = other.position - me.position;
            let mut dist = displacement.length();
            if dist > SEARCH_RADIUS + other.radius {
                continue;
            }

            let influence = if me.radius > other.radius * margin {
                other.radius / 10.0
            } else if other.radius > me.radius * margin {
                dist -= me.radius + other.radius;
                -(other.radius / me.radius).ln().max(0.1) * 20.0
            } else {
                -other.radius / me.radius
            };

            result += displacement.normalize_or_zero() * (influence / dist.max(1.0));
        }

        for food in world.food() {
            let displacement = food.position - me.position;
            let dist = displacement.length();
            if dist <= SEARCH_RADIUS {
                result += displacement.normalize_or_zero() / dist.max(1.0);
            }
        }

        let target = if result.length() > 1e-4 {
            me.position + result.normalize() * SEARCH_RADIUS
        } else {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            debug!("{} wandering", me.name);
            me.position + Vec2::new(angle.cos(), angle.sin()) * 400.0
        };
        world.bounds().clamp(target)
    }
}

impl InputSource for Autopilot {
    fn sample(&mut self, world: &World) -> PointerInput {
        let Some(me) = world.local() else {
            return PointerInput::idle(self.viewport);
        };

        if self.decision_cooldown == 0 {
            self.target = self.decide(world, me);
            self.decision_cooldown = DECISION_FRAMES;
        } else {
            self.decision_cooldown -= 1;
        }

        let heading = (self.target - me.position).normalize_or_zero();
        PointerInput::new(self.viewport / 2.0 + heading * POINTER_REACH, self.viewport)
    }
}
