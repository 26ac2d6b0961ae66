//! Food economy: consumption against the local entity and throttled respawn.

use crate::config::Config;
use crate::entity::Food;
use crate::world::World;
use rand::Rng;
use tracing::debug;

/// Fill the food set up to the target population.
pub fn seed<R: Rng>(world: &mut World, rng: &mut R, config: &Config) {
    let missing = config.food.target_count.saturating_sub(world.food().len());
    for _ in 0..missing {
        let food = Food::spawn(rng, world.bounds(), &config.palette.colors);
        world.add_food(food);
    }
    debug!("Seeded {} food particles", missing);
}

/// Eat every particle whose center lies strictly inside the local entity.
///
/// Particles are tested in order against the radius as it grows, and the
/// particle's own radius plays no part. Returns how many were eaten.
pub fn consume(world: &mut World, config: &Config) -> usize {
    let Some((local, food)) = world.local_and_food_mut() else {
        return 0;
    };

    let before = food.len();
    food.retain(|particle| {
        if local.distance_to(particle.position) < local.radius {
            local.eat_food(config.food.growth, config.food.points);
            false
        } else {
            true
        }
    });
    before - food.len()
}

/// Spawn at most one particle if the population is below target.
pub fn respawn<R: Rng>(world: &mut World, rng: &mut R, config: &Config) -> bool {
    if world.food().len() >= config.food.target_count {
        return false;
    }
    let food = Food::spawn(rng, world.bounds(), &config.palette.colors);
    world.add_food(food);
    true
}
