//! Frame scheduler and main loop.
//!
//! One frame: input → movement → food → absorption → render → periodic sync.
//! The frame runs under the world write lock and returns the messages to
//! publish; they are sent after the lock is released.

use crate::collision;
use crate::config::Config;
use crate::economy;
use crate::input::{InputSource, PointerInput};
use crate::movement;
use crate::render::{Renderer, WorldSnapshot};
use crate::transport::Transport;
use crate::world::{SharedWorld, World};
use futures_util::FutureExt;
use protocol::SyncMessage;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Messages to publish once the world lock is released.
#[derive(Debug, Default)]
pub struct PendingBroadcasts {
    /// `PLAYER_EATEN` for every absorption this frame.
    pub eliminations: Vec<SyncMessage>,
    /// `PLAYER_UPDATE` when the sync interval elapsed.
    pub state_update: Option<SyncMessage>,
}

impl PendingBroadcasts {
    pub fn is_empty(&self) -> bool {
        self.eliminations.is_empty() && self.state_update.is_none()
    }

    /// Eliminations first, then the state-update.
    pub fn into_messages(self) -> impl Iterator<Item = SyncMessage> {
        self.eliminations.into_iter().chain(self.state_update)
    }
}

/// Per-session frame state.
pub struct FrameScheduler {
    config: Arc<Config>,
    rng: StdRng,
    last_sync: Option<Duration>,
    frame_count: u64,
}

impl FrameScheduler {
    pub fn new(config: Arc<Config>, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            last_sync: None,
            frame_count: 0,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Run one frame at session time `now`.
    ///
    /// Without an active session nothing happens and nothing is returned.
    pub fn step(
        &mut self,
        world: &mut World,
        input: &PointerInput,
        renderer: &mut dyn Renderer,
        now: Duration,
    ) -> PendingBroadcasts {
        let mut pending = PendingBroadcasts::default();
        if !world.is_playing() {
            return pending;
        }
        self.frame_count += 1;

        let bounds = *world.bounds();
        if let Some(local) = world.local_mut() {
            movement::step(local, input, &self.config.player, &bounds);
        }

        let eaten = economy::consume(world, &self.config);
        economy::respawn(world, &mut self.rng, &self.config);
        if eaten > 0 {
            debug!("Ate {} food", eaten);
        }

        pending.eliminations = collision::resolve(world, &self.config.collision)
            .iter()
            .map(|e| e.message())
            .collect();

        if let Some(snapshot) = WorldSnapshot::capture(world, input.viewport, self.config.food.radius) {
            renderer.render(&snapshot);
        }

        let due = self
            .last_sync
            .is_none_or(|last| now.saturating_sub(last) > self.config.sync.interval());
        if due {
            if let Some(local) = world.local_mut() {
                local.last_update = now.as_millis() as u64;
                pending.state_update = Some(SyncMessage::PlayerUpdate {
                    player: local.state(),
                });
                self.last_sync = Some(now);
            }
        }

        pending
    }
}

/// Run frames at the configured refresh rate until the session ends.
///
/// `clock` is the session's monotonic epoch for state-update timestamps.
pub async fn run_frame_loop(
    mut scheduler: FrameScheduler,
    world: SharedWorld,
    transport: Arc<dyn Transport>,
    mut input: Box<dyn InputSource>,
    mut renderer: Box<dyn Renderer>,
    clock: Instant,
) {
    let period = scheduler.config.frame.interval();
    let budget = period.as_secs_f64() * 1000.0 * scheduler.config.frame.budget_ratio;
    let mut ticker = interval_at(Instant::now() + period, period);
    // Skip missed frames rather than bursting to catch up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let scheduled = ticker.tick().await;

        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} frames to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        let pending = {
            let mut world = world.write().await;
            if !world.is_playing() {
                break;
            }
            let frame_start = std::time::Instant::now();
            let pointer = input.sample(&world);
            let pending = scheduler.step(&mut world, &pointer, renderer.as_mut(), clock.elapsed());

            let frame_ms = frame_start.elapsed().as_secs_f64() * 1000.0;
            if frame_ms > budget {
                warn!(
                    "Slow frame #{}: {:.3}ms (budget: {:.1}ms) - {} rivals, {} food",
                    scheduler.frame_count(),
                    frame_ms,
                    budget,
                    world.remotes().len(),
                    world.food().len()
                );
            }
            pending
        }; // Write lock released here

        for message in pending.into_messages() {
            transport.send(&message);
        }
    }

    info!("Frame loop stopped after {} frames", scheduler.frame_count());
}
