//! Peer: one participant's session lifecycle.
//!
//! A peer owns its world store and its channel onto the broadcast domain.
//! Each session spawns two tasks: the frame loop and the ingestion handler.
//! When the frame loop sees the session end it detaches the ingestion
//! handler itself, so an elimination received from a rival tears the whole
//! session down without any help from the caller.

use crate::config::Config;
use crate::economy;
use crate::entity::Entity;
use crate::input::InputSource;
use crate::render::Renderer;
use crate::scheduler::{run_frame_loop, FrameScheduler};
use crate::sync::run_ingestion;
use crate::transport::{Transport, TransportError};
use crate::world::{SessionStatus, SharedWorld, World};
use protocol::{EntityId, SyncMessage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;
use tracing::{info, warn};

/// Why a session could not start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("display label must not be empty")]
    EmptyName,
    #[error("a session is already running")]
    AlreadyPlaying,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Trim a lobby label and cut it to `max_len` characters.
pub fn sanitize_name(label: &str, max_len: usize) -> Result<String, SessionError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(SessionError::EmptyName);
    }
    Ok(trimmed.chars().take(max_len).collect())
}

/// One participant in the broadcast domain.
pub struct Peer {
    config: Arc<Config>,
    world: SharedWorld,
    transport: Arc<dyn Transport>,
    rng: StdRng,
    frame_task: Option<JoinHandle<()>>,
    ingest_task: Option<AbortHandle>,
}

impl Peer {
    /// Create a peer with an OS-seeded random source.
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>) -> Self {
        Self::with_rng(config, transport, StdRng::from_os_rng())
    }

    /// Create a peer with a caller-provided random source. The food set is seeded here.
    pub fn with_rng(config: Arc<Config>, transport: Arc<dyn Transport>, mut rng: StdRng) -> Self {
        let mut world = World::new(config.arena.map_size);
        economy::seed(&mut world, &mut rng, &config);
        Self {
            config,
            world: Arc::new(RwLock::new(world)),
            transport,
            rng,
            frame_task: None,
            ingest_task: None,
        }
    }

    /// Shared handle on this peer's world store.
    pub fn world(&self) -> SharedWorld {
        self.world.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        self.world.read().await.status()
    }

    pub async fn local(&self) -> Option<Entity> {
        self.world.read().await.local().cloned()
    }

    /// Start a session: spawn a fresh local entity, attach ingestion, run frames.
    pub async fn start_session(
        &mut self,
        label: &str,
        input: Box<dyn InputSource>,
        renderer: Box<dyn Renderer>,
    ) -> Result<EntityId, SessionError> {
        let name = sanitize_name(label, self.config.player.max_name_length)?;
        if self.world.read().await.is_playing() {
            return Err(SessionError::AlreadyPlaying);
        }
        // A finished session may still hold handles.
        self.stop_tasks().await;
        let inbox = self.transport.subscribe()?;

        let entity = {
            let mut world = self.world.write().await;
            let entity = Entity::spawn(&mut self.rng, name, world.bounds(), &self.config);
            world.replace_local(entity.clone());
            entity
        };
        info!(
            "{} joined as {} at ({:.0}, {:.0})",
            entity.name, entity.id, entity.position.x, entity.position.y
        );

        let ingest = tokio::spawn(run_ingestion(self.world.clone(), inbox));
        let detach = ingest.abort_handle();
        self.ingest_task = Some(ingest.abort_handle());

        let scheduler = FrameScheduler::new(self.config.clone(), StdRng::from_rng(&mut self.rng));
        let world = self.world.clone();
        let transport = self.transport.clone();
        self.frame_task = Some(tokio::spawn(async move {
            run_frame_loop(scheduler, world, transport, input, renderer, Instant::now()).await;
            detach.abort();
        }));

        Ok(entity.id)
    }

    /// Wait until the running session ends and return the resulting status.
    ///
    /// Cancel-safe: dropping the future leaves the session running.
    pub async fn wait_for_end(&mut self) -> SessionStatus {
        if let Some(task) = self.frame_task.as_mut() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    warn!("Frame loop panicked: {}", e);
                }
            }
            self.frame_task = None;
        }
        self.status().await
    }

    /// Return to the lobby, dropping the local entity and every remote record.
    pub async fn reset(&mut self) {
        self.stop_tasks().await;
        self.world.write().await.reset();
        info!("Peer reset to lobby");
    }

    /// Leave gracefully: announce a disconnect for the local entity and reset.
    pub async fn leave(&mut self) {
        self.stop_tasks().await;
        let local_id = {
            let mut world = self.world.write().await;
            let id = world.local_id();
            world.reset();
            id
        };
        if let Some(id) = local_id {
            self.transport.send(&SyncMessage::PlayerDisconnect { id });
            info!("Left the domain as {}", id);
        }
    }

    /// Leave and release the channel.
    pub async fn shutdown(mut self) {
        self.leave().await;
        self.transport.close();
    }

    async fn stop_tasks(&mut self) {
        if let Some(ingest) = self.ingest_task.take() {
            ingest.abort();
        }
        if let Some(task) = self.frame_task.take() {
            task.abort();
            // Make sure no frame is still sending once we return.
            let _ = task.await;
        }
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        if let Some(ingest) = self.ingest_task.take() {
            ingest.abort();
        }
        if let Some(task) = self.frame_task.take() {
            task.abort();
        }
    }
}
