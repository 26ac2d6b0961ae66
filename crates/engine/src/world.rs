//! World state management.
//!
//! The world is the single store shared by a peer's frame loop and its
//! ingestion task. Every edit goes through one of the methods below and
//! replaces whole records; nothing outside this module touches the fields.

use crate::entity::{Entity, Food};
use glam::Vec2;
use protocol::{Color, EntityId};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// World store shared between a peer's frame loop and its ingestion task.
pub type SharedWorld = Arc<RwLock<World>>;

/// Session lifecycle as seen by the lobby and game-over collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No session yet, or reset after a game over.
    #[default]
    Lobby,
    /// A local entity exists and the frame loop is running.
    Playing,
    /// The local entity was absorbed by a peer.
    GameOver,
}

/// Square map `[0, side] x [0, side]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    side: f32,
}

impl MapBounds {
    pub fn new(side: f32) -> Self {
        Self { side }
    }

    #[inline]
    pub fn side(&self) -> f32 {
        self.side
    }

    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.side).contains(&point.x) && (0.0..=self.side).contains(&point.y)
    }

    /// Clamp each axis independently into the map.
    #[inline]
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x.clamp(0.0, self.side), point.y.clamp(0.0, self.side))
    }

    /// Get a uniformly random position within the map.
    #[inline]
    pub fn random_position<R: Rng>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            rng.random_range(0.0..=self.side),
            rng.random_range(0.0..=self.side),
        )
    }
}

/// Pick a palette color; black when the palette is empty.
#[inline]
pub fn random_color<R: Rng>(rng: &mut R, palette: &[Color]) -> Color {
    palette.choose(rng).copied().unwrap_or_default()
}

/// Outcome of [`World::upsert_remote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// First message seen for this identity.
    Inserted,
    /// An existing record was overwritten with different data.
    Replaced,
    /// The record was already identical.
    Unchanged,
    /// The identity is the local entity's; nothing was written.
    IsLocal,
    /// The identity was eliminated earlier; a late update does not revive it.
    Eliminated,
}

/// The world seen by one participant.
#[derive(Debug)]
pub struct World {
    local: Option<Entity>,
    remotes: HashMap<EntityId, Entity>,
    /// Identities this peer owned in earlier sessions. Late echoes of them are not remotes.
    retired: HashSet<EntityId>,
    /// Remote identities known to be absorbed.
    eliminated: HashSet<EntityId>,
    food: Vec<Food>,
    bounds: MapBounds,
    status: SessionStatus,
}

impl World {
    /// Create an empty world over a square map of the given side.
    pub fn new(side: f32) -> Self {
        Self {
            local: None,
            remotes: HashMap::with_capacity(16),
            retired: HashSet::new(),
            eliminated: HashSet::new(),
            food: Vec::with_capacity(512),
            bounds: MapBounds::new(side),
            status: SessionStatus::Lobby,
        }
    }

    #[inline]
    pub fn bounds(&self) -> &MapBounds {
        &self.bounds
    }

    #[inline]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// A session is active and its local entity is alive.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.status == SessionStatus::Playing && self.local.is_some()
    }

    #[inline]
    pub fn local(&self) -> Option<&Entity> {
        self.local.as_ref()
    }

    #[inline]
    pub fn local_id(&self) -> Option<EntityId> {
        self.local.as_ref().map(|e| e.id)
    }

    #[inline]
    pub fn remotes(&self) -> &HashMap<EntityId, Entity> {
        &self.remotes
    }

    #[inline]
    pub fn remote(&self, id: &EntityId) -> Option<&Entity> {
        self.remotes.get(id)
    }

    #[inline]
    pub fn food(&self) -> &[Food] {
        &self.food
    }

    /// Install a fresh local entity and enter the playing state.
    pub fn replace_local(&mut self, entity: Entity) {
        self.remotes.remove(&entity.id);
        self.local = Some(entity);
        self.status = SessionStatus::Playing;
    }

    /// Drop the local entity after an elimination. Idempotent.
    pub fn clear_local(&mut self) -> Option<Entity> {
        let cleared = self.local.take();
        if let Some(entity) = &cleared {
            self.retired.insert(entity.id);
            self.remotes.remove(&entity.id);
            self.status = SessionStatus::GameOver;
        }
        cleared
    }

    /// Whether `id` is the local entity or one this peer owned before.
    pub fn is_own(&self, id: &EntityId) -> bool {
        self.local_id().as_ref() == Some(id) || self.retired.contains(id)
    }

    /// Back to the pre-session state. Food is kept.
    pub fn reset(&mut self) {
        if let Some(entity) = self.local.take() {
            self.retired.insert(entity.id);
        }
        self.remotes.clear();
        self.status = SessionStatus::Lobby;
    }

    /// Insert or overwrite a remote record as a whole.
    pub fn upsert_remote(&mut self, entity: Entity) -> Upsert {
        if self.is_own(&entity.id) {
            return Upsert::IsLocal;
        }
        if self.eliminated.contains(&entity.id) {
            return Upsert::Eliminated;
        }
        match self.remotes.get(&entity.id) {
            Some(existing) if *existing == entity => Upsert::Unchanged,
            Some(_) => {
                self.remotes.insert(entity.id, entity);
                Upsert::Replaced
            }
            None => {
                self.remotes.insert(entity.id, entity);
                Upsert::Inserted
            }
        }
    }

    /// Drop a remote that was absorbed and refuse its later updates. Idempotent.
    pub fn eliminate_remote(&mut self, id: &EntityId) -> Option<Entity> {
        self.eliminated.insert(*id);
        self.remotes.remove(id)
    }

    /// Stop tracking a remote identity. Idempotent.
    pub fn remove_remote(&mut self, id: &EntityId) -> Option<Entity> {
        self.remotes.remove(id)
    }

    pub(crate) fn add_food(&mut self, food: Food) {
        self.food.push(food);
    }

    pub(crate) fn local_mut(&mut self) -> Option<&mut Entity> {
        self.local.as_mut()
    }

    pub(crate) fn local_and_food_mut(&mut self) -> Option<(&mut Entity, &mut Vec<Food>)> {
        self.local.as_mut().map(|local| (local, &mut self.food))
    }

    pub(crate) fn local_and_remotes_mut(
        &mut self,
    ) -> Option<(&mut Entity, &mut HashMap<EntityId, Entity>)> {
        self.local.as_mut().map(|local| (local, &mut self.remotes))
    }
}
