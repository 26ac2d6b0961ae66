//! Synchronization protocol: ingestion of messages from the broadcast domain.
//!
//! Ingestion touches the world only through its record-level API, so a
//! frame never observes a half-applied message.

use crate::entity::Entity;
use crate::transport::Inbox;
use crate::world::{SharedWorld, Upsert, World};
use protocol::{EntityId, SyncMessage};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// What applying one message did to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// A remote record was created or overwritten.
    Upserted(Upsert),
    /// Our own state-update echoed back by the broadcast; dropped.
    SelfEcho,
    /// A remote left; `removed` is false when it was not tracked.
    Disconnected { removed: bool },
    /// We were absorbed by `predator`; the session is over.
    LocalEliminated { predator: EntityId },
    /// Our own elimination announcement echoed back; already applied.
    OwnAnnouncement,
    /// Two other participants fought; the prey is no longer tracked.
    ThirdPartyEliminated { removed: bool },
    /// Unrecognized discriminator.
    Ignored,
}

/// Apply one message to the world.
pub fn apply(world: &mut World, message: SyncMessage) -> Ingested {
    let local_id = world.local_id();
    match message {
        SyncMessage::PlayerUpdate { player } => match world.upsert_remote(Entity::from(player)) {
            Upsert::IsLocal => Ingested::SelfEcho,
            outcome => Ingested::Upserted(outcome),
        },
        SyncMessage::PlayerDisconnect { id } => Ingested::Disconnected {
            removed: world.remove_remote(&id).is_some(),
        },
        SyncMessage::PlayerEaten { predator_id, prey_id } => {
            if local_id == Some(prey_id) {
                world.clear_local();
                Ingested::LocalEliminated { predator: predator_id }
            } else if local_id == Some(predator_id) {
                Ingested::OwnAnnouncement
            } else {
                Ingested::ThirdPartyEliminated {
                    removed: world.eliminate_remote(&prey_id).is_some(),
                }
            }
        }
        SyncMessage::Unknown => Ingested::Ignored,
    }
}

/// Drain `inbox` into `world` until the domain closes or the task is aborted.
///
/// Undecodable frames and receiver overruns are logged and skipped.
pub async fn run_ingestion(world: SharedWorld, mut inbox: Inbox) {
    loop {
        let frame = match inbox.recv().await {
            Ok(frame) => frame,
            Err(RecvError::Lagged(missed)) => {
                warn!("Ingestion lagged, {} frames dropped", missed);
                continue;
            }
            Err(RecvError::Closed) => {
                debug!("Broadcast domain closed, ingestion stopped");
                return;
            }
        };

        let message = match SyncMessage::decode(&frame) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping sync frame: {}", e);
                continue;
            }
        };

        let kind = message.kind();
        let outcome = {
            let mut world = world.write().await;
            apply(&mut world, message)
        };

        match outcome {
            Ingested::LocalEliminated { predator } => info!("Local entity consumed by {}", predator),
            Ingested::Ignored => debug!("Ignoring sync message with unknown type"),
            Ingested::ThirdPartyEliminated { removed: true } => debug!("Remote entity eliminated"),
            other => debug!("{} -> {:?}", kind, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Fixture {
        world: World,
        local: Entity,
        remote: Entity,
        other: Entity,
    }

    fn fixture() -> Fixture {
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(41);
        let mut world = World::new(config.arena.map_size);
        let local = Entity::spawn(&mut rng, "me".into(), world.bounds(), &config);
        let remote = Entity::spawn(&mut rng, "remote".into(), world.bounds(), &config);
        let other = Entity::spawn(&mut rng, "other".into(), world.bounds(), &config);
        world.replace_local(local.clone());
        world.upsert_remote(remote.clone());
        world.upsert_remote(other.clone());
        Fixture { world, local, remote, other }
    }

    fn update(entity: &Entity) -> SyncMessage {
        SyncMessage::PlayerUpdate { player: entity.state() }
    }

    fn eaten(predator: &Entity, prey: &Entity) -> SyncMessage {
        SyncMessage::PlayerEaten {
            predator_id: predator.id,
            prey_id: prey.id,
        }
    }

    #[test]
    fn test_update_twice_is_idempotent() {
        let mut f = fixture();
        let mut moved = f.remote.clone();
        moved.position += Vec2::new(3.0, 4.0);

        assert_eq!(apply(&mut f.world, update(&moved)), Ingested::Upserted(Upsert::Replaced));
        let after_first = f.world.remotes().clone();
        assert_eq!(apply(&mut f.world, update(&moved)), Ingested::Upserted(Upsert::Unchanged));
        assert_eq!(f.world.remotes(), &after_first);
    }

    #[test]
    fn test_stale_update_overwrites() {
        let mut f = fixture();
        let mut newer = f.remote.clone();
        newer.last_update = 200;
        newer.radius = 40.0;
        let mut older = f.remote.clone();
        older.last_update = 100;

        apply(&mut f.world, update(&newer));
        apply(&mut f.world, update(&older));
        assert_eq!(f.world.remote(&f.remote.id), Some(&older));
    }

    #[test]
    fn test_self_update_is_filtered() {
        let mut f = fixture();
        let mut echo = f.local.clone();
        echo.radius = 99.0;

        assert_eq!(apply(&mut f.world, update(&echo)), Ingested::SelfEcho);
        assert!(f.world.remote(&f.local.id).is_none());
        assert_eq!(f.world.local().unwrap().radius, 30.0);
    }

    #[test]
    fn test_first_update_creates_remote() {
        let mut f = fixture();
        let config = Config::default();
        let mut rng = StdRng::seed_from_u64(42);
        let newcomer = Entity::spawn(&mut rng, "new".into(), f.world.bounds(), &config);

        assert_eq!(apply(&mut f.world, update(&newcomer)), Ingested::Upserted(Upsert::Inserted));
        assert_eq!(f.world.remote(&newcomer.id), Some(&newcomer));
    }

    #[test]
    fn test_disconnect_removes() {
        let mut f = fixture();
        let msg = SyncMessage::PlayerDisconnect { id: f.remote.id };
        assert_eq!(apply(&mut f.world, msg.clone()), Ingested::Disconnected { removed: true });
        assert_eq!(apply(&mut f.world, msg), Ingested::Disconnected { removed: false });
        assert!(f.world.remote(&f.remote.id).is_none());
    }

    #[test]
    fn test_eaten_as_prey_ends_session() {
        let mut f = fixture();
        let msg = eaten(&f.remote, &f.local);
        assert_eq!(
            apply(&mut f.world, msg.clone()),
            Ingested::LocalEliminated { predator: f.remote.id }
        );
        assert!(f.world.local().is_none());
        assert_eq!(f.world.status(), crate::world::SessionStatus::GameOver);
        assert_eq!(f.world.remotes().len(), 2);

        // A duplicate finds no local entity and falls through to removal of an untracked id.
        assert_eq!(apply(&mut f.world, msg), Ingested::ThirdPartyEliminated { removed: false });
        assert_eq!(f.world.remotes().len(), 2);
    }

    #[test]
    fn test_own_update_after_elimination_is_dropped() {
        let mut f = fixture();
        let in_flight = update(&f.local);
        apply(&mut f.world, eaten(&f.remote, &f.local));

        assert_eq!(apply(&mut f.world, in_flight), Ingested::SelfEcho);
        assert!(f.world.remote(&f.local.id).is_none());
        assert_eq!(f.world.remotes().len(), 2);
    }

    #[test]
    fn test_own_announcement_is_noop() {
        let mut f = fixture();
        let msg = eaten(&f.local, &f.remote);
        assert_eq!(apply(&mut f.world, msg), Ingested::OwnAnnouncement);
        assert!(f.world.is_playing());
        assert!(f.world.remote(&f.remote.id).is_some());
    }

    #[test]
    fn test_third_party_elimination() {
        let mut f = fixture();
        let msg = eaten(&f.other, &f.remote);
        assert_eq!(apply(&mut f.world, msg.clone()), Ingested::ThirdPartyEliminated { removed: true });
        assert!(f.world.remote(&f.remote.id).is_none());
        assert!(f.world.remote(&f.other.id).is_some());
        assert!(f.world.is_playing());
        assert_eq!(apply(&mut f.world, msg), Ingested::ThirdPartyEliminated { removed: false });
        assert_eq!(
            apply(&mut f.world, update(&f.remote)),
            Ingested::Upserted(Upsert::Eliminated)
        );
        assert!(f.world.remote(&f.remote.id).is_none());
    }

    #[test]
    fn test_unknown_is_ignored() {
        let mut f = fixture();
        assert_eq!(apply(&mut f.world, SyncMessage::Unknown), Ingested::Ignored);
        assert_eq!(f.world.remotes().len(), 2);
    }
}
