//! Peer-synchronized growth arena engine.
//!
//! Every peer simulates its own entity, eats food locally and resolves
//! absorptions against the rivals it has heard about. State reaches the
//! other peers through a named broadcast domain as JSON sync messages.

pub mod ai;
pub mod collision;
pub mod config;
pub mod economy;
pub mod entity;
pub mod input;
pub mod leaderboard;
pub mod movement;
pub mod peer;
pub mod render;
pub mod scheduler;
pub mod sync;
pub mod transport;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use entity::{Entity, Food};
pub use input::{InputSource, PointerFeed, PointerInput};
pub use leaderboard::{leaderboard, LeaderboardEntry};
pub use peer::{Peer, SessionError};
pub use render::{LogRenderer, Renderer, WorldSnapshot};
pub use transport::{BroadcastDomain, Channel, Transport, TransportError};
pub use world::{MapBounds, SessionStatus, SharedWorld, World};
