//! Pointer input.
//!
//! The host delivers pointer moves at whatever rate it likes; the frame
//! loop samples the latest value once per frame.

use crate::world::World;
use glam::Vec2;
use tokio::sync::watch;

/// Pointer position and viewport size, both in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    pub pointer: Vec2,
    pub viewport: Vec2,
}

impl PointerInput {
    pub fn new(pointer: Vec2, viewport: Vec2) -> Self {
        Self { pointer, viewport }
    }

    /// Pointer resting on the viewport center (no movement).
    pub fn idle(viewport: Vec2) -> Self {
        Self::new(viewport / 2.0, viewport)
    }

    #[inline]
    pub fn viewport_center(&self) -> Vec2 {
        self.viewport / 2.0
    }
}

/// Anything the frame loop can read a pointer from.
pub trait InputSource: Send {
    /// Latest pointer state. `world` is read-only context for synthetic inputs.
    fn sample(&mut self, world: &World) -> PointerInput;
}

/// Host-driven pointer: the host pushes moves, the frame loop reads the latest.
pub struct PointerFeed {
    rx: watch::Receiver<PointerInput>,
}

impl PointerFeed {
    /// Create a feed and the sender the host pushes pointer moves into.
    pub fn channel(initial: PointerInput) -> (watch::Sender<PointerInput>, Self) {
        let (tx, rx) = watch::channel(initial);
        (tx, Self { rx })
    }
}

impl InputSource for PointerFeed {
    fn sample(&mut self, _world: &World) -> PointerInput {
        *self.rx.borrow_and_update()
    }
}
