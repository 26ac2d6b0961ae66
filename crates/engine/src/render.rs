//! Render hook.
//!
//! Drawing is done by an external collaborator. The frame loop hands it a
//! read-only snapshot after physics and before sync.

use crate::entity::{Entity, Food};
use crate::leaderboard::leaderboard;
use crate::world::{MapBounds, World};
use glam::Vec2;
use protocol::EntityId;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Everything a renderer may look at for one frame.
#[derive(Debug, Clone, Copy)]
pub struct WorldSnapshot<'a> {
    pub world: &'a World,
    pub local: &'a Entity,
    pub remotes: &'a HashMap<EntityId, Entity>,
    pub food: &'a [Food],
    pub bounds: &'a MapBounds,
    /// Viewport size in screen pixels.
    pub viewport: Vec2,
    /// World-to-screen translation that keeps the local entity centered.
    pub viewport_anchor: Vec2,
    /// Radius food particles are drawn with.
    pub food_radius: f32,
}

impl<'a> WorldSnapshot<'a> {
    /// Snapshot for a viewport of the given size. None without a local entity.
    pub fn capture(world: &'a World, viewport: Vec2, food_radius: f32) -> Option<Self> {
        let local = world.local()?;
        Some(Self {
            world,
            local,
            remotes: world.remotes(),
            food: world.food(),
            bounds: world.bounds(),
            viewport,
            viewport_anchor: viewport / 2.0 - local.position,
            food_radius,
        })
    }

    /// Screen coordinate of a world point.
    #[inline]
    pub fn to_screen(&self, point: Vec2) -> Vec2 {
        point + self.viewport_anchor
    }

    /// Food particles whose drawn circle overlaps the viewport.
    pub fn visible_food(&self) -> impl Iterator<Item = &'a Food> + '_ {
        let r = self.food_radius;
        self.food.iter().filter(move |food| {
            let p = self.to_screen(food.position);
            p.x + r >= 0.0 && p.y + r >= 0.0 && p.x - r <= self.viewport.x && p.y - r <= self.viewport.y
        })
    }

    /// Floored position and score, as shown in the status bar.
    pub fn hud(&self) -> Hud {
        Hud {
            x: self.local.position.x.floor() as i64,
            y: self.local.position.y.floor() as i64,
            score: self.local.score.floor() as i64,
        }
    }
}

/// Status bar values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hud {
    pub x: i64,
    pub y: i64,
    pub score: i64,
}

/// External scene drawer.
pub trait Renderer: Send {
    fn render(&mut self, snapshot: &WorldSnapshot<'_>);
}

/// Renderer that writes frame summaries to the log.
///
/// Per-frame lines go to `debug`; the leaderboard is written at `info`
/// every `report_every` when reporting is enabled.
pub struct LogRenderer {
    label: String,
    leaderboard_size: usize,
    report_every: Option<Duration>,
    last_report: Option<Instant>,
    frames: u64,
}

impl LogRenderer {
    pub fn new(label: impl Into<String>, leaderboard_size: usize) -> Self {
        Self {
            label: label.into(),
            leaderboard_size,
            report_every: None,
            last_report: None,
            frames: 0,
        }
    }

    /// Also log the leaderboard at `info` this often.
    pub fn with_report(mut self, every: Duration) -> Self {
        self.report_every = Some(every);
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn report_due(&mut self) -> bool {
        let Some(every) = self.report_every else {
            return false;
        };
        let now = Instant::now();
        match self.last_report {
            Some(last) if now.duration_since(last) < every => false,
            _ => {
                self.last_report = Some(now);
                true
            }
        }
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, snapshot: &WorldSnapshot<'_>) {
        self.frames += 1;
        let hud = snapshot.hud();
        debug!(
            "[{}] frame {} pos ({}, {}) score {} | {} rivals, {}/{} food on screen",
            self.label,
            self.frames,
            hud.x,
            hud.y,
            hud.score,
            snapshot.remotes.len(),
            snapshot.visible_food().count(),
            snapshot.food.len()
        );

        if self.report_due() {
            let board = leaderboard(snapshot.world, self.leaderboard_size);
            let lines: Vec<String> = board
                .iter()
                .enumerate()
                .map(|(i, e)| format!("{}. {}{} {}", i + 1, e.name, if e.is_local { "*" } else { "" }, e.score))
                .collect();
            info!("[{}] Leaderboard: {}", self.label, lines.join(" | "));
        }
    }
}
