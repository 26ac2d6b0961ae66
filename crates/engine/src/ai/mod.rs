//! Synthetic pointer input for unattended peers.

mod autopilot;

pub use autopilot::{bot_name, Autopilot};
