//! Engine configuration.

use protocol::Color;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "nebula.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub collision: CollisionConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
}

/// A configuration value outside its legal range.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be positive")]
    NotPositive(&'static str),
    #[error("collision.dominance_margin must be greater than 1 (got {0})")]
    DominanceMargin(f32),
    #[error("palette.colors must not be empty")]
    EmptyPalette,
}

impl Config {
    /// Load configuration from `nebula.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load configuration from `path`, writing the defaults there when it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let config: Self = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("arena.map_size", self.arena.map_size),
            ("player.initial_radius", self.player.initial_radius),
            ("player.speed_ref_distance", self.player.speed_ref_distance),
            ("food.growth", self.food.growth),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive(name));
            }
        }
        if self.sync.interval_ms == 0 {
            return Err(ConfigError::NotPositive("sync.interval_ms"));
        }
        if self.sync.capacity == 0 {
            return Err(ConfigError::NotPositive("sync.capacity"));
        }
        if self.frame.interval_ms == 0 {
            return Err(ConfigError::NotPositive("frame.interval_ms"));
        }
        if !(self.collision.dominance_margin > 1.0) {
            return Err(ConfigError::DominanceMargin(self.collision.dominance_margin));
        }
        if self.palette.colors.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(())
    }
}

/// Arena geometry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArenaConfig {
    /// Side length of the square map. Shared by every participant.
    #[serde(default = "default_map_size")]
    pub map_size: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            map_size: default_map_size(),
        }
    }
}

fn default_map_size() -> f32 {
    3000.0
}

/// Local entity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_initial_radius")]
    pub initial_radius: f32,
    /// Speed at the initial radius with the pointer at the reference distance.
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
    /// Pointer distance (screen px) that yields the base speed.
    #[serde(default = "default_speed_ref_distance")]
    pub speed_ref_distance: f32,
    /// Cap on the pointer-distance multiplier.
    #[serde(default = "default_max_speed_mult")]
    pub max_speed_mult: f32,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_radius: default_initial_radius(),
            base_speed: default_base_speed(),
            speed_ref_distance: default_speed_ref_distance(),
            max_speed_mult: default_max_speed_mult(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_initial_radius() -> f32 {
    30.0
}
fn default_base_speed() -> f32 {
    4.0
}
fn default_speed_ref_distance() -> f32 {
    100.0
}
fn default_max_speed_mult() -> f32 {
    1.5
}
fn default_max_name_length() -> usize {
    15
}

/// Food configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Population the economy keeps topping up to.
    #[serde(default = "default_food_target")]
    pub target_count: usize,
    /// Drawing radius only; the consumption test ignores it.
    #[serde(default = "default_food_radius")]
    pub radius: f32,
    /// Radius gained per particle.
    #[serde(default = "default_food_growth")]
    pub growth: f32,
    /// Score gained per particle.
    #[serde(default = "default_food_points")]
    pub points: f32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            target_count: default_food_target(),
            radius: default_food_radius(),
            growth: default_food_growth(),
            points: default_food_points(),
        }
    }
}

fn default_food_target() -> usize {
    300
}
fn default_food_radius() -> f32 {
    6.0
}
fn default_food_growth() -> f32 {
    0.5
}
fn default_food_points() -> f32 {
    1.0
}

/// Absorption rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollisionConfig {
    /// Predator radius must exceed prey radius times this.
    #[serde(default = "default_dominance_margin")]
    pub dominance_margin: f32,
    /// Share of the prey's radius the predator gains.
    #[serde(default = "default_absorb_growth")]
    pub absorb_growth: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            dominance_margin: default_dominance_margin(),
            absorb_growth: default_absorb_growth(),
        }
    }
}

fn default_dominance_margin() -> f32 {
    1.1
}
fn default_absorb_growth() -> f32 {
    0.5
}

/// Broadcast domain settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    /// Name of the broadcast domain every peer joins.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Minimum time between two state-updates of the local entity.
    #[serde(default = "default_sync_interval")]
    pub interval_ms: u64,
    /// Frames buffered per receiver before a slow peer starts losing messages.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            interval_ms: default_sync_interval(),
            capacity: default_capacity(),
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_channel() -> String {
    "nebula_blobs_sync".to_string()
}
fn default_sync_interval() -> u64 {
    16
}
fn default_capacity() -> usize {
    1024
}

/// Frame scheduler settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrameConfig {
    /// Display refresh period.
    #[serde(default = "default_frame_interval")]
    pub interval_ms: u64,
    /// Frames slower than this share of the interval are logged.
    #[serde(default = "default_frame_budget")]
    pub budget_ratio: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_frame_interval(),
            budget_ratio: default_frame_budget(),
        }
    }
}

impl FrameConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_frame_interval() -> u64 {
    16
}
fn default_frame_budget() -> f64 {
    0.9
}

/// Settings of the `nebula` demo binary.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoConfig {
    /// Autopiloted peers sharing the in-process domain.
    #[serde(default = "default_peers")]
    pub peers: usize,
    /// Seconds to run before leaving (0 = until Ctrl-C).
    #[serde(default = "default_run_secs")]
    pub run_secs: u64,
    /// Delay before an eliminated peer rejoins.
    #[serde(default = "default_respawn_delay")]
    pub respawn_delay_ms: u64,
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    /// Seconds between leaderboard log lines.
    #[serde(default = "default_report_secs")]
    pub report_secs: u64,
    /// Simulated viewport size handed to the autopilot.
    #[serde(default = "default_viewport")]
    pub viewport: [f32; 2],
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            peers: default_peers(),
            run_secs: default_run_secs(),
            respawn_delay_ms: default_respawn_delay(),
            leaderboard_size: default_leaderboard_size(),
            report_secs: default_report_secs(),
            viewport: default_viewport(),
        }
    }
}

fn default_peers() -> usize {
    4
}
fn default_run_secs() -> u64 {
    60
}
fn default_respawn_delay() -> u64 {
    1500
}
fn default_leaderboard_size() -> usize {
    10
}
fn default_report_secs() -> u64 {
    5
}
fn default_viewport() -> [f32; 2] {
    [1280.0, 720.0]
}

/// Colors handed out to entities and food.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaletteConfig {
    #[serde(default = "default_colors")]
    pub colors: Vec<Color>,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colors: default_colors(),
        }
    }
}

fn default_colors() -> Vec<Color> {
    vec![
        Color::new(0xef, 0x44, 0x44),
        Color::new(0x3b, 0x82, 0xf6),
        Color::new(0x10, 0xb9, 0x81),
        Color::new(0xf5, 0x9e, 0x0b),
        Color::new(0x8b, 0x5c, 0xf6),
        Color::new(0xec, 0x48, 0x99),
        Color::new(0x06, 0xb6, 0xd4),
        Color::new(0x84, 0xcc, 0x16),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[collision]\ndominance_margin = 1.25\n").unwrap();
        assert_eq!(config.collision.dominance_margin, 1.25);
        assert_eq!(config.collision.absorb_growth, 0.5);
        assert_eq!(config.arena.map_size, 3000.0);
        assert_eq!(config.palette.colors.len(), 8);
    }

    #[test]
    fn test_palette_round_trips_as_hex() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("\"#ef4444\""));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.palette.colors, default_colors());
    }

    #[test]
    fn test_rejects_weak_margin() {
        let mut config = Config::default();
        config.collision.dominance_margin = 1.0;
        assert_eq!(config.validate(), Err(ConfigError::DominanceMargin(1.0)));
    }

    #[test]
    fn test_rejects_empty_palette() {
        let mut config = Config::default();
        config.palette.colors.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyPalette));
    }
}
