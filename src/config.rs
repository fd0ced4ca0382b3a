use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub field: FieldConfig,
    #[serde(default)]
    pub spawn: SpawnConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AudioConfig {
    /// Energy window duration in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u32,
    /// Number of trailing windows averaged into the loudness baseline.
    #[serde(default = "default_baseline_windows")]
    pub baseline_windows: usize,
}

/// Playfield geometry. Lanes stack along the vertical axis; obstacles
/// scroll right-to-left along the horizontal one.
#[derive(Clone, Debug, Deserialize)]
pub struct FieldConfig {
    #[serde(default = "default_lanes")]
    pub lanes: usize,
    #[serde(default = "default_field_width")]
    pub width: f32,
    #[serde(default = "default_field_height")]
    pub height: f32,
    /// Fixed player x position.
    #[serde(default = "default_player_x")]
    pub player_x: f32,
    /// Obstacles spawn this far to the right of the field edge.
    #[serde(default = "default_spawn_ahead")]
    pub spawn_ahead: f32,
    #[serde(default = "default_obstacle_width")]
    pub obstacle_width: f32,
    /// Scroll speed in px/s.
    #[serde(default = "default_obstacle_speed")]
    pub obstacle_speed: f32,
}

impl FieldConfig {
    pub fn lane_height(&self) -> f32 {
        self.height / self.lanes as f32
    }

    pub fn spawn_x(&self) -> f32 {
        self.width + self.spawn_ahead
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SpawnConfig {
    /// Energy-to-baseline ratio thresholds per tier.
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f32,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f32,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f32,
    /// Lane-count candidates per tier; repeats weight the pick.
    #[serde(default = "default_low_sizes")]
    pub low_sizes: Vec<usize>,
    #[serde(default = "default_medium_sizes")]
    pub medium_sizes: Vec<usize>,
    #[serde(default = "default_high_sizes")]
    pub high_sizes: Vec<usize>,
    #[serde(default = "default_min_spawn_interval_ms")]
    pub min_spawn_interval_ms: i64,
    #[serde(default = "default_heavy_cooldown_ms")]
    pub heavy_cooldown_ms: i64,
    /// Chance per eligible tick of a low spawn during quiet passages.
    #[serde(default = "default_quiet_spawn_chance")]
    pub quiet_spawn_chance: f32,
    /// Player inactivity required before a boredom spawn fires.
    #[serde(default = "default_boredom_idle_ms")]
    pub boredom_idle_ms: i64,
    /// Obstacle-free time near the player required before a boredom spawn fires.
    #[serde(default = "default_boredom_lull_ms")]
    pub boredom_lull_ms: i64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            baseline_windows: default_baseline_windows(),
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            lanes: default_lanes(),
            width: default_field_width(),
            height: default_field_height(),
            player_x: default_player_x(),
            spawn_ahead: default_spawn_ahead(),
            obstacle_width: default_obstacle_width(),
            obstacle_speed: default_obstacle_speed(),
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            low_threshold: default_low_threshold(),
            medium_threshold: default_medium_threshold(),
            high_threshold: default_high_threshold(),
            low_sizes: default_low_sizes(),
            medium_sizes: default_medium_sizes(),
            high_sizes: default_high_sizes(),
            min_spawn_interval_ms: default_min_spawn_interval_ms(),
            heavy_cooldown_ms: default_heavy_cooldown_ms(),
            quiet_spawn_chance: default_quiet_spawn_chance(),
            boredom_idle_ms: default_boredom_idle_ms(),
            boredom_lull_ms: default_boredom_lull_ms(),
        }
    }
}

fn default_fps() -> u32 { 60 }
fn default_window_ms() -> u32 { 100 }
fn default_baseline_windows() -> usize { 50 }
fn default_lanes() -> usize { 10 }
fn default_field_width() -> f32 { 800.0 }
fn default_field_height() -> f32 { 600.0 }
fn default_player_x() -> f32 { 100.0 }
fn default_spawn_ahead() -> f32 { 900.0 }
fn default_obstacle_width() -> f32 { 40.0 }
fn default_obstacle_speed() -> f32 { 300.0 }
fn default_low_threshold() -> f32 { 1.05 }
fn default_medium_threshold() -> f32 { 1.5 }
fn default_high_threshold() -> f32 { 2.2 }
fn default_low_sizes() -> Vec<usize> { vec![1, 1, 2] }
fn default_medium_sizes() -> Vec<usize> { vec![2, 3] }
fn default_high_sizes() -> Vec<usize> { vec![4, 5, 6] }
fn default_min_spawn_interval_ms() -> i64 { 150 }
fn default_heavy_cooldown_ms() -> i64 { 600 }
fn default_quiet_spawn_chance() -> f32 { 0.05 }
fn default_boredom_idle_ms() -> i64 { 500 }
fn default_boredom_lull_ms() -> i64 { 400 }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}
