// THEORY:
// Configuration for a render session. `RenderConfig` drives the per-frame
// engine and is immutable for the duration of a cycle; `PlaybackConfig`
// drives the host's frame clock; `AppConfig` bundles both with the ordered
// prefab list and is what the binary reads from TOML.
//
// Everything is validated once, up front. A config that passes `validate`
// can never make the engine divide by zero or index past the grid.

use crate::error::{RenderError, RenderResult};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_PLAYBACK_SPEED: f32 = 10.0;

/// How a frame's samples are walked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// One ordered pass on the calling task.
    #[default]
    Sequential,
    /// Fixed-size batches fanned out to the blocking pool and joined.
    Batched,
}

/// Settings for a single pixelize + reconcile cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Samples per grid row.
    pub grid_width: u32,
    /// Grid rows. Also the divisor for a sample's row, see `geometry::position`.
    pub grid_height: u32,
    /// World distance between neighbouring instances along x and z.
    pub axis_spacing: Vec2,
    /// Buckets to quantize into. `None` uses the prefab count; a value that
    /// disagrees with the prefab list surfaces as `ConfigMismatch` at reconcile.
    pub bucket_count: Option<usize>,
    /// Skip samples that fall in the darkest bucket.
    pub suppress_darkest: bool,
    /// Mirror the bucket order (brightest prefab for the darkest samples).
    pub invert_buckets: bool,
    /// Samples per batch in `ExecutionStrategy::Batched`.
    pub batch_size: usize,
    /// World position of grid cell (0, 0).
    pub origin_offset: Vec3,
    pub strategy: ExecutionStrategy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            grid_width: 64,
            grid_height: 48,
            axis_spacing: Vec2::ONE,
            bucket_count: None,
            suppress_darkest: false,
            invert_buckets: false,
            batch_size: 64,
            origin_offset: Vec3::ZERO,
            strategy: ExecutionStrategy::Sequential,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(RenderError::degenerate(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if self.bucket_count == Some(0) {
            return Err(RenderError::degenerate("bucket_count must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(RenderError::degenerate("batch_size must be at least 1"));
        }
        if !self.axis_spacing.is_finite() || !self.origin_offset.is_finite() {
            return Err(RenderError::degenerate("spacing and origin must be finite"));
        }
        Ok(())
    }

    /// Buckets to quantize into for a palette of `prefab_count` prefabs.
    pub fn resolved_bucket_count(&self, prefab_count: usize) -> usize {
        self.bucket_count.unwrap_or(prefab_count)
    }

    /// Samples a frame of this grid is expected to carry.
    pub fn sample_count(&self) -> usize {
        self.grid_width as usize * self.grid_height as usize
    }
}

/// Settings for the host's frame clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Native frame rate of the source.
    pub frames_per_second: f32,
    /// Multiplier on `frames_per_second`, in (0, 10].
    pub playback_speed: f32,
    /// Restart the source when it runs out.
    pub looping: bool,
    /// Drop frames instead of queueing them when a cycle runs long.
    pub skip_on_drop: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 30.0,
            playback_speed: 1.0,
            looping: false,
            skip_on_drop: true,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if !(self.frames_per_second.is_finite() && self.frames_per_second > 0.0) {
            return Err(RenderError::degenerate(format!(
                "frames_per_second must be positive, got {}",
                self.frames_per_second
            )));
        }
        if !(self.playback_speed > 0.0 && self.playback_speed <= MAX_PLAYBACK_SPEED) {
            return Err(RenderError::degenerate(format!(
                "playback_speed must be in (0, {MAX_PLAYBACK_SPEED}], got {}",
                self.playback_speed
            )));
        }
        Ok(())
    }

    /// Wall-clock time between two frames at the configured speed.
    pub fn frame_interval(&self) -> std::time::Duration {
        let rate = self.frames_per_second as f64 * self.playback_speed as f64;
        std::time::Duration::from_secs_f64(1.0 / rate)
    }
}

/// Everything the binary needs to start a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Prefab identifiers ordered darkest to brightest.
    pub prefabs: Vec<String>,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prefabs: ["black", "dark_gray", "light_gray", "white"]
                .into_iter()
                .map(String::from)
                .collect(),
            render: RenderConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> RenderResult<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> RenderResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> RenderResult<()> {
        if self.prefabs.is_empty() {
            return Err(RenderError::degenerate("at least one prefab is required"));
        }
        self.render.validate()?;
        self.playback.validate()
    }
}
