//! Engine configuration.
//!
//! The completion thresholds and explore-video rules live in authoring
//! data upstream; the engine treats all of them as injected values with
//! sensible defaults rather than baked-in constants.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// How many watch events an explore video type requires before its reward
/// fires, when no explicit threshold is configured.
const DEFAULT_WATCH_THRESHOLD: u32 = 1;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Completion percentage a single watch must reach for a video to count
    pub video_completion_threshold: f32,
    /// Distinct reading events required to complete a book
    pub book_reading_threshold: u32,
    /// Stars granted for an explore video whose type has no explicit amount
    pub default_explore_star_amount: u32,
    /// Per-video-type total watch events required before the reward fires
    pub explore_watch_thresholds: HashMap<String, u32>,
    /// Per-video-type star amounts for explore videos
    pub explore_star_amounts: HashMap<String, u32>,
    /// Video types that never yield a reward regardless of watch behavior
    pub replay_video_types: HashSet<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            video_completion_threshold: 80.0,
            book_reading_threshold: 5,
            default_explore_star_amount: 10,
            explore_watch_thresholds: HashMap::new(),
            explore_star_amounts: HashMap::new(),
            replay_video_types: HashSet::from(["replay".to_string()]),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Total watch events required before an explore video of this type
    /// earns its reward.
    pub fn watch_threshold(&self, video_type: &str) -> u32 {
        self.explore_watch_thresholds
            .get(video_type)
            .copied()
            .unwrap_or(DEFAULT_WATCH_THRESHOLD)
            .max(1)
    }

    /// Stars granted for an explore video of this type.
    pub fn explore_star_amount(&self, video_type: &str) -> u32 {
        self.explore_star_amounts
            .get(video_type)
            .copied()
            .unwrap_or(self.default_explore_star_amount)
    }

    /// Whether this video type is reward-exempt replay content.
    pub fn is_replay(&self, video_type: &str) -> bool {
        self.replay_video_types.contains(video_type)
    }

    /// Clamp a reported completion percentage into [0, 100].
    pub fn clamp_percentage(percentage: f32) -> f32 {
        percentage.clamp(0.0, 100.0)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
