//! Runtime configuration loaded from a TOML file.
//!
//! Every section falls back to its defaults, so an empty file (or one that
//! only sets `[actors]`) is valid.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::memory::layout::{Layout, timing};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub process: ProcessConfig,
    pub radar: RadarConfig,
    pub actors: ActorsConfig,
    pub retry: RetryConfig,
    pub debug: DebugConfig,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Process name or command-line suffix of the target
    pub name: String,
    /// Module whose executable section holds the signatures
    pub module: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            name: "GameThread".to_string(),
            module: "Win64-Shipping.exe".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Radar diameter in pixels
    pub window_size: u32,
    /// World units at the rim
    pub max_range: f64,
    pub fps: u32,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            window_size: 400,
            max_range: 20000.0,
            fps: timing::DEFAULT_FPS,
        }
    }
}

/// Name patterns that decide which actors are tracked and how they look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorsConfig {
    pub player_type_name: String,
    pub npc_prefixes: Vec<String>,
    pub npc: Vec<String>,
    pub mesh: Vec<String>,
    /// NPCs whose label goes below the marker
    pub invert_label: Vec<String>,
    /// NPCs whose label includes health
    pub show_health: Vec<String>,
}

impl Default for ActorsConfig {
    fn default() -> Self {
        Self {
            player_type_name: "BP_PlayerCharacter_C".to_string(),
            npc_prefixes: vec!["BP_".to_string()],
            npc: Vec::new(),
            mesh: Vec::new(),
            invert_label: Vec::new(),
            show_health: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_ms: timing::WORLD_RETRY_DELAY.as_millis() as u64,
            max_attempts: timing::WORLD_RETRY_ATTEMPTS,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Track every actor that matches no other rule
    pub actors: bool,
    /// Log each name the first time it is resolved
    pub fnames: bool,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.radar.fps == 0 {
            return Err(Error::InvalidConfig("radar.fps must be positive".to_string()));
        }
        if self.radar.window_size == 0 {
            return Err(Error::InvalidConfig(
                "radar.window_size must be positive".to_string(),
            ));
        }
        if self.radar.max_range.is_nan() || self.radar.max_range <= 0.0 {
            return Err(Error::InvalidConfig(
                "radar.max_range must be positive".to_string(),
            ));
        }
        if self.process.name.trim().is_empty() {
            return Err(Error::InvalidConfig("process.name is empty".to_string()));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.radar.fps.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.process.name, "GameThread");
        assert_eq!(config.radar.fps, 30);
        assert_eq!(config.retry.max_attempts, 300);
        assert_eq!(config.retry.delay(), Duration::from_millis(100));
        assert_eq!(config.actors.npc_prefixes, vec!["BP_".to_string()]);
        assert!(!config.debug.actors);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[actors]
npc = ["Horse", "Wolf"]
mesh = ["Chest"]
show_health = ["Horse"]

[debug]
fnames = true

[layout]
health = 0xCE0
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.actors.npc, vec!["Horse", "Wolf"]);
        assert_eq!(config.actors.player_type_name, "BP_PlayerCharacter_C");
        assert!(config.debug.fnames);
        assert_eq!(config.layout.health, 0xCE0);
        assert_eq!(config.radar.window_size, 400);
    }

    #[test]
    fn test_validate_rejects_zero_fps() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[radar]\nfps = 0").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_range() {
        let mut config = Config::default();
        config.radar.max_range = 0.0;
        assert!(config.validate().is_err());
        config.radar.max_range = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load("/nonexistent/config.toml").unwrap_err().is_not_found());
    }

    #[test]
    fn test_frame_interval() {
        let mut config = Config::default();
        config.radar.fps = 50;
        assert_eq!(config.frame_interval(), Duration::from_millis(20));
    }
}
