//! Segue configuration system
//!
//! Loads transition timing defaults and demo driver settings from
//! `segue.toml`, with environment variables taking precedence.

use segue_core::{EasingFunction, TimingDefaults};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "segue.toml";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SegueConfig {
    /// Timing applied when a request does not override it
    pub timing: TimingConfig,
    /// Demo driver settings
    pub demo: DemoConfig,
}

/// Transition timing defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub delay_ms: f64,
    pub duration_ms: f64,
    pub ease: EasingFunction,
}

/// Demo driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Virtual time between frames
    pub frame_interval_ms: f64,
    /// Number of frames to run
    pub frames: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let defaults = TimingDefaults::default();
        Self {
            delay_ms: defaults.delay,
            duration_ms: defaults.duration,
            ease: defaults.ease,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16.0,
            frames: 20,
        }
    }
}

impl SegueConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `segue.toml` in the current directory,
    /// or return the defaults if it is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file(CONFIG_FILE).unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Values that fail to parse are ignored.
    pub fn merge_with_env(&mut self) {
        if let Some(delay) = env_parse::<f64>("SEGUE_DELAY_MS") {
            self.timing.delay_ms = delay;
        }
        if let Some(duration) = env_parse::<f64>("SEGUE_DURATION_MS") {
            self.timing.duration_ms = duration;
        }

        if let Some(interval) = env_parse::<f64>("SEGUE_FRAME_INTERVAL_MS") {
            self.demo.frame_interval_ms = interval;
        }
        if let Some(frames) = env_parse::<u32>("SEGUE_FRAMES") {
            self.demo.frames = frames;
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from segue.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }

    /// Timing defaults for a `segue_core::Node`.
    pub fn timing_defaults(&self) -> TimingDefaults {
        TimingDefaults {
            delay: self.timing.delay_ms,
            duration: self.timing.duration_ms,
            ease: self.timing.ease,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SegueConfig::default();
        assert_eq!(config.timing.delay_ms, 0.0);
        assert_eq!(config.timing.duration_ms, 250.0);
        assert_eq!(config.timing.ease, EasingFunction::Linear);
        assert_eq!(config.demo.frames, 20);
        assert_eq!(config.timing_defaults(), TimingDefaults::default());
    }

    #[test]
    fn test_toml_serialization() {
        let config = SegueConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: SegueConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[timing]
duration_ms = 400.0
ease = {{ type = "ease_out" }}

[demo]
frames = 5
"#
        )
        .unwrap();

        let config = SegueConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.timing.duration_ms, 400.0);
        assert_eq!(config.timing.delay_ms, 0.0);
        assert_eq!(config.timing.ease, EasingFunction::EaseOut);
        assert_eq!(config.demo.frames, 5);
        assert_eq!(config.demo.frame_interval_ms, 16.0);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            SegueConfig::load_from_file(&missing),
            Err(ConfigError::Read { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[timing\nduration_ms = ").unwrap();
        assert!(matches!(
            SegueConfig::load_from_file(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_or_default() {
        // Should not panic even if segue.toml doesn't exist
        let config = SegueConfig::load_or_default();
        assert!(config.timing.duration_ms >= 0.0);
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("SEGUE_DURATION_MS", "1000");
            std::env::set_var("SEGUE_FRAMES", "3");
            std::env::set_var("SEGUE_DELAY_MS", "not a number");
        }

        let mut config = SegueConfig::default();
        config.merge_with_env();

        assert_eq!(config.timing.duration_ms, 1000.0);
        assert_eq!(config.demo.frames, 3);
        assert_eq!(config.timing.delay_ms, 0.0);

        unsafe {
            std::env::remove_var("SEGUE_DURATION_MS");
            std::env::remove_var("SEGUE_FRAMES");
            std::env::remove_var("SEGUE_DELAY_MS");
        }
    }
}
