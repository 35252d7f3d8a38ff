//! # Player Configuration
//!
//! Configuration for a player instance. Every field has a serde default so a
//! host can pass a partial JSON object.

use crate::error::{PlaybackError, Result};
use crate::types::RepeatMode;
use core_runtime::events::{DispatchPolicy, DEFAULT_STREAM_CAPACITY};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Player configuration.
///
/// Controls initial transport settings, navigation policy and how long a
/// source probe may take before it is abandoned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Seconds moved by `forward()` / `backward()`.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_skip_duration")]
    pub skip_duration: f64,

    /// Maximum time a single candidate probe may take, in milliseconds.
    ///
    /// A probe that neither signals playable nor errors within this bound is
    /// treated as a network failure and the next candidate is tried.
    ///
    /// Default: 30 000 ms.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Initial volume in `[0, 1]`.
    ///
    /// Default: 1.0.
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Start muted.
    #[serde(default)]
    pub muted: bool,

    /// Start playing as soon as the first track loads.
    #[serde(default)]
    pub autoplay: bool,

    /// Initial repeat mode.
    #[serde(default)]
    pub repeat: RepeatMode,

    /// Start with random navigation enabled.
    #[serde(default)]
    pub random: bool,

    /// Initial playback rate. Must be finite and positive.
    ///
    /// Default: 1.0.
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f64,

    /// What the event bus does when a handler panics.
    ///
    /// Default: isolate.
    #[serde(default)]
    pub dispatch_policy: DispatchPolicy,

    /// Capacity of the async event stream mirror.
    ///
    /// Default: 64 events.
    #[serde(default = "default_stream_capacity")]
    pub stream_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            skip_duration: default_skip_duration(),
            probe_timeout_ms: default_probe_timeout_ms(),
            volume: default_volume(),
            muted: false,
            autoplay: false,
            repeat: RepeatMode::Off,
            random: false,
            playback_rate: default_playback_rate(),
            dispatch_policy: DispatchPolicy::Isolate,
            stream_capacity: default_stream_capacity(),
        }
    }
}

impl PlayerConfig {
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Parse a (possibly partial) JSON object and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PlaybackError::InvalidConfig(format!("malformed config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if !self.skip_duration.is_finite() || self.skip_duration <= 0.0 {
            return Err(PlaybackError::InvalidConfig(
                "skip_duration must be a positive number of seconds".to_string(),
            ));
        }

        if self.probe_timeout_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "probe_timeout_ms must be > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err(PlaybackError::InvalidConfig(
                "volume must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !self.playback_rate.is_finite() || self.playback_rate <= 0.0 {
            return Err(PlaybackError::InvalidConfig(
                "playback_rate must be finite and > 0".to_string(),
            ));
        }

        if self.stream_capacity == 0 {
            return Err(PlaybackError::InvalidConfig(
                "stream_capacity must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Chained construction of a [`PlayerConfig`].
#[derive(Debug, Clone, Default)]
pub struct PlayerConfigBuilder {
    config: PlayerConfig,
}

impl PlayerConfigBuilder {
    pub fn skip_duration(mut self, seconds: f64) -> Self {
        self.config.skip_duration = seconds;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.config.volume = volume;
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.config.muted = muted;
        self
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.config.autoplay = autoplay;
        self
    }

    pub fn repeat(mut self, repeat: RepeatMode) -> Self {
        self.config.repeat = repeat;
        self
    }

    pub fn random(mut self, random: bool) -> Self {
        self.config.random = random;
        self
    }

    pub fn playback_rate(mut self, rate: f64) -> Self {
        self.config.playback_rate = rate;
        self
    }

    pub fn dispatch_policy(mut self, policy: DispatchPolicy) -> Self {
        self.config.dispatch_policy = policy;
        self
    }

    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.config.stream_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<PlayerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_skip_duration() -> f64 {
    10.0
}

fn default_probe_timeout_ms() -> u64 {
    30_000
}

fn default_volume() -> f64 {
    1.0
}

fn default_playback_rate() -> f64 {
    1.0
}

fn default_stream_capacity() -> usize {
    DEFAULT_STREAM_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.skip_duration, 10.0);
        assert_eq!(config.probe_timeout(), Duration::from_secs(30));
        assert_eq!(config.dispatch_policy, DispatchPolicy::Isolate);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = PlayerConfig::from_json_str(r#"{"volume": 0.5, "repeat": "all"}"#).unwrap();
        assert_eq!(config.volume, 0.5);
        assert_eq!(config.repeat, RepeatMode::All);
        assert_eq!(config.probe_timeout_ms, 30_000);
        assert!(!config.autoplay);
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        assert!(PlayerConfig::from_json_str(r#"{"volume": 1.5}"#).is_err());
        assert!(PlayerConfig::from_json_str(r#"{"playbackRate": 0}"#).is_err());
        assert!(PlayerConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = PlayerConfig::default();

        config.skip_duration = 0.0;
        assert!(config.validate().is_err());
        config.skip_duration = 10.0;

        config.probe_timeout_ms = 0;
        assert!(config.validate().is_err());
        config.probe_timeout_ms = 500;

        config.playback_rate = f64::NAN;
        assert!(config.validate().is_err());
        config.playback_rate = 2.0;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_validates() {
        let config = PlayerConfig::builder()
            .autoplay(true)
            .probe_timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        assert!(config.autoplay);
        assert_eq!(config.probe_timeout_ms, 250);

        assert!(PlayerConfig::builder().stream_capacity(0).build().is_err());
    }
}
