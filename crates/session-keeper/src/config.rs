//! Session keeper configuration

use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, KeeperResult};
use crate::host::AudioSessionProfile;

/// Signal that starts the background session
pub const START_AUDIO_SERVICE: &str = "START_AUDIO_SERVICE";

/// Signal that stops the background session
pub const STOP_AUDIO_SERVICE: &str = "STOP_AUDIO_SERVICE";

/// Configuration for [`crate::BackgroundSessionKeeper`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    pub start_signal: String,
    pub stop_signal: String,
    /// Applied on start and re-applied when the app goes to the background
    pub background_profile: AudioSessionProfile,
    /// Applied on stop
    pub idle_profile: AudioSessionProfile,
    /// Hold a keep-awake lock while active
    pub keep_awake: bool,
}

impl KeeperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signals(mut self, start: impl Into<String>, stop: impl Into<String>) -> Self {
        self.start_signal = start.into();
        self.stop_signal = stop.into();
        self
    }

    pub fn with_background_profile(mut self, profile: AudioSessionProfile) -> Self {
        self.background_profile = profile;
        self
    }

    pub fn with_idle_profile(mut self, profile: AudioSessionProfile) -> Self {
        self.idle_profile = profile;
        self
    }

    pub fn with_keep_awake(mut self, keep_awake: bool) -> Self {
        self.keep_awake = keep_awake;
        self
    }

    /// Signal names must be non-empty and distinct
    pub fn validate(&self) -> KeeperResult<()> {
        if self.start_signal.is_empty() || self.stop_signal.is_empty() {
            return Err(KeeperError::invalid_config("signal names must not be empty"));
        }
        if self.start_signal == self.stop_signal {
            return Err(KeeperError::invalid_config(
                "start and stop signals must be different",
            ));
        }
        Ok(())
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            start_signal: START_AUDIO_SERVICE.to_string(),
            stop_signal: STOP_AUDIO_SERVICE.to_string(),
            background_profile: AudioSessionProfile::background_call(),
            idle_profile: AudioSessionProfile::idle(),
            keep_awake: true,
        }
    }
}
