//! Background host abstraction
//!
//! The host owns everything platform specific: the foreground task with its
//! persistent notification, the audio session category, and the keep-awake
//! hold. The keeper only sequences calls into it.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::KeeperResult;

/// Audio session settings applied through the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSessionProfile {
    /// Microphone capture allowed
    pub allows_recording: bool,
    /// Audio keeps playing with the ringer switch off
    pub plays_in_silent_mode: bool,
    /// Other apps are ducked instead of paused
    pub ducks_others: bool,
    /// Route playback to the earpiece by default
    pub play_through_earpiece: bool,
    /// Session survives the app moving to the background
    pub stays_active_in_background: bool,
}

impl AudioSessionProfile {
    /// Profile held while a call runs in the background
    pub const fn background_call() -> Self {
        Self {
            allows_recording: true,
            plays_in_silent_mode: true,
            ducks_others: false,
            play_through_earpiece: false,
            stays_active_in_background: true,
        }
    }

    /// Profile restored after the call
    pub const fn idle() -> Self {
        Self {
            allows_recording: false,
            plays_in_silent_mode: true,
            ducks_others: true,
            play_through_earpiece: false,
            stays_active_in_background: false,
        }
    }
}

/// Application lifecycle state as reported by the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Active,
    Background,
    Inactive,
}

impl FromStr for AppState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AppState::Active),
            "background" => Ok(AppState::Background),
            "inactive" => Ok(AppState::Inactive),
            other => Err(format!("unknown app state: {other}")),
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppState::Active => write!(f, "active"),
            AppState::Background => write!(f, "background"),
            AppState::Inactive => write!(f, "inactive"),
        }
    }
}

/// Platform services the keeper drives
#[async_trait]
pub trait BackgroundHost: Send + Sync {
    /// Start the foreground task (and show its notification)
    async fn start_foreground(&self) -> KeeperResult<()>;

    /// Stop the foreground task
    async fn stop_foreground(&self) -> KeeperResult<()>;

    async fn is_foreground_running(&self) -> bool;

    /// Configure the audio session
    async fn apply_audio_profile(&self, profile: &AudioSessionProfile) -> KeeperResult<()>;

    /// Acquire or release the keep-awake hold
    async fn set_keep_awake(&self, enabled: bool) -> KeeperResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_differ_where_it_matters() {
        let call = AudioSessionProfile::background_call();
        let idle = AudioSessionProfile::idle();
        assert!(call.allows_recording && call.stays_active_in_background);
        assert!(!idle.allows_recording && !idle.stays_active_in_background);
        assert!(!call.ducks_others && idle.ducks_others);
    }

    #[test]
    fn test_app_state_parsing() {
        assert_eq!("background".parse::<AppState>().unwrap(), AppState::Background);
        assert_eq!("active".parse::<AppState>().unwrap(), AppState::Active);
        assert!("suspended".parse::<AppState>().is_err());
        assert_eq!(AppState::Inactive.to_string(), "inactive");
    }
}
