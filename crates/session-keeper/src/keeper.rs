//! Background session keeper
//!
//! Keeps the call's audio session alive while the app is backgrounded. Start
//! and stop are idempotent and serialized; each one walks the host through a
//! fixed sequence:
//!
//! - start: background audio profile, keep-awake, foreground task
//! - stop: foreground task, idle audio profile, keep-awake release

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::KeeperConfig;
use crate::error::KeeperResult;
use crate::host::{AppState, BackgroundHost};

/// Parsed foreground signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    Start,
    Stop,
    /// Delivered without an action, e.g. after the OS restarted the task
    Missing,
    Unknown(String),
}

impl SessionSignal {
    pub fn parse(signal: Option<&str>, config: &KeeperConfig) -> Self {
        match signal {
            None | Some("") => SessionSignal::Missing,
            Some(s) if s == config.start_signal => SessionSignal::Start,
            Some(s) if s == config.stop_signal => SessionSignal::Stop,
            Some(other) => SessionSignal::Unknown(other.to_string()),
        }
    }
}

/// Idempotent owner of the background audio session
pub struct BackgroundSessionKeeper {
    host: Arc<dyn BackgroundHost>,
    config: KeeperConfig,
    active: Mutex<bool>,
}

impl BackgroundSessionKeeper {
    /// Create a keeper with the default configuration
    pub fn new(host: Arc<dyn BackgroundHost>) -> Self {
        Self {
            host,
            config: KeeperConfig::default(),
            active: Mutex::new(false),
        }
    }

    pub fn with_config(host: Arc<dyn BackgroundHost>, config: KeeperConfig) -> KeeperResult<Self> {
        config.validate()?;
        Ok(Self {
            host,
            config,
            active: Mutex::new(false),
        })
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    pub async fn is_active(&self) -> bool {
        *self.active.lock().await
    }

    /// Start the background session. No-op when already active.
    ///
    /// On failure the steps already taken are undone on a best-effort basis
    /// and the keeper stays inactive.
    pub async fn start(&self) -> KeeperResult<()> {
        let mut active = self.active.lock().await;
        if *active {
            debug!("Background audio session already active");
            return Ok(());
        }

        if let Err(e) = self.start_sequence().await {
            error!("Failed to start background audio session: {}", e);
            self.rollback_start().await;
            return Err(e);
        }

        *active = true;
        info!("Background audio session started");
        Ok(())
    }

    /// Stop the background session. No-op when not active.
    ///
    /// On failure the keeper stays active so the stop can be retried.
    pub async fn stop(&self) -> KeeperResult<()> {
        let mut active = self.active.lock().await;
        if !*active {
            debug!("Background audio session not active");
            return Ok(());
        }

        if let Err(e) = self.stop_sequence().await {
            error!("Failed to stop background audio session: {}", e);
            return Err(e);
        }

        *active = false;
        info!("Background audio session stopped");
        Ok(())
    }

    /// Handle a foreground task signal
    pub async fn handle_signal(&self, signal: Option<&str>) -> KeeperResult<()> {
        match SessionSignal::parse(signal, &self.config) {
            SessionSignal::Start => self.start().await,
            SessionSignal::Stop => self.stop().await,
            SessionSignal::Missing => {
                warn!("Received signal without action, stopping");
                if self.is_active().await {
                    self.stop().await
                } else if self.host.is_foreground_running().await {
                    self.host.stop_foreground().await
                } else {
                    Ok(())
                }
            }
            SessionSignal::Unknown(other) => {
                warn!("Ignoring unknown signal {}", other);
                Ok(())
            }
        }
    }

    /// React to the app moving between foreground and background
    pub async fn handle_app_state(&self, state: AppState) -> KeeperResult<()> {
        let active = self.active.lock().await;
        if !*active {
            debug!("App state {} while inactive", state);
            return Ok(());
        }

        match state {
            AppState::Background => {
                info!("App going to background, maintaining audio session");
                if !self.host.is_foreground_running().await {
                    self.host.start_foreground().await?;
                }
                match self.host.apply_audio_profile(&self.config.background_profile).await {
                    Ok(()) => debug!("Audio session reinforced for background operation"),
                    Err(e) => error!("Failed to reinforce audio session: {}", e),
                }
            }
            AppState::Active => info!("App becoming active, audio session maintained"),
            AppState::Inactive => debug!("App inactive"),
        }
        Ok(())
    }

    async fn start_sequence(&self) -> KeeperResult<()> {
        self.host.apply_audio_profile(&self.config.background_profile).await?;
        if self.config.keep_awake {
            self.host.set_keep_awake(true).await?;
        }
        if !self.host.is_foreground_running().await {
            self.host.start_foreground().await?;
        }
        Ok(())
    }

    async fn rollback_start(&self) {
        if self.config.keep_awake {
            if let Err(e) = self.host.set_keep_awake(false).await {
                warn!("Rollback: failed to release keep-awake: {}", e);
            }
        }
        if let Err(e) = self.host.apply_audio_profile(&self.config.idle_profile).await {
            warn!("Rollback: failed to restore idle audio profile: {}", e);
        }
    }

    async fn stop_sequence(&self) -> KeeperResult<()> {
        if self.host.is_foreground_running().await {
            self.host.stop_foreground().await?;
        }
        self.host.apply_audio_profile(&self.config.idle_profile).await?;
        if self.config.keep_awake {
            self.host.set_keep_awake(false).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for BackgroundSessionKeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundSessionKeeper")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_parsing() {
        let config = KeeperConfig::default();
        assert_eq!(SessionSignal::parse(None, &config), SessionSignal::Missing);
        assert_eq!(SessionSignal::parse(Some(""), &config), SessionSignal::Missing);
        assert_eq!(
            SessionSignal::parse(Some("START_AUDIO_SERVICE"), &config),
            SessionSignal::Start
        );
        assert_eq!(SessionSignal::parse(Some("STOP_AUDIO_SERVICE"), &config), SessionSignal::Stop);
        assert_eq!(
            SessionSignal::parse(Some("PAUSE"), &config),
            SessionSignal::Unknown("PAUSE".to_string())
        );
    }

    #[test]
    fn test_custom_signal_names() {
        let config = KeeperConfig::new().with_signals("begin", "end");
        assert_eq!(SessionSignal::parse(Some("begin"), &config), SessionSignal::Start);
        assert_eq!(
            SessionSignal::parse(Some("START_AUDIO_SERVICE"), &config),
            SessionSignal::Unknown("START_AUDIO_SERVICE".to_string())
        );
    }
}
