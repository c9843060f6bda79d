//! # Call Audio Session Keeper
//!
//! Keeps a voice call's audio session alive while the application is in the
//! background. The platform work (foreground task, notification, audio session
//! category, keep-awake) is done by a [`BackgroundHost`]; this crate provides
//! the sequencing around it:
//!
//! - idempotent, serialized [`BackgroundSessionKeeper::start`] and
//!   [`BackgroundSessionKeeper::stop`]
//! - foreground task signal handling, including signals that arrive without
//!   an action
//! - re-asserting the session when the app moves to the background
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use callaudio_session_keeper::{AppState, BackgroundSessionKeeper, RecordingHost};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Arc::new(RecordingHost::new());
//!     let keeper = BackgroundSessionKeeper::new(host.clone());
//!
//!     keeper.handle_signal(Some("START_AUDIO_SERVICE")).await?;
//!     keeper.handle_app_state(AppState::Background).await?;
//!     assert!(keeper.is_active().await);
//!
//!     keeper.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod keeper;
pub mod recording;

// Re-export main types
pub use config::{KeeperConfig, START_AUDIO_SERVICE, STOP_AUDIO_SERVICE};
pub use error::{HostOperation, KeeperError, KeeperResult};
pub use host::{AppState, AudioSessionProfile, BackgroundHost};
pub use keeper::{BackgroundSessionKeeper, SessionSignal};
pub use recording::{HostCall, RecordingHost};
