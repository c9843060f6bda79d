//! # Call Audio Route Core
//!
//! In-call audio route management for mobile voice applications:
//! - **Route listing**: which outputs (speaker, earpiece, wired headset,
//!   Bluetooth) can carry call audio right now
//! - **Hands-free control**: request and release the Bluetooth hands-free
//!   (SCO) link
//! - **Change events**: `routesChanged` when output devices come and go,
//!   `scoStateChanged` with the raw link state code
//!
//! The native audio service is reached through the [`PlatformAudioService`]
//! trait. [`SimulatedAudioService`] implements it in memory.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use callaudio_route_core::{
//!     DeviceKind, LogicalRoute, RawDevice, RouteEvent, RouteManager, SimulatedAudioService,
//! };
//! use tokio_stream::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = SimulatedAudioService::new();
//!     let manager = RouteManager::new(Arc::new(platform.clone()));
//!     let mut events = manager.subscribe().ok_or("no event stream")?;
//!
//!     // First query also subscribes to platform notifications
//!     let routes = manager.list_routes()?;
//!     assert_eq!(routes.preferred(), LogicalRoute::Earpiece);
//!
//!     platform.attach_device(RawDevice::output(7, DeviceKind::BluetoothSco));
//!     assert_eq!(events.next().await.transpose()?, Some(RouteEvent::RoutesChanged));
//!
//!     manager.enable_hands_free()?;
//!     manager.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Route sources
//!
//! Platforms that can list individual output devices use
//! [`EnumeratingRouteSource`]. Older platforms fall back to
//! [`HeuristicRouteSource`], which derives the routes from capability flags.
//! The choice is made once per manager, see [`SourceSelection`].

pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod platform;
pub mod simulated;
pub mod source;
pub mod types;

// Re-export main types
pub use bridge::{BridgeEvent, BridgeRejection, RouteBridge};
pub use config::{
    DEFAULT_EVENT_CAPACITY, MAX_EVENT_CAPACITY, RouteManagerConfig, SourceSelection,
};
pub use error::{HandsFreeCommand, RouteError, RouteResult};
pub use events::{EmitError, EventEmitter, EventSink, EventStream, RouteEvent};
pub use manager::RouteManager;
pub use platform::{
    DeviceListener, HandsFreeListener, ListenerKind, ListenerRegistration, PlatformAudioService,
    PlatformError, PlatformResult,
};
pub use simulated::{CallCounts, SimulatedAudioService};
pub use source::{EnumeratingRouteSource, HeuristicRouteSource, RouteSource, classify};
pub use types::{DeviceChange, DeviceDirection, DeviceKind, LogicalRoute, RawDevice, RouteSet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
