//! Route manager
//!
//! [`RouteManager`] is the one object the application talks to. It lists the
//! routes the platform can currently play call audio through, toggles the
//! Bluetooth hands-free (SCO) link, and turns raw platform notifications into
//! [`RouteEvent`]s.
//!
//! Platform subscriptions are created lazily on the first
//! [`RouteManager::list_routes`] call and live until [`RouteManager::shutdown`]
//! or until the manager is dropped.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use callaudio_route_core::{
//!     DeviceKind, LogicalRoute, RawDevice, RouteManager, SimulatedAudioService,
//! };
//!
//! let platform = SimulatedAudioService::new().with_devices(vec![
//!     RawDevice::output(1, DeviceKind::BuiltinEarpiece),
//!     RawDevice::output(2, DeviceKind::BuiltinSpeaker),
//! ]);
//! let manager = RouteManager::new(Arc::new(platform));
//!
//! let routes = manager.list_routes().unwrap();
//! assert_eq!(routes.as_slice(), &[LogicalRoute::Earpiece, LogicalRoute::Speaker]);
//!
//! manager.enable_hands_free().unwrap();
//! assert!(manager.is_hands_free_requested());
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, error, info, trace, warn};

use crate::config::RouteManagerConfig;
use crate::error::{HandsFreeCommand, RouteError, RouteResult};
use crate::events::{EventEmitter, EventSink, EventStream, RouteEvent};
use crate::platform::{
    DeviceListener, HandsFreeListener, ListenerRegistration, PlatformAudioService,
};
use crate::source::{RouteSource, select_source};
use crate::types::{DeviceChange, LogicalRoute, RouteSet};

/// Short-lived state. The lock is never held across a platform call, so
/// callbacks fired from inside the platform may call back into the manager.
#[derive(Debug, Default)]
struct ManagerState {
    /// Local intent flag; the real link state arrives via `scoStateChanged`
    hands_free_requested: bool,
    initialized: bool,
    /// A thread is registering listeners right now
    initializing: bool,
    /// Bumped by `shutdown` so an in-flight initialization drops its handles
    generation: u64,
    device_registration: Option<ListenerRegistration>,
    hands_free_registration: Option<ListenerRegistration>,
}

/// Audio route manager for a single application session
pub struct RouteManager {
    platform: Arc<dyn PlatformAudioService>,
    source: Box<dyn RouteSource>,
    sink: Arc<dyn EventSink>,
    emitter: Option<EventEmitter>,
    state: Mutex<ManagerState>,
    /// Serializes hands-free commands across threads. Re-entrant so a
    /// callback fired during a command on the same thread cannot deadlock.
    commands: ReentrantMutex<()>,
}

impl RouteManager {
    /// Create a manager with the default configuration
    pub fn new(platform: Arc<dyn PlatformAudioService>) -> Self {
        let config = RouteManagerConfig::default();
        let emitter = EventEmitter::new(config.event_capacity);
        Self::build(platform, &config, Arc::new(emitter.clone()), Some(emitter))
    }

    /// Create a manager from a configuration
    pub fn with_config(
        platform: Arc<dyn PlatformAudioService>,
        config: RouteManagerConfig,
    ) -> RouteResult<Self> {
        config.validate()?;
        let emitter = EventEmitter::new(config.event_capacity);
        Ok(Self::build(platform, &config, Arc::new(emitter.clone()), Some(emitter)))
    }

    /// Create a manager that delivers events to a custom sink
    ///
    /// [`RouteManager::subscribe`] returns `None` for such a manager.
    pub fn with_sink(
        platform: Arc<dyn PlatformAudioService>,
        config: RouteManagerConfig,
        sink: Arc<dyn EventSink>,
    ) -> RouteResult<Self> {
        config.validate()?;
        Ok(Self::build(platform, &config, sink, None))
    }

    fn build(
        platform: Arc<dyn PlatformAudioService>,
        config: &RouteManagerConfig,
        sink: Arc<dyn EventSink>,
        emitter: Option<EventEmitter>,
    ) -> Self {
        let source = select_source(config.source_selection, platform.as_ref());
        info!("Route manager created with {} route source", source.name());
        Self {
            platform,
            source,
            sink,
            emitter,
            state: Mutex::new(ManagerState::default()),
            commands: ReentrantMutex::new(()),
        }
    }

    /// Subscribe to route events
    pub fn subscribe(&self) -> Option<EventStream> {
        self.emitter.as_ref().map(EventEmitter::subscribe)
    }

    pub(crate) fn emitter(&self) -> Option<&EventEmitter> {
        self.emitter.as_ref()
    }

    /// Name of the active route source
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// List the output routes available right now
    ///
    /// Also sets up the platform subscriptions if they are not active yet.
    pub fn list_routes(&self) -> RouteResult<RouteSet> {
        self.ensure_listeners_initialized();

        let routes = self
            .source
            .available_routes(self.platform.as_ref())
            .map_err(|e| {
                error!("Error getting available routes: {}", e);
                RouteError::route_query(e)
            })?;

        debug!("Available routes: {:?}", routes.as_slice());
        Ok(routes)
    }

    /// Best route for a call among the currently available ones
    pub fn preferred_route(&self) -> RouteResult<LogicalRoute> {
        Ok(self.list_routes()?.preferred())
    }

    /// Request Bluetooth hands-free routing
    ///
    /// Returns once the platform accepted the request; the link itself comes
    /// up later and is reported through [`RouteEvent::ScoStateChanged`].
    pub fn enable_hands_free(&self) -> RouteResult<()> {
        let _command = self.commands.lock();
        if self.is_hands_free_requested() {
            debug!("Hands-free already requested");
            return Ok(());
        }

        self.platform
            .set_hands_free_requested(true)
            .and_then(|()| self.platform.start_hands_free_negotiation())
            .map_err(|e| {
                error!("Error enabling hands-free audio: {}", e);
                RouteError::route_command(HandsFreeCommand::Enable, e)
            })?;

        self.state.lock().hands_free_requested = true;
        info!("Hands-free audio requested");
        Ok(())
    }

    /// Stop Bluetooth hands-free routing
    pub fn disable_hands_free(&self) -> RouteResult<()> {
        let _command = self.commands.lock();
        if !self.is_hands_free_requested() {
            debug!("Hands-free not requested, nothing to disable");
            return Ok(());
        }

        self.platform
            .stop_hands_free_negotiation()
            .and_then(|()| self.platform.set_hands_free_requested(false))
            .map_err(|e| {
                error!("Error disabling hands-free audio: {}", e);
                RouteError::route_command(HandsFreeCommand::Disable, e)
            })?;

        self.state.lock().hands_free_requested = false;
        info!("Hands-free audio released");
        Ok(())
    }

    pub fn is_hands_free_requested(&self) -> bool {
        self.state.lock().hands_free_requested
    }

    /// Whether every platform subscription the route source needs is active
    pub fn listeners_active(&self) -> bool {
        self.state.lock().initialized
    }

    /// Release the platform subscriptions. Safe to call more than once.
    ///
    /// A later [`RouteManager::list_routes`] subscribes again. The hands-free
    /// intent flag is left as is.
    pub fn shutdown(&self) {
        let (device, hands_free) = {
            let mut state = self.state.lock();
            state.initialized = false;
            state.generation += 1;
            (
                state.device_registration.take(),
                state.hands_free_registration.take(),
            )
        };

        if device.is_none() && hands_free.is_none() {
            trace!("Route manager already shut down");
            return;
        }

        if let Some(registration) = device {
            registration.release();
        }
        if let Some(registration) = hands_free {
            registration.release();
        }
        info!("Route manager listeners released");
    }

    /// Register whichever platform listeners are missing.
    ///
    /// Only one thread registers at a time; others, and callbacks re-entering
    /// from inside a registration, return immediately instead of waiting.
    fn ensure_listeners_initialized(&self) {
        let observes_devices = self.source.observes_devices();

        let (generation, need_device, need_hands_free) = {
            let mut state = self.state.lock();
            if state.initialized || state.initializing {
                return;
            }
            state.initializing = true;
            (
                state.generation,
                observes_devices && state.device_registration.is_none(),
                state.hands_free_registration.is_none(),
            )
        };

        let device = if need_device {
            self.register_device_listener()
        } else {
            None
        };
        let hands_free = if need_hands_free {
            self.register_hands_free_listener()
        } else {
            None
        };

        let stale = {
            let mut state = self.state.lock();
            state.initializing = false;
            if state.generation != generation {
                Some((device, hands_free))
            } else {
                if device.is_some() {
                    state.device_registration = device;
                }
                if hands_free.is_some() {
                    state.hands_free_registration = hands_free;
                }
                state.initialized = state.hands_free_registration.is_some()
                    && (!observes_devices || state.device_registration.is_some());
                None
            }
        };

        // Shut down while registering: release outside the lock
        if let Some((device, hands_free)) = stale {
            debug!("Route manager shut down during listener setup, releasing");
            drop(device);
            drop(hands_free);
        }
    }

    fn register_device_listener(&self) -> Option<ListenerRegistration> {
        let sink = self.sink.clone();
        let listener: DeviceListener =
            Arc::new(move |change: DeviceChange| on_device_change(sink.as_ref(), change));
        match self.platform.register_device_listener(listener) {
            Ok(registration) => {
                debug!("Registered device listener {}", registration.id());
                Some(registration)
            }
            Err(e) => {
                let err = RouteError::internal(format!("device listener setup failed: {e}"));
                error!("Error initializing listeners: {}", err);
                None
            }
        }
    }

    fn register_hands_free_listener(&self) -> Option<ListenerRegistration> {
        let sink = self.sink.clone();
        let listener: HandsFreeListener =
            Arc::new(move |code: i32| on_hands_free_state(sink.as_ref(), code));
        match self.platform.register_hands_free_listener(listener) {
            Ok(registration) => {
                debug!("Registered hands-free listener {}", registration.id());
                Some(registration)
            }
            Err(e) => {
                let err = RouteError::internal(format!("hands-free listener setup failed: {e}"));
                error!("Error initializing listeners: {}", err);
                None
            }
        }
    }
}

impl fmt::Debug for RouteManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RouteManager")
            .field("platform", &self.platform)
            .field("source", &self.source)
            .field("hands_free_requested", &state.hands_free_requested)
            .field("initialized", &state.initialized)
            .finish()
    }
}

fn on_device_change(sink: &dyn EventSink, change: DeviceChange) {
    if !change.affects_outputs() {
        trace!("Ignoring input-only device change ({} device(s))", change.devices().len());
        return;
    }
    debug!("Output devices changed: {:?}", change);
    deliver(sink, RouteEvent::RoutesChanged);
}

fn on_hands_free_state(sink: &dyn EventSink, code: i32) {
    debug!("Hands-free link state: {}", code);
    deliver(sink, RouteEvent::ScoStateChanged { state: code });
}

/// Hand an event to the sink; failures and panics are logged and dropped
fn deliver(sink: &dyn EventSink, event: RouteEvent) {
    let name = event.name();
    match panic::catch_unwind(AssertUnwindSafe(|| sink.emit(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Error emitting {}: {}", name, e),
        Err(_) => error!("Event sink panicked while emitting {}", name),
    }
}
