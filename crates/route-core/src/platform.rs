//! Platform audio service abstraction
//!
//! Everything the route manager needs from the operating system's audio
//! service sits behind [`PlatformAudioService`]. Host integrations implement it
//! on top of the native API; [`crate::simulated::SimulatedAudioService`] is the
//! in-memory implementation used by tests and demos.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::types::{DeviceChange, RawDevice};

/// Result type for platform audio service calls
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Failures reported by the platform audio service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// The audio service could not be reached
    #[error("Audio service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// The service refused the request
    #[error("Request rejected by platform: {message}")]
    Rejected { message: String },

    /// The platform does not implement the operation
    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Platform error: {0}")]
    Other(String),
}

impl PlatformError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }
}

/// Callback invoked for every device attach/detach batch
pub type DeviceListener = Arc<dyn Fn(DeviceChange) + Send + Sync>;

/// Callback invoked with the raw hands-free link state code
pub type HandsFreeListener = Arc<dyn Fn(i32) + Send + Sync>;

/// Which platform subscription a [`ListenerRegistration`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Device attach/detach
    Device,
    /// Hands-free (SCO) link state
    HandsFree,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerKind::Device => write!(f, "device"),
            ListenerKind::HandsFree => write!(f, "hands-free"),
        }
    }
}

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Handle for one active platform subscription
///
/// The subscription is removed exactly once, either through [`release`] or
/// when the handle is dropped.
///
/// [`release`]: ListenerRegistration::release
pub struct ListenerRegistration {
    id: Uuid,
    kind: ListenerKind,
    release: Option<ReleaseFn>,
}

impl ListenerRegistration {
    /// Create a registration that runs `release` when unsubscribed
    pub fn new<F>(kind: ListenerKind, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::with_id(Uuid::new_v4(), kind, release)
    }

    /// Same as [`ListenerRegistration::new`] with a caller-chosen id
    pub fn with_id<F>(id: Uuid, kind: ListenerKind, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id,
            kind,
            release: Some(Box::new(release)),
        }
    }

    /// Create a registration with nothing to undo
    pub fn detached(kind: ListenerKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            release: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    /// Unsubscribe now
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(release) = self.release.take() {
            debug!("Releasing {} listener {}", self.kind, self.id);
            release();
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Native audio service operations used by the route manager
///
/// Implementations must be callable from any thread. Listener callbacks may be
/// invoked on any thread, including synchronously from inside the
/// `register_*` call.
pub trait PlatformAudioService: Send + Sync + fmt::Debug {
    /// Capability probe: can the platform list individual output devices?
    fn supports_device_enumeration(&self) -> bool;

    /// All currently attached output-capable devices, in platform order
    fn enumerate_output_devices(&self) -> PlatformResult<Vec<RawDevice>>;

    /// Ask the platform to route call audio over the hands-free link
    fn set_hands_free_requested(&self, requested: bool) -> PlatformResult<()>;

    /// Begin negotiating the hands-free link
    fn start_hands_free_negotiation(&self) -> PlatformResult<()>;

    /// Tear down the hands-free link
    fn stop_hands_free_negotiation(&self) -> PlatformResult<()>;

    /// Whether a hands-free capable device is reachable outside a call
    fn is_hands_free_available_off_call(&self) -> PlatformResult<bool>;

    fn is_wired_headset_connected(&self) -> PlatformResult<bool>;

    /// Subscribe to device attach/detach batches
    fn register_device_listener(
        &self,
        listener: DeviceListener,
    ) -> PlatformResult<ListenerRegistration>;

    /// Subscribe to hands-free link state changes
    fn register_hands_free_listener(
        &self,
        listener: HandsFreeListener,
    ) -> PlatformResult<ListenerRegistration>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_registration_releases_once_on_explicit_release() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let registration = ListenerRegistration::new(ListenerKind::Device, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registration.release();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_releases_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let counter = calls.clone();
            let _registration = ListenerRegistration::new(ListenerKind::HandsFree, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_ids_are_unique() {
        let a = ListenerRegistration::detached(ListenerKind::Device);
        let b = ListenerRegistration::detached(ListenerKind::Device);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.kind(), ListenerKind::Device);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            PlatformError::rejected("link busy").to_string(),
            "Request rejected by platform: link busy"
        );
        assert_eq!(
            PlatformError::unsupported("enumerate").to_string(),
            "Operation not supported: enumerate"
        );
    }
}
