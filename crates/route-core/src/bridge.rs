//! Application bridge
//!
//! [`RouteBridge`] exposes the route manager through the shape an application
//! layer sees across a language bridge: methods called by name returning JSON
//! or a rejection with a stable code, and a stream of named events with JSON
//! payloads. The transport carrying these across is up to the host.
//!
//! | Method             | Result                    | Rejection code      |
//! |--------------------|---------------------------|---------------------|
//! | `listRoutes`       | array of route names      | `GET_ROUTES_ERROR`  |
//! | `enableHandsFree`  | `null`                    | `SCO_ENABLE_ERROR`  |
//! | `disableHandsFree` | `null`                    | `SCO_DISABLE_ERROR` |
//!
//! Any other method name is rejected with `UNKNOWN_METHOD`.

use std::error::Error as _;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::config::RouteManagerConfig;
use crate::error::{RouteError, RouteResult};
use crate::events::{EventEmitter, RouteEvent};
use crate::manager::RouteManager;
use crate::platform::PlatformAudioService;

/// Method names accepted by [`RouteBridge::call`]
pub mod methods {
    pub const LIST_ROUTES: &str = "listRoutes";
    pub const ENABLE_HANDS_FREE: &str = "enableHandsFree";
    pub const DISABLE_HANDS_FREE: &str = "disableHandsFree";
}

/// Rejected bridge call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeRejection {
    /// Stable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Underlying cause, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl BridgeRejection {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            cause: None,
        }
    }

    fn unknown_method(method: &str) -> Self {
        Self::new("UNKNOWN_METHOD", format!("Unknown method: {method}"))
    }
}

impl From<RouteError> for BridgeRejection {
    fn from(err: RouteError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            cause: err.source().map(|cause| cause.to_string()),
        }
    }
}

impl fmt::Display for BridgeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BridgeRejection {}

/// Named event pushed to the application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl From<RouteEvent> for BridgeEvent {
    fn from(event: RouteEvent) -> Self {
        Self {
            name: event.name().to_string(),
            payload: event.payload(),
        }
    }
}

/// Name-dispatched facade over a [`RouteManager`]
#[derive(Debug, Clone)]
pub struct RouteBridge {
    manager: Arc<RouteManager>,
    emitter: EventEmitter,
}

impl RouteBridge {
    /// Create a bridge and the route manager behind it
    pub fn new(
        platform: Arc<dyn PlatformAudioService>,
        config: RouteManagerConfig,
    ) -> RouteResult<Self> {
        let manager = RouteManager::with_config(platform, config)?;
        let emitter = manager
            .emitter()
            .cloned()
            .ok_or_else(|| RouteError::internal("route manager has no event emitter"))?;
        Ok(Self {
            manager: Arc::new(manager),
            emitter,
        })
    }

    /// The route manager behind this bridge
    pub fn manager(&self) -> &Arc<RouteManager> {
        &self.manager
    }

    /// Invoke a method by name
    pub fn call(&self, method: &str) -> Result<Value, BridgeRejection> {
        debug!("Bridge call: {}", method);
        match method {
            methods::LIST_ROUTES => {
                let routes = self.manager.list_routes()?;
                serde_json::to_value(&routes).map_err(|e| {
                    BridgeRejection::from(RouteError::internal(format!(
                        "failed to serialize routes: {e}"
                    )))
                })
            }
            methods::ENABLE_HANDS_FREE => {
                self.manager.enable_hands_free()?;
                Ok(Value::Null)
            }
            methods::DISABLE_HANDS_FREE => {
                self.manager.disable_hands_free()?;
                Ok(Value::Null)
            }
            other => {
                warn!("Rejecting unknown bridge method {}", other);
                Err(BridgeRejection::unknown_method(other))
            }
        }
    }

    /// Subscribe to pushed events
    ///
    /// Only events emitted after this call are delivered. A subscriber that
    /// falls behind skips the events it missed.
    pub fn events(&self) -> impl Stream<Item = BridgeEvent> + Send + Unpin + 'static {
        self.emitter.subscribe().filter_map(|item| match item {
            Ok(event) => Some(BridgeEvent::from(event)),
            Err(e) => {
                warn!("Bridge event subscriber lagging: {}", e);
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;
    use crate::simulated::SimulatedAudioService;
    use serde_json::json;

    fn bridge(platform: &SimulatedAudioService) -> RouteBridge {
        RouteBridge::new(Arc::new(platform.clone()), RouteManagerConfig::default()).unwrap()
    }

    #[test]
    fn test_list_routes_as_json() {
        let platform = SimulatedAudioService::new();
        let value = bridge(&platform).call(methods::LIST_ROUTES).unwrap();
        assert_eq!(value, json!(["EARPIECE", "SPEAKER"]));
    }

    #[test]
    fn test_hands_free_calls_resolve_null() {
        let platform = SimulatedAudioService::new();
        let bridge = bridge(&platform);
        assert_eq!(bridge.call(methods::ENABLE_HANDS_FREE).unwrap(), Value::Null);
        assert_eq!(bridge.call(methods::DISABLE_HANDS_FREE).unwrap(), Value::Null);
    }

    #[test]
    fn test_rejection_carries_code_and_cause() {
        let platform = SimulatedAudioService::new()
            .with_enumeration_failure(PlatformError::unavailable("audio service died"));
        let rejection = bridge(&platform).call(methods::LIST_ROUTES).unwrap_err();

        assert_eq!(rejection.code, "GET_ROUTES_ERROR");
        assert!(rejection.message.contains("audio service died"));
        assert_eq!(
            rejection.cause.as_deref(),
            Some("Audio service unavailable: audio service died")
        );
    }

    #[test]
    fn test_unknown_method() {
        let platform = SimulatedAudioService::new();
        let rejection = bridge(&platform).call("setRoute").unwrap_err();
        assert_eq!(rejection.code, "UNKNOWN_METHOD");
        assert_eq!(rejection.cause, None);
    }

    #[test]
    fn test_event_serialization() {
        let event = BridgeEvent::from(RouteEvent::ScoStateChanged { state: 1 });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "name": "scoStateChanged", "payload": { "state": 1 } })
        );

        let event = BridgeEvent::from(RouteEvent::RoutesChanged);
        assert_eq!(serde_json::to_value(&event).unwrap(), json!({ "name": "routesChanged" }));
    }

    #[tokio::test]
    async fn test_events_stream() {
        let platform = SimulatedAudioService::new();
        let bridge = bridge(&platform);
        let mut events = bridge.events();

        bridge.call(methods::LIST_ROUTES).unwrap();
        platform.fire_hands_free_state(1);

        let event = events.next().await.unwrap();
        assert_eq!(event.name, "scoStateChanged");
        assert_eq!(event.payload, Some(json!({ "state": 1 })));
    }
}
