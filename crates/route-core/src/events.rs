//! Event system for route changes

use std::fmt;

use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Events emitted by the route manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteEvent {
    /// The set of attached output devices changed. Consumers re-query.
    RoutesChanged,

    /// The hands-free link reported a new state
    ScoStateChanged {
        /// Raw platform state code, passed through untouched
        state: i32,
    },
}

impl RouteEvent {
    /// Event name as seen by the application layer
    pub fn name(&self) -> &'static str {
        match self {
            RouteEvent::RoutesChanged => "routesChanged",
            RouteEvent::ScoStateChanged { .. } => "scoStateChanged",
        }
    }

    /// Event payload, if any
    pub fn payload(&self) -> Option<Value> {
        match self {
            RouteEvent::RoutesChanged => None,
            RouteEvent::ScoStateChanged { state } => Some(json!({ "state": state })),
        }
    }
}

impl fmt::Display for RouteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteEvent::RoutesChanged => write!(f, "routesChanged"),
            RouteEvent::ScoStateChanged { state } => write!(f, "scoStateChanged({state})"),
        }
    }
}

/// Failure to hand an event to its consumer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmitError {
    #[error("Event sink closed")]
    Closed,

    #[error("Event delivery failed: {0}")]
    Delivery(String),
}

/// Destination for route events
///
/// Called from platform listener callbacks, possibly on a platform thread.
/// Errors are logged by the caller and never stop later events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RouteEvent) -> Result<(), EmitError>;
}

/// Stream of route events
pub type EventStream = BroadcastStream<RouteEvent>;

/// Broadcast event emitter
///
/// Events sent while nobody is subscribed are dropped.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<RouteEvent>,
}

impl EventEmitter {
    /// Create a new event emitter with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Subscribe with a raw broadcast receiver
    pub fn receiver(&self) -> broadcast::Receiver<RouteEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active receivers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventSink for EventEmitter {
    fn emit(&self, event: RouteEvent) -> Result<(), EmitError> {
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::trace!("Delivered route event to {} receiver(s)", receivers);
            }
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!("No subscribers for {}, dropping", event);
            }
        }
        Ok(())
    }
}
