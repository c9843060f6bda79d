//! Route manager configuration
//!
//! # Examples
//!
//! ```rust
//! use callaudio_route_core::{RouteManagerConfig, SourceSelection};
//!
//! let config = RouteManagerConfig::new()
//!     .with_event_capacity(16)
//!     .with_source_selection(SourceSelection::Heuristic);
//! assert!(config.validate().is_ok());
//! ```
//!
//! Configuration can also be loaded from JSON; missing fields take their
//! defaults:
//!
//! ```rust
//! use callaudio_route_core::{RouteManagerConfig, SourceSelection};
//!
//! let config = RouteManagerConfig::from_json(r#"{ "source_selection": "enumerating" }"#).unwrap();
//! assert_eq!(config.source_selection, SourceSelection::Enumerating);
//! assert_eq!(config.event_capacity, 64);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{RouteError, RouteResult};

/// Default broadcast buffer size for route events
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Largest accepted event buffer size. The channel allocates every slot up
/// front.
pub const MAX_EVENT_CAPACITY: usize = 65_536;

/// How the route source is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceSelection {
    /// Ask the platform whether it can enumerate devices
    #[default]
    Auto,
    /// Always enumerate devices
    Enumerating,
    /// Always use capability flags
    Heuristic,
}

/// Configuration for [`crate::RouteManager`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteManagerConfig {
    /// Buffer size of the route event channel. Slow subscribers that fall
    /// further behind than this lose events.
    pub event_capacity: usize,
    /// Route source strategy
    pub source_selection: SourceSelection,
}

impl RouteManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the event channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set the route source strategy
    pub fn with_source_selection(mut self, selection: SourceSelection) -> Self {
        self.source_selection = selection;
        self
    }

    /// Check the configuration for values the manager cannot run with
    pub fn validate(&self) -> RouteResult<()> {
        if self.event_capacity == 0 {
            return Err(RouteError::invalid_config("event_capacity must be greater than zero"));
        }
        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(RouteError::invalid_config(format!(
                "event_capacity {} exceeds the maximum of {}",
                self.event_capacity, MAX_EVENT_CAPACITY
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> RouteResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RouteError::invalid_config(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for RouteManagerConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            source_selection: SourceSelection::Auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouteManagerConfig::default();
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.source_selection, SourceSelection::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = RouteManagerConfig::new().with_event_capacity(0).validate().unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        assert!(RouteManagerConfig::new().with_event_capacity(MAX_EVENT_CAPACITY).validate().is_ok());

        let err = RouteManagerConfig::new()
            .with_event_capacity(MAX_EVENT_CAPACITY + 1)
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");

        let err = RouteManagerConfig::from_json(r#"{"event_capacity": 18446744073709551615}"#)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_from_json() {
        let config =
            RouteManagerConfig::from_json(r#"{"event_capacity": 8, "source_selection": "heuristic"}"#)
                .unwrap();
        assert_eq!(config.event_capacity, 8);
        assert_eq!(config.source_selection, SourceSelection::Heuristic);

        assert!(RouteManagerConfig::from_json(r#"{"event_capacity": 0}"#).is_err());
        assert!(RouteManagerConfig::from_json("not json").is_err());
    }
}
