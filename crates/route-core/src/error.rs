//! Error types for route management

use thiserror::Error;

use crate::platform::PlatformError;

/// Result type for route management operations
pub type RouteResult<T> = Result<T, RouteError>;

/// Hands-free command that was being executed when a [`RouteError::RouteCommand`] occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandsFreeCommand {
    /// `enable_hands_free`
    Enable,
    /// `disable_hands_free`
    Disable,
}

impl std::fmt::Display for HandsFreeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandsFreeCommand::Enable => write!(f, "enable"),
            HandsFreeCommand::Disable => write!(f, "disable"),
        }
    }
}

/// Errors that can occur while managing audio routes
#[derive(Debug, Error)]
pub enum RouteError {
    /// Enumerating the available output routes failed
    #[error("Failed to get available routes: {message}")]
    RouteQuery {
        /// Human-readable description
        message: String,
        /// Underlying platform failure
        #[source]
        source: Option<PlatformError>,
    },

    /// The platform synchronously rejected a hands-free request
    #[error("Failed to {command} hands-free audio: {message}")]
    RouteCommand {
        /// Which command was rejected
        command: HandsFreeCommand,
        /// Human-readable description
        message: String,
        /// Underlying platform failure
        #[source]
        source: Option<PlatformError>,
    },

    /// Configuration rejected during validation or parsing
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable description
        message: String,
    },

    /// Listener setup or callback fault. Logged and swallowed, never
    /// surfaced from a method call.
    #[error("Internal route manager error: {message}")]
    Internal {
        /// Human-readable description
        message: String,
    },
}

impl RouteError {
    /// Create a route query error wrapping a platform failure
    pub fn route_query(source: PlatformError) -> Self {
        Self::RouteQuery {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a route command error wrapping a platform failure
    pub fn route_command(command: HandsFreeCommand, source: PlatformError) -> Self {
        Self::RouteCommand {
            command,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create a configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable code reported to the caller across the bridge
    pub fn code(&self) -> &'static str {
        match self {
            RouteError::RouteQuery { .. } => "GET_ROUTES_ERROR",
            RouteError::RouteCommand {
                command: HandsFreeCommand::Enable,
                ..
            } => "SCO_ENABLE_ERROR",
            RouteError::RouteCommand {
                command: HandsFreeCommand::Disable,
                ..
            } => "SCO_DISABLE_ERROR",
            RouteError::InvalidConfig { .. } => "INVALID_CONFIG",
            RouteError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
