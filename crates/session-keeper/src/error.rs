//! Error types for the background session keeper

use thiserror::Error;

/// Result type for session keeper operations
pub type KeeperResult<T> = Result<T, KeeperError>;

/// Host operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOperation {
    StartForeground,
    StopForeground,
    ApplyAudioProfile,
    SetKeepAwake,
}

impl std::fmt::Display for HostOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostOperation::StartForeground => write!(f, "start foreground task"),
            HostOperation::StopForeground => write!(f, "stop foreground task"),
            HostOperation::ApplyAudioProfile => write!(f, "apply audio profile"),
            HostOperation::SetKeepAwake => write!(f, "set keep-awake"),
        }
    }
}

/// Errors raised by the session keeper
#[derive(Debug, Error)]
pub enum KeeperError {
    /// A host call failed
    #[error("Failed to {operation}: {message}")]
    Host {
        operation: HostOperation,
        message: String,
    },

    /// Configuration rejected during validation
    #[error("Invalid keeper configuration: {message}")]
    InvalidConfig { message: String },
}

impl KeeperError {
    /// Create a host error
    pub fn host(operation: HostOperation, message: impl Into<String>) -> Self {
        Self::Host {
            operation,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_error_display() {
        let err = KeeperError::host(HostOperation::StartForeground, "service not declared");
        assert_eq!(err.to_string(), "Failed to start foreground task: service not declared");
    }
}
