//! Unified error system for Keystone
//!
//! A single error type shared by every crate in the workspace. The variants
//! follow the broker's failure taxonomy so that outer layers can map them to
//! transport status codes without inspecting message strings.

use crate::types::GrantStatus;
use serde::{Deserialize, Serialize};

/// Unified error type for all Keystone operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum KeystoneError {
    /// Malformed request, missing field or bad enumeration value
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message describing the invalid input
        message: String,
    },

    /// Uniqueness violation (duplicate public key or email)
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message describing the conflicting record
        message: String,
    },

    /// Grant or agent id unknown
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Transition attempted from a non-eligible status
    #[error("{message} (status: {status})")]
    InvalidState {
        /// Status the record was in when the transition was attempted
        status: GrantStatus,
        /// Error message describing the rejected transition
        message: String,
    },

    /// Authorization policy denial
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Error message naming the role requirement
        message: String,
    },

    /// Timed grant past its window
    #[error("Expired: {message}")]
    Expired {
        /// Error message describing what expired
        message: String,
    },

    /// Challenge-response or bearer credential rejected
    #[error("Unauthenticated: {message}")]
    Unauthenticated {
        /// Error message describing the authentication failure
        message: String,
    },

    /// Storage backend unavailable or failing
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Cryptographic operation failed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Error message describing the cryptographic failure
        message: String,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl KeystoneError {
    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an invalid state error carrying the current status
    pub fn invalid_state(status: GrantStatus, message: impl Into<String>) -> Self {
        Self::InvalidState {
            status,
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create an expired error
    pub fn expired(message: impl Into<String>) -> Self {
        Self::Expired {
            message: message.into(),
        }
    }

    /// Create an unauthenticated error
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Transport status code conventionally associated with this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } | Self::InvalidState { .. } => 400,
            Self::Unauthenticated { .. } => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::Expired { .. } => 410,
            Self::Config { .. }
            | Self::Storage { .. }
            | Self::Serialization { .. }
            | Self::Crypto { .. }
            | Self::Internal { .. } => 500,
        }
    }
}

/// Standard Result type for Keystone operations
pub type Result<T> = std::result::Result<T, KeystoneError>;

impl From<serde_json::Error> for KeystoneError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for KeystoneError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::storage(err.to_string()),
        }
    }
}
