//! Error types for the convergence core.
//!
//! All failures are returned values; the core never panics on remote or
//! mapping problems. Every error implements `std::error::Error` via
//! `thiserror`.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for convergence operations.
pub type ConvergeResult<T> = Result<T, ConvergeError>;

/// Errors that can occur while converging a resource.
#[derive(Debug, Error)]
pub enum ConvergeError {
    /// A field rule is malformed or a value cannot be flattened onto the
    /// wire (fatal, no retry).
    #[error("Cannot map field '{field}': {message}")]
    Mapping {
        /// The local field being mapped.
        field: String,
        /// What went wrong.
        message: String,
    },

    /// A required path was missing from a response payload. Probing
    /// lookups never raise this; only required extraction does.
    #[error("Required path '{path}' missing from response")]
    MissingPath {
        /// The dotted path that was not found.
        path: String,
    },

    /// Every zone candidate in the region rejected the request.
    #[error("No availability zone in region '{region}' accepted '{wire_name}' after {attempts} attempts")]
    ZoneExhausted {
        /// The wire name the zone was injected under.
        wire_name: String,
        /// The region the catalog was filtered to.
        region: String,
        /// Number of candidates probed.
        attempts: usize,
    },

    /// A remote operation failed.
    #[error("Remote operation failed: {operation}: {message}")]
    Remote {
        /// The operation that failed (e.g., "describe", "create").
        operation: String,
        /// Error message from the transport or control plane.
        message: String,
    },

    /// The zone catalog could not be fetched.
    #[error("Zone catalog lookup failed: {message}")]
    Catalog {
        /// Error message.
        message: String,
    },

    /// Polling gave up before the resource reached a target status.
    #[error("Timed out after {elapsed:?} waiting for target status (last status '{last}')")]
    PollTimeout {
        /// How long the poller waited.
        elapsed: Duration,
        /// The last status label observed.
        last: String,
    },

    /// Polling observed a terminal failure status.
    #[error("Resource entered failure status '{label}'")]
    PollFailState {
        /// The failure label observed.
        label: String,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl ConvergeError {
    /// Creates a mapping error.
    pub fn mapping(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a missing-path error.
    pub fn missing_path(path: impl Into<String>) -> Self {
        Self::MissingPath { path: path.into() }
    }

    /// Creates a remote-operation error.
    pub fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a catalog error.
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient condition that an
    /// external retry loop may reasonably re-run (e.g., a delete flow that
    /// wraps the whole sequence).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConvergeError::Remote { .. }
                | ConvergeError::Catalog { .. }
                | ConvergeError::PollTimeout { .. }
        )
    }
}
