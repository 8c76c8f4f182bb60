//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including path validation and configuration payload decoding.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The mount mapping payload could not be decoded
    #[error("Malformed mount mappings: {0}")]
    MalformedMappings(String),

    /// A remote configuration payload could not be decoded
    #[error("Malformed remote configuration {name}: {reason}")]
    MalformedRemoteConf {
        /// Name of the entry that carried the payload
        name: String,
        /// Decoder message
        reason: String,
    },

    /// A domain value could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(String),
}
