//! Error types for the cma SDK.
//!
//! Mapping errors (unknown types, bad shapes, illegal validations) are
//! synchronous and fatal to the single call that raised them. Transport and
//! protocol variants are produced by the HTTP layer and carried here so that
//! resource actions can surface them through one error type.

use std::fmt;
use thiserror::Error;

/// The unified error type for cma operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The payload's `sys.type` has no registered mapper.
    #[error("unknown resource type '{type_tag}'")]
    UnknownType { type_tag: String },

    /// A required key is missing or has the wrong JSON type.
    #[error("invalid shape for {tag} '{subject}': {reason}")]
    InvalidShape {
        subject: String,
        tag: String,
        reason: String,
    },

    /// A field's `type` tag is not in the field factory table.
    #[error("field '{field}' has unknown type '{tag}'")]
    UnknownFieldType { field: String, tag: String },

    /// A validation key is not in the validation factory table.
    #[error("unknown validation '{key}'")]
    UnknownValidation { key: String },

    /// A constraint key is not in the constraint factory table.
    #[error("unknown constraint '{key}'")]
    UnknownConstraint { key: String },

    /// A validation kind was attached to a field type that does not allow it.
    #[error("validation '{validation}' is not allowed on {field_type} fields")]
    IllegalValidation {
        validation: String,
        field_type: String,
    },

    /// A constraint kind was attached where it is not allowed.
    #[error("constraint '{constraint}' is not allowed in {context}")]
    IllegalConstraint {
        constraint: String,
        context: String,
    },

    /// A collection envelope is missing a key or has the wrong shape.
    #[error("malformed collection: {reason}")]
    MalformedCollection { reason: String },

    /// A resource was expected to be of one concrete type but was another.
    #[error("expected resource of type {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// An action was requested on a resource with no client back-reference.
    #[error("{type_tag} is not attached to a client")]
    Detached { type_tag: String },

    /// The resource kind does not offer the requested action.
    #[error("{type_tag} does not support '{action}'")]
    UnsupportedAction { action: String, type_tag: String },

    /// An operation needs a system property the resource does not have yet.
    #[error("{type_tag} has no sys.{property}")]
    MissingSystemProperty {
        type_tag: String,
        property: &'static str,
    },

    /// Input validation errors (configuration, identifiers).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Network transport errors (connection, timeout, HTTP).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Error responses returned by the API.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A resource could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_shape(
        subject: impl Into<String>,
        tag: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidShape {
            subject: subject.into(),
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_collection(reason: impl Into<String>) -> Self {
        Error::MalformedCollection {
            reason: reason.into(),
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Response body could not be decoded.
    #[error("could not decode response: {message}")]
    Decode { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// An error response from the API.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error id from the response's `sys.id` (e.g. `VersionMismatch`).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
    /// Request id, useful when reporting issues upstream.
    pub request_id: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
            request_id: None,
        }
    }

    /// Attach the request id reported by the server.
    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Check if the server rejected the request because of a stale version.
    pub fn is_version_mismatch(&self) -> bool {
        self.status == 409 || self.error.as_deref() == Some("VersionMismatch")
    }

    /// Check if the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status == 404 || self.error.as_deref() == Some("NotFound")
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401 || self.error.as_deref() == Some("AccessTokenInvalid")
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// A required setting is missing.
    #[error("missing {name}")]
    Missing { name: String },

    /// A field id is already taken on a content type.
    #[error("duplicate field id '{id}'")]
    DuplicateField { id: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::new(
            409,
            Some("VersionMismatch".to_string()),
            Some("version is stale".to_string()),
        );
        assert_eq!(err.to_string(), "HTTP 409 [VersionMismatch]: version is stale");
        assert!(err.is_version_mismatch());
        assert!(!err.is_not_found());
    }

    #[test]
    fn illegal_validation_names_both_kinds() {
        let err = Error::IllegalValidation {
            validation: "range".to_string(),
            field_type: "Symbol".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("range"));
        assert!(message.contains("Symbol"));
    }

    #[test]
    fn invalid_shape_names_field_and_tag() {
        let err = Error::invalid_shape("bestFriend", "Link", "missing linkType");
        let message = err.to_string();
        assert!(message.contains("bestFriend"));
        assert!(message.contains("Link"));
    }
}
