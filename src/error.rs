//! Error types for the synthesis engine.
//!
//! Construction strategies that cannot build a value decline with `None`;
//! nothing here is raised for that. These enums cover collaborator faults
//! (an introspection provider failing a query) and configuration problems
//! (a malformed constraint document or an out-of-range probability).

use std::io;

/// Failure reported by an [`Introspector`](crate::introspect::Introspector)
/// or by a registered callable.
///
/// Strategies catch these and treat them as a decline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntrospectionError {
    #[error("cannot set field `{field}` on a non-object value")]
    NotAnObject { field: String },

    #[error("`{callable}` expected {expected} arguments, got {actual}")]
    Arity {
        callable: String,
        expected: usize,
        actual: usize,
    },

    #[error("`{callable}` rejected its arguments: {reason}")]
    Rejected { callable: String, reason: String },

    #[error("malformed metadata for `{0}`")]
    Malformed(String),
}

/// Errors raised while building, importing or exporting a [`Config`](crate::decisions::Config).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{field} must be within [0, 1], got {value}")]
    InvalidProbability { field: &'static str, value: f64 },

    #[error("instance path must not be empty")]
    EmptyInstancePath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
