//! Error types for scene graph operations.
//!
//! Every fallible controller operation returns [`GraphError`]. Structural
//! errors are reported before anything is mutated, so the element tree is
//! left exactly as it was when one is returned.

use thiserror::Error;

/// The main error type for Meridian operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A tree edit that would break ownership or identity rules, such as
    /// inserting an already-parented element or creating a containment cycle.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A model that cannot be turned into a consistent element tree.
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Malformed view padding settings.
    #[error("Invalid view padding: {0}")]
    InvalidViewPadding(String),

    /// An operation issued in a state that does not permit it, such as
    /// driving a destroyed layout or querying a controller without a graph.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A style value that does not deserialize into the requested type.
    #[error("Invalid style value for `{key}`: {message}")]
    Style { key: String, message: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
