//! Error types.
//!
//! Loading a classification resource is the only fallible step of the engine.
//! Failing at construction is fatal for the host (no rule set, no engine);
//! failing during a reload leaves the previous rule set in place.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read classification resource: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed classification resource: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A pattern uses characters or a shape the matcher does not understand.
    #[error("invalid match pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("rule {index} references unknown group '#{group}'")]
    UnknownGroup { index: usize, group: String },

    /// Groups may only contain plain patterns.
    #[error("group '{group}' references another group '{pattern}'")]
    NestedGroup { group: String, pattern: String },

    #[error("rule {index} has an empty category")]
    EmptyCategory { index: usize },
}

/// A name that does not denote any known value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("unknown {kind} '{value}'")]
    Unknown { kind: &'static str, value: String },
}
