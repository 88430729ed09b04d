//! Error types for the animation graph core.

use serde::{Deserialize, Serialize};

/// Configuration errors surfaced to the direct caller.
///
/// Numeric edge cases (out-of-range parameters, coincident blend points, empty
/// sync sums) are defined behaviour of the weight kernels and never show up here.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimGraphError {
    /// A transition or play request named a state that is not in the graph.
    #[error("Invalid state: '{name}' is not part of the state graph")]
    InvalidState { name: String },

    /// A dot path did not resolve to a clip node inside a state's blend tree.
    #[error("Unknown node '{path}' in state '{state}'")]
    UnknownNode { state: String, path: String },

    /// An asset handed to `assign_animation` was not an `AnimTrack`.
    #[error("Track type mismatch for '{path}': expected AnimTrack, found {found}")]
    TrackTypeMismatch { path: String, found: String },

    /// No layer with the given name exists on the component.
    #[error("Layer not found: {name}")]
    UnknownLayer { name: String },

    /// A state-graph definition could not be turned into runtime objects.
    #[error("Invalid definition: {reason}")]
    InvalidDefinition { reason: String },

    /// A parameter was read or written that the component does not declare.
    #[error("Parameter not found: {name}")]
    UnknownParameter { name: String },

    /// A parameter was accessed with the wrong type.
    #[error("Parameter '{name}' type mismatch: expected {expected}, found {found}")]
    ParameterTypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl AnimGraphError {
    /// Assets may still be streaming in; the caller can retry the assignment later.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TrackTypeMismatch { .. } | Self::UnknownNode { .. }
        )
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } | Self::UnknownLayer { .. } => "state",
            Self::UnknownNode { .. } | Self::TrackTypeMismatch { .. } => "asset",
            Self::InvalidDefinition { .. } => "definition",
            Self::UnknownParameter { .. } | Self::ParameterTypeMismatch { .. } => "parameter",
            Self::Serialization { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for AnimGraphError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, AnimGraphError>;
