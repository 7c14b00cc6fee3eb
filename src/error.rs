//! Error types for the card.
//!
//! Missing or unavailable sensor data is never an error; it resolves to 0 or
//! `None` in [`crate::sensors`]. Malformed configuration values are clamped to
//! defaults by [`crate::config`]. What remains are boundary failures and
//! precondition violations.

use thiserror::Error;

/// Failure to turn a configuration payload into a [`crate::config::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("configuration must be an object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("configuration could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Precondition failures of the card lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowCardError {
    #[error("no configuration has been set")]
    MissingConfig,

    #[error("no sensor store was supplied")]
    MissingSensorStore,

    #[error("card is not attached to a scene")]
    NotAttached,
}

/// One tween engine source failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineLoadError {
    #[error("engine source {source_name} is unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
}

/// Path data could not be parsed into geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("path is empty")]
    Empty,

    #[error("path must start with a move command, found '{found}'")]
    MissingMoveTo { found: char },

    #[error("unsupported path command '{command}' at byte {offset}")]
    UnsupportedCommand { command: char, offset: usize },

    #[error("expected a number for command '{command}' at byte {offset}")]
    ExpectedNumber { command: char, offset: usize },
}
