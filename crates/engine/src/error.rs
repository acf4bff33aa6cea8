use shared::error::{CoordinateError, RouteError};
use thiserror::Error;

/// Errors that prevent a session from starting. Per-step dispatch failures
/// are not represented here; the pacing loop absorbs them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    Configuration(String),
    #[error("route contains no waypoints")]
    EmptyRoute,
    #[error("waypoint {index} is invalid: {source}")]
    InvalidCoordinate {
        index: usize,
        #[source]
        source: CoordinateError,
    },
    #[error(transparent)]
    Route(#[from] RouteError),
}

impl EngineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
