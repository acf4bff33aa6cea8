use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("malformed coordinate '{input}': use decimal 'lat,lon', e.g. 37.7749,-122.4194")]
    Malformed { input: String },
    #[error(
        "coordinate ({latitude}, {longitude}) out of range: latitude must be within [-90, 90] and longitude within [-180, 180]"
    )]
    OutOfRange { latitude: f64, longitude: f64 },
}

/// Failure to produce a route from a routing service or a coordinate file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("route request failed: {0}")]
    Http(String),
    #[error("no route found - check locations are valid and reachable")]
    NoRoute,
    #[error("invalid route geometry in routing response")]
    InvalidGeometry,
    #[error("route source produced no coordinates")]
    Empty,
    #[error("failed to read route file '{path}': {message}")]
    Io { path: String, message: String },
}

/// Failure to push one location fix to a simulator or emulator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("failed to launch '{program}': {message}")]
    Spawn { program: String, message: String },
    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("'{tool}' command not found. {hint}")]
    ToolMissing { tool: String, hint: String },
    #[error("{0}")]
    Other(String),
}

impl DispatchError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
