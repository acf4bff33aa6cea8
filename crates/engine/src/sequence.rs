use std::{ops::Index, sync::Arc};

use async_trait::async_trait;
use shared::{domain::Coordinate, error::RouteError};

use crate::error::EngineError;

#[async_trait]
pub trait RouteSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Coordinate>, RouteError>;
}

/// Validated, non-empty route in traversal order. Never reordered or
/// deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSequence {
    waypoints: Arc<[Coordinate]>,
}

impl WaypointSequence {
    pub fn new(waypoints: Vec<Coordinate>) -> Result<Self, EngineError> {
        if waypoints.is_empty() {
            return Err(EngineError::EmptyRoute);
        }
        for (index, waypoint) in waypoints.iter().enumerate() {
            waypoint
                .validate()
                .map_err(|source| EngineError::InvalidCoordinate { index, source })?;
        }
        Ok(Self {
            waypoints: waypoints.into(),
        })
    }

    pub async fn load(source: &dyn RouteSource) -> Result<Self, EngineError> {
        let waypoints = source.load().await.map_err(|err| match err {
            RouteError::Empty => EngineError::EmptyRoute,
            other => EngineError::Route(other),
        })?;
        Self::new(waypoints)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Coordinate> {
        self.waypoints.get(index).copied()
    }

    pub fn first(&self) -> Coordinate {
        self.waypoints[0]
    }

    pub fn last(&self) -> Coordinate {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coordinate> {
        self.waypoints.iter()
    }

    pub fn as_slice(&self) -> &[Coordinate] {
        &self.waypoints
    }
}

impl Index<usize> for WaypointSequence {
    type Output = Coordinate;

    fn index(&self, index: usize) -> &Self::Output {
        &self.waypoints[index]
    }
}
