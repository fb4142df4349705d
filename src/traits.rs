//! Collaborator seams for the planner.
//!
//! The engine never talks to a road network directly. Anything that can
//! order waypoints or measure a driven route implements [`RoutingProvider`].

use serde::{Deserialize, Serialize};

/// Driven distance and duration of one leg sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    pub distance_km: f64,
    pub duration_minutes: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// No provider is configured.
    #[error("routing provider unavailable")]
    Unavailable,
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid routing response: {0}")]
    InvalidResponse(String),
}

/// External road-network routing.
///
/// Locations are (lat, lng). Calls may block on the network; callers fall
/// back to great-circle estimates on any error.
pub trait RoutingProvider: Sync {
    /// Returns the visiting order for `stops` departing from `start`, as
    /// indices into `stops`.
    fn optimize_stop_order(
        &self,
        start: (f64, f64),
        stops: &[(f64, f64)],
    ) -> Result<Vec<usize>, RoutingError>;

    /// Measures `start -> stops[0] -> ... -> stops[n-1]`, optionally back to `start`.
    fn route_metrics(
        &self,
        start: (f64, f64),
        stops: &[(f64, f64)],
        return_to_start: bool,
    ) -> Result<RouteMetrics, RoutingError>;
}

/// Provider used when no routing service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRouting;

impl RoutingProvider for NoRouting {
    fn optimize_stop_order(
        &self,
        _start: (f64, f64),
        _stops: &[(f64, f64)],
    ) -> Result<Vec<usize>, RoutingError> {
        Err(RoutingError::Unavailable)
    }

    fn route_metrics(
        &self,
        _start: (f64, f64),
        _stops: &[(f64, f64)],
        _return_to_start: bool,
    ) -> Result<RouteMetrics, RoutingError> {
        Err(RoutingError::Unavailable)
    }
}
