//! OSRM HTTP adapter for route metrics and waypoint ordering.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::debug;

use crate::traits::{RouteMetrics, RoutingError, RoutingProvider};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Blocking OSRM client. Responses are cached per client, keyed by the
/// requested coordinates, for the client's lifetime.
#[derive(Debug)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
    metrics_cache: Mutex<HashMap<String, RouteMetrics>>,
    order_cache: Mutex<HashMap<String, Vec<usize>>>,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            metrics_cache: Mutex::new(HashMap::new()),
            order_cache: Mutex::new(HashMap::new()),
        })
    }

    /// Drops every cached response.
    pub fn clear_cache(&self) {
        self.metrics_cache.lock().clear();
        self.order_cache.lock().clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.metrics_cache.lock().len() + self.order_cache.lock().len()
    }

    fn url(&self, service: &str, coords: &str, query: &str) -> String {
        format!(
            "{}/{}/v1/{}/{}?{}",
            self.config.base_url, service, self.config.profile, coords, query
        )
    }

    fn get<T: for<'de> Deserialize<'de>>(&self, url: String) -> Result<T, RoutingError> {
        debug!(url = %url, "OSRM request");
        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<T>())?;
        Ok(body)
    }
}

impl RoutingProvider for OsrmClient {
    fn optimize_stop_order(
        &self,
        start: (f64, f64),
        stops: &[(f64, f64)],
    ) -> Result<Vec<usize>, RoutingError> {
        if stops.len() < 2 {
            return Ok((0..stops.len()).collect());
        }

        let mut locations = Vec::with_capacity(stops.len() + 1);
        locations.push(start);
        locations.extend_from_slice(stops);
        let coords = coordinate_list(&locations);

        if let Some(order) = self.order_cache.lock().get(&coords) {
            return Ok(order.clone());
        }

        let url = self.url(
            "trip",
            &coords,
            "source=first&destination=any&roundtrip=false&overview=false",
        );
        let order = parse_stop_order(self.get::<OsrmTripResponse>(url)?, stops.len())?;
        self.order_cache.lock().insert(coords, order.clone());
        Ok(order)
    }

    fn route_metrics(
        &self,
        start: (f64, f64),
        stops: &[(f64, f64)],
        return_to_start: bool,
    ) -> Result<RouteMetrics, RoutingError> {
        if stops.is_empty() {
            return Ok(RouteMetrics {
                distance_km: 0.0,
                duration_minutes: 0.0,
            });
        }

        let mut locations = Vec::with_capacity(stops.len() + 2);
        locations.push(start);
        locations.extend_from_slice(stops);
        if return_to_start {
            locations.push(start);
        }
        let coords = coordinate_list(&locations);

        if let Some(metrics) = self.metrics_cache.lock().get(&coords) {
            return Ok(*metrics);
        }

        let url = self.url("route", &coords, "overview=false");
        let metrics = parse_route_metrics(self.get::<OsrmRouteResponse>(url)?)?;
        self.metrics_cache.lock().insert(coords, metrics);
        Ok(metrics)
    }
}

/// OSRM expects `lng,lat` pairs separated by `;`.
fn coordinate_list(locations: &[(f64, f64)]) -> String {
    locations
        .iter()
        .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_route_metrics(body: OsrmRouteResponse) -> Result<RouteMetrics, RoutingError> {
    if body.code != "Ok" {
        return Err(RoutingError::InvalidResponse(body.message.unwrap_or(body.code)));
    }
    let route = body
        .routes
        .first()
        .ok_or_else(|| RoutingError::InvalidResponse("no routes returned".to_string()))?;

    Ok(RouteMetrics {
        distance_km: route.distance / 1000.0,
        duration_minutes: route.duration / 60.0,
    })
}

/// Converts trip waypoints (input order, first one the start) into stop
/// indices in visiting order.
fn parse_stop_order(body: OsrmTripResponse, stops: usize) -> Result<Vec<usize>, RoutingError> {
    if body.code != "Ok" {
        return Err(RoutingError::InvalidResponse(body.message.unwrap_or(body.code)));
    }
    if body.waypoints.len() != stops + 1 {
        return Err(RoutingError::InvalidResponse(format!(
            "expected {} waypoints, got {}",
            stops + 1,
            body.waypoints.len()
        )));
    }

    let mut order: Vec<(usize, usize)> = body
        .waypoints
        .iter()
        .enumerate()
        .skip(1)
        .map(|(input_index, waypoint)| (waypoint.waypoint_index, input_index - 1))
        .collect();
    order.sort_by_key(|(position, _)| *position);

    Ok(order.into_iter().map(|(_, stop)| stop).collect())
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmTripResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    waypoints: Vec<OsrmWaypoint>,
}

#[derive(Debug, Deserialize)]
struct OsrmWaypoint {
    waypoint_index: usize,
}
