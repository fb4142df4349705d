//! Great-circle primitives (fallback when the routing provider is unavailable).
//!
//! Distances ignore roads. Route lengths are padded by a fixed
//! curvature factor to approximate driving distance.

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Multiplier applied to straight-line route length to approximate roads.
pub const ROAD_FACTOR: f64 = 1.30;

/// Calculate haversine distance between two (lat, lng) points in kilometers.
pub fn distance_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Initial compass bearing from `from` to `to`, degrees clockwise from north.
///
/// Always in `[0, 360)`.
pub fn bearing_deg(from: (f64, f64), to: (f64, f64)) -> f64 {
    let lat1 = from.0.to_radians();
    let lat2 = to.0.to_radians();
    let delta_lng = (to.1 - from.1).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();

    let degrees = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if degrees >= 360.0 { 0.0 } else { degrees }
}

/// Estimated road length of `origin -> stops[0] -> ... -> stops[n-1]`,
/// optionally closing the loop back to `origin`.
pub fn estimate_route_length_km(
    origin: (f64, f64),
    stops: &[(f64, f64)],
    return_to_origin: bool,
) -> f64 {
    let mut raw = 0.0;
    let mut current = origin;
    for stop in stops {
        raw += distance_km(current, *stop);
        current = *stop;
    }
    if return_to_origin && !stops.is_empty() {
        raw += distance_km(current, origin);
    }

    raw * ROAD_FACTOR
}
