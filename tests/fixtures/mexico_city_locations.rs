//! Mexico City area store locations for realistic test fixtures.
//!
//! All stores are within 50 km of the Zócalo depot.

use field_planner::site::Site;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    pub fn site(&self, id: &str) -> Site {
        Site::geocoded(id, self.name, self.lat, self.lng)
    }
}

/// Zócalo, historic centre.
pub const DEPOT: Location = Location::new("Zócalo", 19.4326, -99.1332);

pub const STORES: &[Location] = &[
    Location::new("Coyoacán", 19.3467, -99.1617),
    Location::new("Polanco", 19.4333, -99.1950),
    Location::new("Santa Fe", 19.3600, -99.2600),
    Location::new("Azcapotzalco", 19.4869, -99.1860),
    Location::new("Iztapalapa", 19.3553, -99.0622),
    Location::new("Xochimilco", 19.2572, -99.1030),
    Location::new("Tlalnepantla", 19.5400, -99.1950),
    Location::new("Ecatepec", 19.6010, -99.0500),
    Location::new("Nezahualcóyotl", 19.4006, -99.0148),
    Location::new("Tlalpan", 19.2870, -99.1670),
];

/// Every store as a confirmed site, ids `store-01` .. `store-10`.
pub fn store_sites() -> Vec<Site> {
    STORES
        .iter()
        .enumerate()
        .map(|(index, location)| location.site(&format!("store-{:02}", index + 1)))
        .collect()
}
