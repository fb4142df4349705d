//! Test fixtures for field-planner.
//!
//! Provides realistic test data:
//! - Mexico City store locations (approximate, from OpenStreetMap)
//! - A depot in the historic centre

pub mod mexico_city_locations;

pub use mexico_city_locations::*;
