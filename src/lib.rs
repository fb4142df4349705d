//! field-planner core
//!
//! Splits geocoded sites between crews and packs each crew's visits into
//! working days under a per-day stop quota.

pub mod traits;
pub mod haversine;
pub mod site;
pub mod config;
pub mod capacity;
pub mod cluster;
pub mod sequence;
pub mod packing;
pub mod solver;
pub mod osrm;
