//! Sites to visit and the scheduling annotations the planner attaches to them.
//!
//! A [`Site`] is supplied by the caller and never modified by the planner.
//! Everything the planner decides lives in [`StopAnnotations`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::packing::DayStatus;

/// Outcome of geocoding a site address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeocodeStatus {
    Pending,
    Confirmed,
    /// Matched, but with low precision or a partial address.
    ConfirmedWithWarning,
    Failed,
}

impl GeocodeStatus {
    pub fn is_usable(self) -> bool {
        matches!(self, GeocodeStatus::Confirmed | GeocodeStatus::ConfirmedWithWarning)
    }
}

/// A physical location to visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub geocode_status: GeocodeStatus,
    pub region: Option<String>,
    pub brand: Option<String>,
}

impl Site {
    /// A site that has not been geocoded yet.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat: None,
            lng: None,
            geocode_status: GeocodeStatus::Pending,
            region: None,
            brand: None,
        }
    }

    /// A confirmed site at (lat, lng).
    pub fn geocoded(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            geocode_status: GeocodeStatus::Confirmed,
            ..Self::new(id, name)
        }
    }

    /// Location coordinates (lat, lng), if geocoded to finite values.
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }

    /// Whether the site can take part in crew assignment.
    pub fn is_usable(&self) -> bool {
        self.geocode_status.is_usable() && self.location().is_some()
    }
}

/// Scheduling decisions for one visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopAnnotations {
    /// 1-based crew number.
    pub crew: usize,
    /// 1-based position within the crew's whole sequence.
    pub crew_position: usize,
    pub scheduled_date: NaiveDate,
    /// 1-based position within the day.
    pub day_position: usize,
    pub day_distance_km: f64,
    pub day_travel_minutes: u32,
    pub day_service_minutes: u32,
    pub day_total_minutes: u32,
    pub day_status: DayStatus,
    pub note: Option<String>,
}

/// A site together with where and when it is visited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledStop {
    pub site: Site,
    pub schedule: StopAnnotations,
}

impl ScheduledStop {
    pub fn site_id(&self) -> &str {
        &self.site.id
    }
}
