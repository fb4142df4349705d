//! Parameters for one planning run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How many crews to plan for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrewCountMode {
    /// Derive the smallest crew count that covers demand, optionally capped
    /// at the available fleet.
    Automatic { max_crews: Option<usize> },
    Manual(usize),
}

/// Thresholds used to classify a crew-day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayLimits {
    /// Travel distance above which a day is an impossible jump.
    pub max_travel_km: f64,
    /// Pure travel time above which a day is an impossible jump.
    pub max_travel_minutes: u32,
    /// Total working time above which a day is overtime.
    pub max_total_minutes: u32,
}

impl Default for DayLimits {
    fn default() -> Self {
        Self {
            max_travel_km: 500.0,
            max_travel_minutes: 8 * 60,
            max_total_minutes: 12 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// First calendar day of the campaign (inclusive).
    pub start_date: NaiveDate,
    /// Last calendar day of the campaign (inclusive).
    pub end_date: NaiveDate,
    /// Maximum sites one crew visits in one working day.
    pub stops_per_day: usize,
    pub crew_mode: CrewCountMode,
    /// Average time spent at each site.
    pub service_minutes_per_stop: u32,
    /// Fixed contingency added to every crew-day.
    pub buffer_minutes_per_day: u32,
    pub limits: DayLimits,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            start_date: today,
            end_date: today,
            stops_per_day: 8,
            crew_mode: CrewCountMode::Automatic { max_crews: None },
            service_minutes_per_stop: 45,
            buffer_minutes_per_day: 60,
            limits: DayLimits::default(),
        }
    }
}

impl PlannerConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            ..Self::default()
        }
    }

    pub fn stops_per_day(mut self, stops: usize) -> Self {
        self.stops_per_day = stops;
        self
    }

    pub fn manual_crews(mut self, crews: usize) -> Self {
        self.crew_mode = CrewCountMode::Manual(crews);
        self
    }

    pub fn automatic_crews(mut self, max_crews: Option<usize>) -> Self {
        self.crew_mode = CrewCountMode::Automatic { max_crews };
        self
    }

    pub fn service_minutes(mut self, minutes: u32) -> Self {
        self.service_minutes_per_stop = minutes;
        self
    }

    pub fn buffer_minutes(mut self, minutes: u32) -> Self {
        self.buffer_minutes_per_day = minutes;
        self
    }

    pub fn limits(mut self, limits: DayLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Checks the invariants every run relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.start_date > self.end_date {
            return Err(format!(
                "start date {} is after end date {}",
                self.start_date, self.end_date
            ));
        }
        if self.stops_per_day == 0 {
            return Err("stops per day must be at least 1".to_string());
        }
        match self.crew_mode {
            CrewCountMode::Manual(0) => Err("manual crew count must be at least 1".to_string()),
            CrewCountMode::Automatic { max_crews: Some(0) } => {
                Err("crew cap must be at least 1".to_string())
            }
            _ => Ok(()),
        }
    }
}
