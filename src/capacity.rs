//! Capacity feasibility: can the crews cover every site inside the window?

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::{CrewCountMode, PlannerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityStatus {
    Sufficient,
    Insufficient,
}

/// Feasibility summary for one set of inputs. Recompute whenever demand,
/// configuration or crew count changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCapacity {
    pub working_days: usize,
    pub crews: usize,
    pub stops_per_day: usize,
    /// crews x working days x stops per day.
    pub total_capacity: usize,
    pub demand: usize,
    /// Sites that cannot fit in the window.
    pub unassigned: usize,
    pub extra_crews_needed: usize,
    pub status: CapacityStatus,
}

impl ProjectCapacity {
    pub fn compute(demand: usize, config: &PlannerConfig, crews: usize) -> Self {
        let working_days = working_day_count(config.start_date, config.end_date);
        Self::from_parts(demand, working_days, config.stops_per_day, crews)
    }

    pub fn from_parts(demand: usize, working_days: usize, stops_per_day: usize, crews: usize) -> Self {
        let working_days = working_days.max(1);
        let per_crew = working_days.saturating_mul(stops_per_day);
        let total_capacity = crews.saturating_mul(per_crew);

        let (status, unassigned, extra_crews_needed) = if total_capacity >= demand {
            (CapacityStatus::Sufficient, 0, 0)
        } else {
            let missing = demand - total_capacity;
            let extra = if per_crew == 0 { 0 } else { missing.div_ceil(per_crew) };
            (CapacityStatus::Insufficient, missing, extra)
        };

        Self {
            working_days,
            crews,
            stops_per_day,
            total_capacity,
            demand,
            unassigned,
            extra_crews_needed,
            status,
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.status == CapacityStatus::Sufficient
    }
}

/// Calendar days in `[start, end]` except Sundays.
pub fn working_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| day.weekday() != Weekday::Sun)
        .collect()
}

/// Working-day count, floored at 1.
pub fn working_day_count(start: NaiveDate, end: NaiveDate) -> usize {
    working_dates(start, end).len().max(1)
}

/// Crew count for a run: the manual value, or the smallest count that
/// covers `demand` (capped by the fleet limit when one is set).
pub fn resolve_crew_count(demand: usize, config: &PlannerConfig) -> usize {
    match config.crew_mode {
        CrewCountMode::Manual(crews) => crews,
        CrewCountMode::Automatic { max_crews } => {
            let per_crew = working_day_count(config.start_date, config.end_date).saturating_mul(config.stops_per_day);
            let needed = if per_crew == 0 { 1 } else { demand.div_ceil(per_crew).max(1) };
            match max_crews {
                Some(cap) => needed.min(cap),
                None => needed,
            }
        }
    }
}
