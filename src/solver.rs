//! Schedule assembly: feasibility gate, crew assignment, sequencing and
//! day packing for every crew.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::capacity::{ProjectCapacity, resolve_crew_count, working_dates};
use crate::cluster::assign_crews;
use crate::config::{CrewCountMode, PlannerConfig};
use crate::packing::{DayStatus, PackedCrew, ScheduledDay, pack_days};
use crate::sequence::sequence_sites;
use crate::site::{ScheduledStop, Site};
use crate::traits::RoutingProvider;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("invalid planner configuration: {0}")]
    InvalidConfig(String),
    #[error(
        "capacity of {} stops cannot cover {} sites; {} more crew(s) needed",
        .0.total_capacity,
        .0.demand,
        .0.extra_crews_needed
    )]
    InsufficientCapacity(ProjectCapacity),
    #[error("planning cancelled")]
    Cancelled,
}

/// Caller-held flag that stops a run before its next routing call.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// All days planned for one crew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewSchedule {
    /// 1-based crew number.
    pub crew: usize,
    pub days: Vec<ScheduledDay>,
    /// Sites assigned to this crew that did not fit before the window closed.
    pub unscheduled: Vec<Site>,
    pub total_distance_km: f64,
    pub total_minutes: u32,
}

impl CrewSchedule {
    fn new(crew: usize, packed: PackedCrew) -> Self {
        let total_distance_km = packed.days.iter().map(ScheduledDay::distance_km).sum();
        let total_minutes = packed.days.iter().map(|day| day.total_minutes).sum();
        Self {
            crew,
            days: packed.days,
            unscheduled: packed.unscheduled,
            total_distance_km,
            total_minutes,
        }
    }

    /// Every scheduled stop in visit order.
    pub fn stops(&self) -> impl Iterator<Item = &ScheduledStop> {
        self.days.iter().flat_map(|day| day.stops.iter())
    }

    pub fn stop_count(&self) -> usize {
        self.days.iter().map(|day| day.stops.len()).sum()
    }

    /// True when any day fell back to great-circle estimates.
    pub fn is_estimated(&self) -> bool {
        self.days.iter().any(|day| day.metrics.is_estimated())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub capacity: ProjectCapacity,
    pub crews: Vec<CrewSchedule>,
    /// Ids of sites left out for lack of usable coordinates.
    pub excluded: Vec<String>,
}

impl Schedule {
    pub fn stop_count(&self) -> usize {
        self.crews.iter().map(CrewSchedule::stop_count).sum()
    }

    pub fn unscheduled_count(&self) -> usize {
        self.crews.iter().map(|crew| crew.unscheduled.len()).sum()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.crews.iter().map(|crew| crew.total_distance_km).sum()
    }

    pub fn days_with_status(&self, status: DayStatus) -> usize {
        self.crews
            .iter()
            .flat_map(|crew| crew.days.iter())
            .filter(|day| day.status == status)
            .count()
    }
}

/// Builds a dated, sequenced plan for `sites` departing from `origin`.
///
/// Unusable sites are skipped and listed in [`Schedule::excluded`]. In
/// automatic crew mode the run stops with
/// [`PlanError::InsufficientCapacity`] before any assignment work when the
/// crews cannot cover demand. Crews are packed in parallel.
pub fn plan<R>(
    sites: &[Site],
    origin: (f64, f64),
    config: &PlannerConfig,
    routing: &R,
    cancel: &CancelToken,
) -> Result<Schedule, PlanError>
where
    R: RoutingProvider + ?Sized,
{
    config.validate().map_err(PlanError::InvalidConfig)?;

    let (usable, unusable): (Vec<&Site>, Vec<&Site>) = sites.iter().partition(|site| site.is_usable());
    let excluded: Vec<String> = unusable.iter().map(|site| site.id.clone()).collect();
    if !excluded.is_empty() {
        warn!(excluded = excluded.len(), "skipping sites without usable coordinates");
    }

    let demand = usable.len();
    let crews = resolve_crew_count(demand, config);
    let capacity = ProjectCapacity::compute(demand, config, crews);

    if matches!(config.crew_mode, CrewCountMode::Automatic { .. }) && !capacity.is_sufficient() {
        warn!(
            demand,
            capacity = capacity.total_capacity,
            extra_crews = capacity.extra_crews_needed,
            "capacity insufficient"
        );
        return Err(PlanError::InsufficientCapacity(capacity));
    }

    info!(
        sites = demand,
        crews,
        working_days = capacity.working_days,
        "planning schedule"
    );

    let dates = working_dates(config.start_date, config.end_date);
    let blocks = assign_crews(&usable, crews, origin);

    let crew_schedules = blocks
        .par_iter()
        .enumerate()
        .map(|(index, block)| -> Result<CrewSchedule, PlanError> {
            let crew = index + 1;
            let sequence = sequence_sites(block, origin);
            let packed = pack_days(crew, &sequence, &dates, config, origin, routing, cancel)?;
            Ok(CrewSchedule::new(crew, packed))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let schedule = Schedule {
        capacity,
        crews: crew_schedules,
        excluded,
    };

    info!(
        stops = schedule.stop_count(),
        unscheduled = schedule.unscheduled_count(),
        warnings = schedule.days_with_status(DayStatus::Warning),
        overtime = schedule.days_with_status(DayStatus::Overtime),
        "schedule complete"
    );

    Ok(schedule)
}
