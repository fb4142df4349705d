//! Multi-day packing of a sequenced crew and per-day status classification.
//!
//! Days are filled in visit order, at most `stops_per_day` sites each. A day
//! starts where the previous one ended; crews stay near the work area
//! overnight instead of returning to the origin.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{DayLimits, PlannerConfig};
use crate::haversine::estimate_route_length_km;
use crate::sequence::SequencedSite;
use crate::site::{ScheduledStop, Site, StopAnnotations};
use crate::solver::{CancelToken, PlanError};
use crate::traits::{RouteMetrics, RoutingProvider};

/// Synthesized driving time for great-circle estimates: `km * 1.5 + 20`.
const FALLBACK_MINUTES_PER_KM: f64 = 1.5;
const FALLBACK_FIXED_MINUTES: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayStatus {
    Ok,
    /// Longer than a working day; reported, not blocking.
    Overtime,
    /// Travel distance or time is not operationally plausible.
    Warning,
}

impl DayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DayStatus::Ok => "OK",
            DayStatus::Overtime => "OVERTIME",
            DayStatus::Warning => "WARNING",
        }
    }
}

/// Travel metrics for one day and where they came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DayMetrics {
    /// Reported by the routing provider.
    Confirmed(RouteMetrics),
    /// Great-circle fallback.
    Estimated(RouteMetrics),
}

impl DayMetrics {
    pub fn metrics(&self) -> RouteMetrics {
        match self {
            DayMetrics::Confirmed(metrics) | DayMetrics::Estimated(metrics) => *metrics,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, DayMetrics::Estimated(_))
    }

    pub fn distance_km(&self) -> f64 {
        self.metrics().distance_km
    }

    pub fn travel_minutes(&self) -> u32 {
        self.metrics().duration_minutes.max(0.0).round() as u32
    }
}

/// One crew's visits on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledDay {
    pub date: NaiveDate,
    /// 1-based day number within the crew.
    pub day_number: usize,
    /// Where the crew sets off from this day.
    pub start: (f64, f64),
    pub stops: Vec<ScheduledStop>,
    pub metrics: DayMetrics,
    pub service_minutes: u32,
    pub buffer_minutes: u32,
    /// travel + service + buffer.
    pub total_minutes: u32,
    pub status: DayStatus,
    pub note: Option<String>,
}

impl ScheduledDay {
    pub fn distance_km(&self) -> f64 {
        self.metrics.distance_km()
    }

    pub fn travel_minutes(&self) -> u32 {
        self.metrics.travel_minutes()
    }

    /// Location of the last visit of the day.
    pub fn end(&self) -> (f64, f64) {
        self.stops
            .last()
            .and_then(|stop| stop.site.location())
            .unwrap_or(self.start)
    }
}

/// Output of packing one crew.
#[derive(Debug, Clone, Default)]
pub struct PackedCrew {
    pub days: Vec<ScheduledDay>,
    /// Sites still unplaced when the working dates ran out.
    pub unscheduled: Vec<Site>,
}

/// Classifies a day against `limits` on unrounded minutes. Impossible jumps
/// win over overtime.
pub fn classify_day(distance_km: f64, travel_minutes: f64, total_minutes: f64, limits: &DayLimits) -> DayStatus {
    if distance_km > limits.max_travel_km || travel_minutes > f64::from(limits.max_travel_minutes) {
        DayStatus::Warning
    } else if total_minutes > f64::from(limits.max_total_minutes) {
        DayStatus::Overtime
    } else {
        DayStatus::Ok
    }
}

/// Great-circle estimate for `start -> stops`, without returning.
pub fn estimate_day_metrics(start: (f64, f64), stops: &[(f64, f64)]) -> RouteMetrics {
    let distance_km = estimate_route_length_km(start, stops, false);
    RouteMetrics {
        distance_km,
        duration_minutes: distance_km * FALLBACK_MINUTES_PER_KM + FALLBACK_FIXED_MINUTES,
    }
}

/// Packs `sequence` into `dates` for crew number `crew`.
///
/// Each day asks `routing` for a better order and for driven metrics; any
/// routing error keeps the incoming order and falls back to
/// [`estimate_day_metrics`]. `cancel` is checked before every day.
pub fn pack_days<R>(
    crew: usize,
    sequence: &[SequencedSite<'_>],
    dates: &[NaiveDate],
    config: &PlannerConfig,
    origin: (f64, f64),
    routing: &R,
    cancel: &CancelToken,
) -> Result<PackedCrew, PlanError>
where
    R: RoutingProvider + ?Sized,
{
    let quota = config.stops_per_day.max(1);
    let mut packed = PackedCrew::default();
    let mut remaining = sequence;
    let mut start = origin;
    let mut crew_position = 0;

    for (day_index, date) in dates.iter().enumerate() {
        if remaining.is_empty() {
            break;
        }
        if cancel.is_cancelled() {
            return Err(PlanError::Cancelled);
        }

        let (batch, rest) = remaining.split_at(quota.min(remaining.len()));
        remaining = rest;

        let batch = order_batch(crew, start, batch, routing);
        let locations: Vec<(f64, f64)> = batch.iter().map(SequencedSite::location).collect();
        let metrics = day_metrics(crew, *date, start, &locations, routing);

        let stop_count = u32::try_from(batch.len()).unwrap_or(u32::MAX);
        let service_minutes = stop_count.saturating_mul(config.service_minutes_per_stop);
        let travel_minutes = metrics.metrics().duration_minutes.max(0.0);
        let exact_total = travel_minutes + f64::from(service_minutes) + f64::from(config.buffer_minutes_per_day);
        // float to int casts saturate
        let total_minutes = exact_total.round() as u32;
        let status = classify_day(metrics.distance_km(), travel_minutes, exact_total, &config.limits);

        let note = match status {
            DayStatus::Warning => {
                let note = format!(
                    "Impossible jump: {:.0} km and {} min of driving in one day",
                    metrics.distance_km(),
                    metrics.travel_minutes()
                );
                warn!(crew, date = %date, "{}", note);
                Some(note)
            }
            _ => None,
        };

        let stops = batch
            .iter()
            .enumerate()
            .map(|(index, sequenced)| {
                crew_position += 1;
                ScheduledStop {
                    site: sequenced.site.clone(),
                    schedule: StopAnnotations {
                        crew,
                        crew_position,
                        scheduled_date: *date,
                        day_position: index + 1,
                        day_distance_km: metrics.distance_km(),
                        day_travel_minutes: metrics.travel_minutes(),
                        day_service_minutes: service_minutes,
                        day_total_minutes: total_minutes,
                        day_status: status,
                        note: note.clone(),
                    },
                }
            })
            .collect();

        debug!(
            crew,
            date = %date,
            stops = batch.len(),
            distance_km = metrics.distance_km(),
            total_minutes,
            status = status.as_str(),
            estimated = metrics.is_estimated(),
            "packed day"
        );

        let day = ScheduledDay {
            date: *date,
            day_number: day_index + 1,
            start,
            stops,
            metrics,
            service_minutes,
            buffer_minutes: config.buffer_minutes_per_day,
            total_minutes,
            status,
            note,
        };
        start = day.end();
        packed.days.push(day);
    }

    if !remaining.is_empty() {
        warn!(
            crew,
            unscheduled = remaining.len(),
            "working days exhausted before every site was scheduled"
        );
        packed.unscheduled = remaining.iter().map(|sequenced| sequenced.site.clone()).collect();
    }

    Ok(packed)
}

fn order_batch<'a, R>(
    crew: usize,
    start: (f64, f64),
    batch: &[SequencedSite<'a>],
    routing: &R,
) -> Vec<SequencedSite<'a>>
where
    R: RoutingProvider + ?Sized,
{
    if batch.len() < 2 {
        return batch.to_vec();
    }

    let locations: Vec<(f64, f64)> = batch.iter().map(SequencedSite::location).collect();
    match routing.optimize_stop_order(start, &locations) {
        Ok(order) if is_permutation(&order, batch.len()) => {
            order.into_iter().map(|index| batch[index]).collect()
        }
        Ok(order) => {
            warn!(crew, returned = order.len(), expected = batch.len(), "ignoring malformed stop order");
            batch.to_vec()
        }
        Err(err) => {
            debug!(crew, error = %err, "stop ordering unavailable, keeping sequence order");
            batch.to_vec()
        }
    }
}

fn day_metrics<R>(
    crew: usize,
    date: NaiveDate,
    start: (f64, f64),
    locations: &[(f64, f64)],
    routing: &R,
) -> DayMetrics
where
    R: RoutingProvider + ?Sized,
{
    match routing.route_metrics(start, locations, false) {
        Ok(metrics) if metrics.distance_km.is_finite() && metrics.duration_minutes.is_finite() => {
            DayMetrics::Confirmed(metrics)
        }
        Ok(_) => {
            warn!(crew, date = %date, "routing returned non-finite metrics, estimating");
            DayMetrics::Estimated(estimate_day_metrics(start, locations))
        }
        Err(err) => {
            warn!(crew, date = %date, error = %err, "route metrics unavailable, estimating");
            DayMetrics::Estimated(estimate_day_metrics(start, locations))
        }
    }
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &index in order {
        if index >= len || seen[index] {
            return false;
        }
        seen[index] = true;
    }
    true
}
