//! End-to-end planner tests
//!
//! Feasibility gate, crew assignment, day packing and routing fallback
//! against real Mexico City locations.

mod fixtures;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;

use field_planner::capacity::{CapacityStatus, working_dates};
use field_planner::haversine::estimate_route_length_km;
use field_planner::packing::{DayMetrics, DayStatus};
use field_planner::site::{GeocodeStatus, Site};
use field_planner::solver::{CancelToken, PlanError, Schedule, plan};
use field_planner::config::PlannerConfig;
use field_planner::traits::{NoRouting, RouteMetrics, RoutingError, RoutingProvider};

use fixtures::{DEPOT, store_sites};

// ============================================================================
// Test Fixtures
// ============================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Wed 2024-03-06 .. Mon 2024-03-11: five working days around a Sunday.
fn five_day_config() -> PlannerConfig {
    PlannerConfig::new(date(2024, 3, 6), date(2024, 3, 11))
}

/// Reports the same metrics for every day and counts calls.
struct FixedRouting {
    metrics: RouteMetrics,
    calls: AtomicUsize,
}

impl FixedRouting {
    fn new(distance_km: f64, duration_minutes: f64) -> Self {
        Self {
            metrics: RouteMetrics {
                distance_km,
                duration_minutes,
            },
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RoutingProvider for FixedRouting {
    fn optimize_stop_order(
        &self,
        _start: (f64, f64),
        stops: &[(f64, f64)],
    ) -> Result<Vec<usize>, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..stops.len()).collect())
    }

    fn route_metrics(
        &self,
        _start: (f64, f64),
        _stops: &[(f64, f64)],
        _return_to_start: bool,
    ) -> Result<RouteMetrics, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.metrics)
    }
}

/// Cancels the run from inside the first metrics request.
struct CancellingRouting {
    cancel: CancelToken,
}

impl RoutingProvider for CancellingRouting {
    fn optimize_stop_order(
        &self,
        _start: (f64, f64),
        _stops: &[(f64, f64)],
    ) -> Result<Vec<usize>, RoutingError> {
        Err(RoutingError::Unavailable)
    }

    fn route_metrics(
        &self,
        _start: (f64, f64),
        _stops: &[(f64, f64)],
        _return_to_start: bool,
    ) -> Result<RouteMetrics, RoutingError> {
        self.cancel.cancel();
        Err(RoutingError::Unavailable)
    }
}

fn scheduled_ids(schedule: &Schedule) -> Vec<String> {
    schedule
        .crews
        .iter()
        .flat_map(|crew| crew.stops().map(|stop| stop.site.id.clone()))
        .collect()
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn single_crew_covers_mexico_city_in_five_days() {
    let sites = store_sites();
    let config = five_day_config().stops_per_day(2).manual_crews(1);

    let schedule = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new())
        .expect("plan should succeed");

    assert_eq!(schedule.capacity.status, CapacityStatus::Sufficient);
    assert_eq!(schedule.capacity.total_capacity, 10);
    assert_eq!(schedule.capacity.demand, 10);
    assert_eq!(schedule.crews.len(), 1);

    let crew = &schedule.crews[0];
    assert_eq!(crew.days.len(), 5);
    assert!(crew.days.iter().all(|day| day.stops.len() == 2));
    assert!(crew.unscheduled.is_empty());
    assert!(crew.is_estimated());

    let dates: Vec<NaiveDate> = crew.days.iter().map(|day| day.date).collect();
    assert_eq!(dates, working_dates(config.start_date, config.end_date));

    assert_eq!(schedule.days_with_status(DayStatus::Warning), 0);

    let visit_order: Vec<(f64, f64)> = crew
        .stops()
        .map(|stop| stop.site.location().unwrap())
        .collect();
    let expected_km = estimate_route_length_km(DEPOT.coords(), &visit_order, false);
    assert!(
        (crew.total_distance_km - expected_km).abs() < 1e-6,
        "crew distance {} should match chained estimate {}",
        crew.total_distance_km,
        expected_km
    );

    let positions: Vec<usize> = crew.stops().map(|stop| stop.schedule.crew_position).collect();
    assert_eq!(positions, (1..=10).collect::<Vec<_>>());
    let minutes: u32 = crew.days.iter().map(|day| day.total_minutes).sum();
    assert_eq!(crew.total_minutes, minutes);
}

#[test]
fn automatic_mode_splits_work_between_crews() {
    let sites = store_sites();
    let config = five_day_config().stops_per_day(1).automatic_crews(None);

    let schedule = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();

    assert_eq!(schedule.capacity.crews, 2);
    assert_eq!(schedule.crews.len(), 2);
    for crew in &schedule.crews {
        assert_eq!(crew.stop_count(), 5);
        assert!(crew.stops().all(|stop| stop.schedule.crew == crew.crew));
    }

    let ids = scheduled_ids(&schedule);
    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(ids.len(), 10);
    assert_eq!(unique.len(), 10);
    assert_eq!(schedule.unscheduled_count(), 0);
}

#[test]
fn plan_is_deterministic() {
    let sites = store_sites();
    let config = five_day_config().stops_per_day(2).manual_crews(2);

    let first = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();
    let second = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn no_sites_yields_no_crews() {
    let config = five_day_config().manual_crews(3);
    let schedule = plan(&[], DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();
    assert!(schedule.crews.is_empty());
    assert_eq!(schedule.stop_count(), 0);
}

// ============================================================================
// Feasibility gate
// ============================================================================

#[test]
fn automatic_mode_blocks_when_fleet_is_too_small() {
    let sites = store_sites();
    let config = five_day_config().stops_per_day(1).automatic_crews(Some(1));
    let routing = FixedRouting::new(10.0, 20.0);

    let result = plan(&sites, DEPOT.coords(), &config, &routing, &CancelToken::new());

    match result {
        Err(PlanError::InsufficientCapacity(capacity)) => {
            assert_eq!(capacity.total_capacity, 5);
            assert_eq!(capacity.demand, 10);
            assert_eq!(capacity.unassigned, 5);
            assert_eq!(capacity.extra_crews_needed, 1);
        }
        other => panic!("expected insufficient capacity, got {:?}", other),
    }
    assert_eq!(routing.calls(), 0, "no routing work before the gate");
}

#[test]
fn manual_mode_proceeds_and_reports_leftovers() {
    let sites = store_sites();
    let config = five_day_config().stops_per_day(1).manual_crews(1);

    let schedule = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();

    assert_eq!(schedule.capacity.status, CapacityStatus::Insufficient);
    assert_eq!(schedule.stop_count(), 5);
    assert_eq!(schedule.unscheduled_count(), 5);

    let mut all = scheduled_ids(&schedule);
    all.extend(schedule.crews[0].unscheduled.iter().map(|site| site.id.clone()));
    all.sort();
    let mut expected: Vec<String> = sites.iter().map(|site| site.id.clone()).collect();
    expected.sort();
    assert_eq!(all, expected);
}

#[test]
fn invalid_config_is_rejected() {
    let sites = store_sites();
    let config = PlannerConfig::new(date(2024, 3, 11), date(2024, 3, 6));

    let result = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new());
    assert!(matches!(result, Err(PlanError::InvalidConfig(_))));
}

#[test]
fn unusable_sites_are_excluded() {
    let mut sites = store_sites();
    sites.push(Site::new("pending", "Not geocoded"));
    let mut failed = DEPOT.site("failed");
    failed.geocode_status = GeocodeStatus::Failed;
    sites.push(failed);
    let mut approximate = DEPOT.site("approximate");
    approximate.geocode_status = GeocodeStatus::ConfirmedWithWarning;
    sites.push(approximate);

    let config = five_day_config().stops_per_day(3).manual_crews(1);
    let schedule = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();

    assert_eq!(schedule.excluded, vec!["pending".to_string(), "failed".to_string()]);
    assert_eq!(schedule.capacity.demand, 11);
    assert_eq!(schedule.stop_count(), 11);
    assert!(scheduled_ids(&schedule).contains(&"approximate".to_string()));
}

#[test]
fn sunday_only_window_leaves_every_site_unscheduled() {
    let sites = store_sites();
    let sunday = date(2024, 3, 10);
    let config = PlannerConfig::new(sunday, sunday).stops_per_day(10).manual_crews(1);

    let schedule = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();

    assert!(schedule.capacity.is_sufficient());
    assert_eq!(schedule.capacity.working_days, 1);
    assert_eq!(schedule.stop_count(), 0);
    assert_eq!(schedule.unscheduled_count(), schedule.capacity.demand);
    assert!(schedule.crews[0].days.is_empty());
}

#[test]
fn oversized_quota_and_crew_count_do_not_overflow() {
    let sites = store_sites();

    let config = five_day_config().stops_per_day(usize::MAX).manual_crews(1);
    let schedule = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();
    assert_eq!(schedule.capacity.total_capacity, usize::MAX);
    assert_eq!(schedule.crews[0].days.len(), 1);
    assert_eq!(schedule.stop_count(), 10);

    let config = five_day_config().stops_per_day(usize::MAX).automatic_crews(None);
    let schedule = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();
    assert_eq!(schedule.capacity.crews, 1);

    let config = five_day_config().stops_per_day(2).manual_crews(usize::MAX);
    let schedule = plan(&sites, DEPOT.coords(), &config, &NoRouting, &CancelToken::new()).unwrap();
    assert_eq!(schedule.crews.len(), 10);
    assert!(schedule.crews.iter().all(|crew| crew.stop_count() == 1));
}

// ============================================================================
// Routing provider and day status
// ============================================================================

#[test]
fn provider_metrics_are_confirmed() {
    let sites = store_sites();
    let config = five_day_config().stops_per_day(2).manual_crews(1);
    let routing = FixedRouting::new(10.0, 30.0);

    let schedule = plan(&sites, DEPOT.coords(), &config, &routing, &CancelToken::new()).unwrap();
    let crew = &schedule.crews[0];

    assert!(!crew.is_estimated());
    assert!(crew.days.iter().all(|day| matches!(day.metrics, DayMetrics::Confirmed(_))));
    assert!((crew.total_distance_km - 50.0).abs() < 1e-9);
    // 30 travel + 2 x 45 service + 60 buffer
    assert!(crew.days.iter().all(|day| day.total_minutes == 180));
    assert_eq!(routing.calls(), 10);
}

#[test]
fn long_days_are_overtime_but_planned() {
    let sites = store_sites();
    let config = five_day_config()
        .stops_per_day(2)
        .manual_crews(1)
        .service_minutes(200);
    let routing = FixedRouting::new(120.0, 400.0);

    let schedule = plan(&sites, DEPOT.coords(), &config, &routing, &CancelToken::new()).unwrap();

    assert_eq!(schedule.days_with_status(DayStatus::Overtime), 5);
    assert_eq!(schedule.stop_count(), 10);
    assert!(schedule.crews[0].stops().all(|stop| stop.schedule.note.is_none()));
}

#[test]
fn impossible_jumps_are_flagged_per_stop() {
    let sites = store_sites();
    let config = five_day_config().stops_per_day(2).manual_crews(1);
    let routing = FixedRouting::new(600.0, 300.0);

    let schedule = plan(&sites, DEPOT.coords(), &config, &routing, &CancelToken::new()).unwrap();

    assert_eq!(schedule.days_with_status(DayStatus::Warning), 5);
    for stop in schedule.crews[0].stops() {
        assert_eq!(stop.schedule.day_status, DayStatus::Warning);
        assert!(stop.schedule.note.as_deref().unwrap_or_default().contains("600 km"));
    }
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn cancelled_before_start() {
    let sites = store_sites();
    let config = five_day_config().stops_per_day(2).manual_crews(1);
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = plan(&sites, DEPOT.coords(), &config, &NoRouting, &cancel);
    assert!(matches!(result, Err(PlanError::Cancelled)));
}

#[test]
fn cancelled_mid_run_stops_before_next_day() {
    let sites = store_sites();
    let config = five_day_config().stops_per_day(2).manual_crews(1);
    let cancel = CancelToken::new();
    let routing = CancellingRouting {
        cancel: cancel.clone(),
    };

    let result = plan(&sites, DEPOT.coords(), &config, &routing, &cancel);
    assert!(matches!(result, Err(PlanError::Cancelled)));
}
