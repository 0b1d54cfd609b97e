//! Advisories, destinations and planning over the shared farm fixture.

use graze_control::{
    suggested_destinations, Advisor, RotationAdvisor, RotationPlan, Severity, TrafficLight,
};
use graze_core::test_fixtures::{date, farm_dataset, FARM_DATE};
use graze_core::{rank_paddocks, EngineConfig};

fn pairs(advisories: &[graze_control::Advisory]) -> Vec<(&'static str, String)> {
    advisories
        .iter()
        .map(|a| (a.id, a.paddock_id.0.clone()))
        .collect()
}

#[test]
fn test_farm_advisories_on_fixture_date() {
    let dataset = farm_dataset();
    let mut advisor = RotationAdvisor::new();
    let advisories = advisor.advise(&dataset, &EngineConfig::default(), date(FARM_DATE));
    assert_eq!(
        pairs(&advisories),
        [
            ("REST_HISTORY_UNKNOWN", "bare".to_string()),
            ("OVERMATURE_FORAGE", "east".to_string()),
            ("REST_HISTORY_UNKNOWN", "west".to_string()),
            ("STALE_OBSERVATIONS", "west".to_string()),
        ]
    );
    assert!(advisories.iter().all(|a| a.severity == Severity::Info));
    assert!(advisories.iter().all(|a| a.newly_raised));
}

#[test]
fn test_depletion_warning_sorts_first() {
    let dataset = farm_dataset();
    let mut advisor = RotationAdvisor::new();
    let advisories = advisor.advise(&dataset, &EngineConfig::default(), date("2025-03-20"));
    let first = &advisories[0];
    assert_eq!(first.id, "PROJECTED_BELOW_TARGET");
    assert_eq!(first.paddock_id.0, "south");
    assert_eq!(first.severity, Severity::Warning);
}

#[test]
fn test_repeated_advice_is_not_new() {
    let dataset = farm_dataset();
    let config = EngineConfig::default();
    let mut advisor = RotationAdvisor::new();
    let first = advisor.advise(&dataset, &config, date(FARM_DATE));
    let second = advisor.advise(&dataset, &config, date(FARM_DATE));
    assert_eq!(first.len(), second.len());
    assert!(second.iter().all(|a| !a.newly_raised));
    assert_eq!(advisor.active_advisories().len(), second.len());
}

#[test]
fn test_destinations_skip_occupied_paddocks() {
    let ranking = rank_paddocks(&farm_dataset(), &EngineConfig::default(), date(FARM_DATE));
    let all: Vec<&str> = suggested_destinations(&ranking, 8)
        .iter()
        .map(|e| e.paddock_id.0.as_str())
        .collect();
    assert_eq!(all, ["north", "east", "west"]);
    assert_eq!(suggested_destinations(&ranking, 2).len(), 2);
}

#[test]
fn test_plan_rows_follow_ranking_order() {
    let dataset = farm_dataset();
    let config = EngineConfig::default();
    let mut advisor = RotationAdvisor::new();
    let plan = RotationPlan::build(&mut advisor, &dataset, &config, date(FARM_DATE), 30.0, 8);

    let ids: Vec<&str> = plan.rows.iter().map(|r| r.paddock_id.0.as_str()).collect();
    assert_eq!(ids, ["north", "east", "west", "south"]);

    let north = &plan.rows[0];
    // 2870 × 10 × 0.6 / (30 LU × 7 kg).
    assert!((north.gross_days.unwrap() - 82.0).abs() < 1e-9);
    assert!((north.fiber_days.unwrap() - 120.0 / 55.0).abs() < 1e-9);
    assert!((north.planned_days.unwrap() - 82.0).abs() < 1e-9);
    assert_eq!(north.light, TrafficLight::Green);

    let west = &plan.rows[2];
    assert_eq!(west.fiber_days, None);
    assert_eq!(west.planned_days, west.gross_days);
    assert_eq!(plan.rows[1].light, TrafficLight::Yellow);

    assert_eq!(plan.destinations.len(), 3);
    assert_eq!(plan.advisories.len(), 4);
}
