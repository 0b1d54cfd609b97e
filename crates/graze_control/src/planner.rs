//! What-if herd placement: for a hypothetical herd size, how many days
//! each ranked paddock would carry it.

use ahash::AHashMap;
use graze_core::supply::SupplyModel;
use graze_core::{EngineConfig, PaddockId, PaddockSnapshot, RankingEntry};
use serde::Serialize;

/// Days of intake a fiber percentage allows: `FIBER_DAYS_NUMERATOR / fiber%`.
pub const FIBER_DAYS_NUMERATOR: f64 = 120.0;

pub const GREEN_MIN_DENSITY: f64 = 2000.0;
pub const GREEN_MAX_DENSITY: f64 = 3200.0;
pub const YELLOW_MIN_DENSITY: f64 = 1600.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficLight {
    Green,
    Yellow,
    Red,
}

impl TrafficLight {
    pub fn for_density(density: f64) -> Self {
        if (GREEN_MIN_DENSITY..=GREEN_MAX_DENSITY).contains(&density) {
            TrafficLight::Green
        } else if density >= YELLOW_MIN_DENSITY {
            TrafficLight::Yellow
        } else {
            TrafficLight::Red
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrafficLight::Green => "green",
            TrafficLight::Yellow => "yellow",
            TrafficLight::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRow {
    pub paddock_id: PaddockId,
    pub density: f64,
    pub area_ha: Option<f64>,
    pub gross_days: Option<f64>,
    pub fiber_days: Option<f64>,
    pub waste_delta: Option<f64>,
    pub planned_days: Option<f64>,
    pub light: TrafficLight,
}

/// `None` when fiber is unknown or not positive. `fraction` is in [0,1].
pub fn fiber_days(fraction: Option<f64>) -> Option<f64> {
    fraction
        .filter(|f| f.is_finite() && *f > 0.0)
        .map(|f| FIBER_DAYS_NUMERATOR / (f * 100.0))
}

pub fn planned_days(gross: Option<f64>, fiber_days: Option<f64>, delta: Option<f64>) -> Option<f64> {
    let delta = delta.unwrap_or(0.0);
    match (gross, fiber_days) {
        (None, None) => None,
        (Some(gross), None) => Some(gross),
        (None, Some(fiber)) => Some((fiber - delta).max(0.0)),
        (Some(gross), Some(fiber)) => Some(gross.max(fiber - delta)),
    }
}

/// Hypothetical herd of `stocking_lu` livestock units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovePlanner {
    pub stocking_lu: f64,
}

impl MovePlanner {
    pub fn new(stocking_lu: f64) -> Self {
        Self { stocking_lu }
    }

    /// One row per ranking entry, in ranking order. Entries without a
    /// matching snapshot are skipped.
    pub fn plan(
        &self,
        ranking: &[RankingEntry],
        snapshots: &[PaddockSnapshot],
        config: &EngineConfig,
    ) -> Vec<PlanRow> {
        let by_id: AHashMap<&PaddockId, &PaddockSnapshot> =
            snapshots.iter().map(|s| (&s.paddock_id, s)).collect();
        let model = SupplyModel::from_config(config);
        ranking
            .iter()
            .filter_map(|entry| {
                let snapshot = by_id.get(&entry.paddock_id)?;
                let gross = model
                    .day_supply(Some(entry.density), snapshot.area_ha, self.stocking_lu, snapshot.fiber)
                    .gross;
                let fiber = fiber_days(snapshot.fiber);
                let delta = fiber.map(|days| (model.waste_beta * days).min(model.waste_cap));
                Some(PlanRow {
                    paddock_id: entry.paddock_id.clone(),
                    density: entry.density,
                    area_ha: snapshot.area_ha,
                    gross_days: gross,
                    fiber_days: fiber,
                    waste_delta: delta,
                    planned_days: planned_days(gross, fiber, delta),
                    light: TrafficLight::for_density(entry.density),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn traffic_light_bands() {
        assert_eq!(TrafficLight::for_density(2000.0), TrafficLight::Green);
        assert_eq!(TrafficLight::for_density(3200.0), TrafficLight::Green);
        assert_eq!(TrafficLight::for_density(3300.0), TrafficLight::Yellow);
        assert_eq!(TrafficLight::for_density(1600.0), TrafficLight::Yellow);
        assert_eq!(TrafficLight::for_density(1599.0), TrafficLight::Red);
    }

    #[test]
    fn fiber_days_from_fraction() {
        assert!(close(fiber_days(Some(0.6)).unwrap(), 2.0));
        assert_eq!(fiber_days(Some(0.0)), None);
        assert_eq!(fiber_days(None), None);
    }

    #[test]
    fn planned_days_handles_missing_operands() {
        assert_eq!(planned_days(None, None, None), None);
        assert!(close(planned_days(Some(12.0), None, None).unwrap(), 12.0));
        assert!(close(planned_days(None, Some(2.0), Some(0.1)).unwrap(), 1.9));
        assert!(close(planned_days(Some(1.0), Some(2.0), Some(0.1)).unwrap(), 1.9));
        assert!(close(planned_days(Some(30.0), Some(2.0), Some(0.1)).unwrap(), 30.0));
    }
}
