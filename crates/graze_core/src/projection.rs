//! Forward depletion of biomass under grazing, from the last observation
//! to the query date.

use serde::{Deserialize, Serialize};

use crate::snapshot::PaddockSnapshot;
use crate::supply::SupplyModel;
use crate::{EngineConfig, ScoringParameters};

/// Where a projected density sits relative to the target residual band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Below,
    Within,
    Above,
}

impl TargetStatus {
    pub fn of(density: f64, params: &ScoringParameters) -> Self {
        if density < params.target_min {
            TargetStatus::Below
        } else if density > params.target_max {
            TargetStatus::Above
        } else {
            TargetStatus::Within
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetStatus::Below => "below",
            TargetStatus::Within => "within",
            TargetStatus::Above => "above",
        }
    }
}

/// Projected density as of the snapshot date, kg/ha.
///
/// `stocking_override` replaces the inferred herd for what-if questions;
/// a positive override counts as occupied. Free paddocks, unusable areas
/// and a non-positive utilization return the current density unchanged.
pub fn project_density(
    snapshot: &PaddockSnapshot,
    config: &EngineConfig,
    stocking_override: Option<f64>,
) -> Option<f64> {
    let current = snapshot.density?;
    let (occupied, stocking) = match stocking_override {
        Some(lu) => (lu > 0.0, lu),
        None => (snapshot.occupancy.occupied, snapshot.occupancy.stocking_lu),
    };
    let model = SupplyModel::from_config(config);
    let Some(area) = snapshot.area_ha else {
        return Some(current);
    };
    if !occupied || model.utilization <= 0.0 {
        return Some(current);
    }
    let elapsed = snapshot.observation_age_days().unwrap_or(0) as f64;
    let per_ha_per_day = stocking * model.intake(snapshot.fiber) / (area * model.utilization);
    if !per_ha_per_day.is_finite() {
        return Some(current);
    }
    Some((current - elapsed * per_ha_per_day).max(0.0))
}
