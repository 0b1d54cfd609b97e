//! Farm and paddock indicators: supply, demand, day-supply and legend breaks.

use serde::Serialize;

use crate::snapshot::PaddockSnapshot;
use crate::EngineConfig;

/// Quantiles used for the biomass legend breaks.
pub const BREAK_QUANTILES: [f64; 4] = [0.2, 0.4, 0.6, 0.8];
/// Fewer smoothed values than this and the breaks are unknown.
pub const MIN_BREAK_SAMPLES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmKpis {
    /// Area-weighted mean density over paddocks with known density and usable area.
    pub mean_density: Option<f64>,
    pub total_area_ha: f64,
    /// Stocking summed over occupied paddocks only, LU.
    pub total_stocking: f64,
    /// Harvestable forage, kg.
    pub supply_kg: f64,
    /// Daily demand of the stocked herd, kg/day.
    pub demand_kg_per_day: f64,
    pub day_supply: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaddockKpis {
    pub paddock_id: crate::PaddockId,
    pub density: Option<f64>,
    pub area_ha: Option<f64>,
    /// 0 when the paddock is free.
    pub stocking: f64,
    pub supply_kg: f64,
    /// Inferred stocking × base intake, whether or not the paddock is occupied.
    pub demand_kg_per_day: f64,
    pub day_supply: Option<f64>,
}

fn ratio(supply: f64, demand: f64) -> Option<f64> {
    (supply > 0.0 && demand > 0.0)
        .then(|| supply / demand)
        .filter(|d| d.is_finite())
}

pub fn farm_kpis(snapshots: &[PaddockSnapshot], config: &EngineConfig) -> FarmKpis {
    let mut weighted = 0.0;
    let mut weighted_area = 0.0;
    let mut total_area = 0.0;
    let mut total_stocking = 0.0;
    for snapshot in snapshots {
        if let Some(area) = snapshot.area_ha {
            total_area += area;
            if let Some(density) = snapshot.density {
                weighted += density * area;
                weighted_area += area;
            }
        }
        total_stocking += snapshot.occupancy.grazing_stocking();
    }
    let supply_kg = weighted * config.utilization();
    let demand_kg_per_day = total_stocking * config.base_intake;
    FarmKpis {
        mean_density: (weighted_area > 0.0).then(|| weighted / weighted_area),
        total_area_ha: total_area,
        total_stocking,
        supply_kg,
        demand_kg_per_day,
        day_supply: ratio(supply_kg, demand_kg_per_day),
    }
}

pub fn paddock_kpis(snapshot: &PaddockSnapshot, config: &EngineConfig) -> PaddockKpis {
    let supply_kg = match (snapshot.density, snapshot.area_ha) {
        (Some(density), Some(area)) => density * area * config.utilization(),
        _ => 0.0,
    };
    let demand_kg_per_day = snapshot.occupancy.stocking_lu * config.base_intake;
    PaddockKpis {
        paddock_id: snapshot.paddock_id.clone(),
        density: snapshot.density,
        area_ha: snapshot.area_ha,
        stocking: snapshot.occupancy.grazing_stocking(),
        supply_kg,
        demand_kg_per_day,
        day_supply: ratio(supply_kg, demand_kg_per_day),
    }
}

/// Legend breaks over the as-of smoothed densities, lowest first.
pub fn biomass_breaks(snapshots: &[PaddockSnapshot]) -> Option<[f64; 4]> {
    let mut values: Vec<f64> = snapshots
        .iter()
        .filter_map(|s| s.smoothed_density)
        .filter(|v| v.is_finite())
        .collect();
    if values.len() < MIN_BREAK_SAMPLES {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let last = values.len() - 1;
    Some(BREAK_QUANTILES.map(|p| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (last as f64 * p).floor() as usize;
        values[index.min(last)]
    }))
}
