//! Per-paddock state as of a query date.
//!
//! Snapshots are rebuilt for every query date; nothing carries across dates.

use chrono::NaiveDate;
use serde::Serialize;

use crate::occupancy::{infer_occupancy, Occupancy};
use crate::rest::rest_days;
use crate::trend::growth_slope;
use crate::{Dataset, EngineConfig, Paddock, PaddockId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaddockSnapshot {
    pub paddock_id: PaddockId,
    pub date: NaiveDate,
    /// Usable area only; zero or missing areas are `None`.
    pub area_ha: Option<f64>,
    /// Density from the configured source, kg/ha.
    pub density: Option<f64>,
    pub smoothed_density: Option<f64>,
    pub last_observed: Option<NaiveDate>,
    pub growth_slope: Option<f64>,
    pub occupancy: Occupancy,
    pub rest_days: Option<i64>,
    pub fiber: Option<f64>,
    pub water_balance_mm_7d: Option<f64>,
}

impl PaddockSnapshot {
    pub fn build(
        dataset: &Dataset,
        config: &EngineConfig,
        paddock: &Paddock,
        date: NaiveDate,
    ) -> Self {
        let id = &paddock.id;
        let moves = dataset.moves(id);
        Self {
            paddock_id: id.clone(),
            date,
            area_ha: paddock.usable_area(),
            density: dataset.density(id, date, config.source),
            smoothed_density: dataset.smoothed_density(id, date),
            last_observed: dataset.last_observation_date(id, date),
            growth_slope: growth_slope(dataset.biomass(id), date),
            occupancy: infer_occupancy(moves, date, config.livestock_unit_kg),
            rest_days: rest_days(moves, date),
            fiber: dataset.fiber(id),
            water_balance_mm_7d: dataset.water_balance_on(id, date),
        }
    }

    /// Whole days since the last observation, never negative.
    pub fn observation_age_days(&self) -> Option<i64> {
        self.last_observed
            .map(|observed| (self.date - observed).num_days().max(0))
    }
}

/// Snapshots of every top-level paddock, in id order.
pub fn top_level_snapshots(
    dataset: &Dataset,
    config: &EngineConfig,
    date: NaiveDate,
) -> Vec<PaddockSnapshot> {
    dataset
        .top_level()
        .map(|paddock| PaddockSnapshot::build(dataset, config, paddock, date))
        .collect()
}
