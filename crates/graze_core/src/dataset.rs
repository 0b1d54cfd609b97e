//! The loaded observation store: paddocks plus their ordered series.
//!
//! Built once from [`DatasetRecords`]; every query afterwards is read-only.

use ahash::AHashMap;
use chrono::NaiveDate;

use crate::series::{last_entry_on_or_before, last_on_or_before, sort_dedup_by_date};
use crate::{
    BiomassObservation, DatasetRecords, DensitySource, MoveEvent, Paddock, PaddockId,
    WaterBalanceObservation,
};

/// Values above this are taken as percentages.
const FIBER_PERCENT_THRESHOLD: f64 = 1.01;

#[derive(Debug, Clone, Default)]
pub struct PaddockSeries {
    pub biomass: Vec<BiomassObservation>,
    pub moves: Vec<MoveEvent>,
    pub water_balance: Vec<WaterBalanceObservation>,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Sorted by id.
    paddocks: Vec<Paddock>,
    series: AHashMap<PaddockId, PaddockSeries>,
    fiber: AHashMap<PaddockId, f64>,
}

/// Normalizes a fiber reading into [0,1]; `None` when not finite.
pub fn normalize_fiber(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let fraction = if value > FIBER_PERCENT_THRESHOLD {
        value / 100.0
    } else {
        value
    };
    Some(fraction.clamp(0.0, 1.0))
}

impl Dataset {
    pub fn from_records(records: DatasetRecords) -> Self {
        let mut by_id: AHashMap<PaddockId, Paddock> = AHashMap::new();
        for record in records.paddocks {
            by_id.insert(
                record.id.clone(),
                Paddock {
                    id: record.id,
                    area_ha: record.area_ha,
                    is_subunit: record.is_subunit,
                },
            );
        }
        let mut paddocks: Vec<Paddock> = by_id.into_values().collect();
        paddocks.sort_by(|a, b| a.id.cmp(&b.id));

        let mut series: AHashMap<PaddockId, PaddockSeries> = AHashMap::new();
        for record in records.biomass {
            let entry = series.entry(record.paddock_id.clone()).or_default();
            entry.biomass.push(record.into());
        }
        for record in records.moves {
            let entry = series.entry(record.paddock_id.clone()).or_default();
            entry.moves.push(record.into());
        }
        for record in records.water_balance {
            let entry = series.entry(record.paddock_id.clone()).or_default();
            entry.water_balance.push(record.into());
        }
        for paddock_series in series.values_mut() {
            sort_dedup_by_date(&mut paddock_series.biomass);
            sort_dedup_by_date(&mut paddock_series.moves);
            sort_dedup_by_date(&mut paddock_series.water_balance);
        }

        let mut fiber = AHashMap::new();
        for record in records.fiber {
            if let Some(fraction) = normalize_fiber(record.fraction) {
                fiber.insert(record.paddock_id, fraction);
            }
        }

        Self {
            paddocks,
            series,
            fiber,
        }
    }

    pub fn paddocks(&self) -> &[Paddock] {
        &self.paddocks
    }

    /// Parent units only; the comparison set for ranking, trend and KPIs.
    pub fn top_level(&self) -> impl Iterator<Item = &Paddock> {
        self.paddocks.iter().filter(|p| !p.is_subunit)
    }

    pub fn paddock(&self, id: &PaddockId) -> Option<&Paddock> {
        self.paddocks
            .binary_search_by(|p| p.id.cmp(id))
            .ok()
            .map(|index| &self.paddocks[index])
    }

    /// Ids that carry series data but no paddock record.
    pub fn orphan_series_ids(&self) -> Vec<&PaddockId> {
        let mut ids: Vec<&PaddockId> = self
            .series
            .keys()
            .filter(|id| self.paddock(id).is_none())
            .collect();
        ids.sort();
        ids
    }

    pub fn biomass(&self, id: &PaddockId) -> &[BiomassObservation] {
        self.series.get(id).map(|s| s.biomass.as_slice()).unwrap_or_default()
    }

    pub fn moves(&self, id: &PaddockId) -> &[MoveEvent] {
        self.series.get(id).map(|s| s.moves.as_slice()).unwrap_or_default()
    }

    pub fn water_balance(&self, id: &PaddockId) -> &[WaterBalanceObservation] {
        self.series.get(id).map(|s| s.water_balance.as_slice()).unwrap_or_default()
    }

    pub fn fiber(&self, id: &PaddockId) -> Option<f64> {
        self.fiber.get(id).copied()
    }

    /// Density as of `date` from the preferred field, falling back to the other.
    pub fn density(&self, id: &PaddockId, date: NaiveDate, source: DensitySource) -> Option<f64> {
        let series = self.biomass(id);
        match source {
            DensitySource::Smoothed => {
                last_on_or_before(series, date, BiomassObservation::smoothed_or_raw)
            }
            DensitySource::Raw => last_on_or_before(series, date, BiomassObservation::raw_only)
                .or_else(|| last_on_or_before(series, date, BiomassObservation::smoothed_or_raw)),
        }
    }

    pub fn smoothed_density(&self, id: &PaddockId, date: NaiveDate) -> Option<f64> {
        last_on_or_before(self.biomass(id), date, BiomassObservation::smoothed_or_raw)
    }

    /// Date of the latest observation at or before `date` carrying any density.
    pub fn last_observation_date(&self, id: &PaddockId, date: NaiveDate) -> Option<NaiveDate> {
        last_entry_on_or_before(self.biomass(id), date, BiomassObservation::smoothed_or_raw)
            .map(|(observed, _)| observed)
    }

    pub fn water_balance_on(&self, id: &PaddockId, date: NaiveDate) -> Option<f64> {
        last_on_or_before(self.water_balance(id), date, |w| w.mm_7d)
    }

    /// Latest date present in any biomass or movement series.
    pub fn horizon(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .flat_map(|s| {
                let last_biomass = s.biomass.last().map(|o| o.date);
                let last_move = s.moves.last().map(|e| e.date);
                last_biomass.into_iter().chain(last_move)
            })
            .max()
    }
}
