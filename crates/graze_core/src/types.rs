//! Type definitions for `graze_core`.
//!
//! Normalized input records, the per-paddock observation types they are
//! grouped into, and ID newtypes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(PaddockId);

// ---------------------------------------------------------------------------
// Input records (already normalized by the ingestion side)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaddockRecord {
    pub id: PaddockId,
    #[serde(default)]
    pub area_ha: Option<f64>,
    /// Sub-units are tracked but excluded from ranking and KPIs.
    #[serde(default)]
    pub is_subunit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomassRecord {
    pub paddock_id: PaddockId,
    pub date: NaiveDate,
    #[serde(default)]
    pub raw_density: Option<f64>,
    #[serde(default)]
    pub smoothed_7d_density: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    pub paddock_id: PaddockId,
    pub date: NaiveDate,
    #[serde(default)]
    pub head_count: Option<f64>,
    #[serde(default)]
    pub livestock_units: Option<f64>,
    #[serde(default)]
    pub live_weight_kg: Option<f64>,
    #[serde(default)]
    pub rest_days_explicit: Option<f64>,
    #[serde(default)]
    pub occupied_explicit: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiberRecord {
    pub paddock_id: PaddockId,
    /// Fraction in [0,1]; values above 1.01 are read as percentages.
    pub fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterBalanceRecord {
    pub paddock_id: PaddockId,
    pub date: NaiveDate,
    /// Precipitation minus reference evapotranspiration, 7-day window (mm).
    #[serde(default)]
    pub p_minus_et0_mm_7d: Option<f64>,
}

/// Everything the ingestion side hands over in one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetRecords {
    pub paddocks: Vec<PaddockRecord>,
    #[serde(default)]
    pub biomass: Vec<BiomassRecord>,
    #[serde(default)]
    pub moves: Vec<MoveRecord>,
    #[serde(default)]
    pub fiber: Vec<FiberRecord>,
    #[serde(default)]
    pub water_balance: Vec<WaterBalanceRecord>,
}

// ---------------------------------------------------------------------------
// Per-paddock observation types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddock {
    pub id: PaddockId,
    pub area_ha: Option<f64>,
    pub is_subunit: bool,
}

impl Paddock {
    /// Area usable as a divisor: finite and strictly positive.
    pub fn usable_area(&self) -> Option<f64> {
        self.area_ha.filter(|a| a.is_finite() && *a > 0.0)
    }
}

/// Anything with a calendar date, kept in ascending order per paddock.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomassObservation {
    pub date: NaiveDate,
    /// Forage dry matter, kg/ha.
    pub raw: Option<f64>,
    pub smoothed: Option<f64>,
}

impl BiomassObservation {
    pub fn smoothed_or_raw(&self) -> Option<f64> {
        finite(self.smoothed).or_else(|| finite(self.raw))
    }

    pub fn raw_only(&self) -> Option<f64> {
        finite(self.raw)
    }
}

impl Dated for BiomassObservation {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// State assumed from `date` until the next event: a step function, not a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveEvent {
    pub date: NaiveDate,
    pub head_count: Option<f64>,
    pub livestock_units: Option<f64>,
    pub live_weight_kg: Option<f64>,
    pub rest_days_explicit: Option<f64>,
    pub occupied_explicit: Option<f64>,
}

impl Dated for MoveEvent {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterBalanceObservation {
    pub date: NaiveDate,
    pub mm_7d: Option<f64>,
}

impl Dated for WaterBalanceObservation {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl From<BiomassRecord> for BiomassObservation {
    fn from(record: BiomassRecord) -> Self {
        Self {
            date: record.date,
            raw: finite(record.raw_density),
            smoothed: finite(record.smoothed_7d_density),
        }
    }
}

impl From<MoveRecord> for MoveEvent {
    fn from(record: MoveRecord) -> Self {
        Self {
            date: record.date,
            head_count: finite(record.head_count),
            livestock_units: finite(record.livestock_units),
            live_weight_kg: finite(record.live_weight_kg),
            rest_days_explicit: finite(record.rest_days_explicit),
            occupied_explicit: finite(record.occupied_explicit),
        }
    }
}

impl From<WaterBalanceRecord> for WaterBalanceObservation {
    fn from(record: WaterBalanceRecord) -> Self {
        Self {
            date: record.date,
            mm_7d: finite(record.p_minus_et0_mm_7d),
        }
    }
}
