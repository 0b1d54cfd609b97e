//! Shared test fixtures for graze_core and downstream crates.
//!
//! `farm_records()` is a small hand-built farm covering the interesting
//! cases (occupied, rested, over-mature, stale, no history, sub-unit,
//! no biomass) as of [`FARM_DATE`]. The record helpers build single rows
//! with everything optional left unknown.

use chrono::{Days, NaiveDate};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    BiomassObservation, BiomassRecord, Dataset, DatasetRecords, FiberRecord, MoveEvent,
    MoveRecord, PaddockId, PaddockRecord, WaterBalanceRecord,
};

/// Query date the farm fixture is written against.
pub const FARM_DATE: &str = "2025-03-08";

/// Panics on malformed input; fixtures only.
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fixture date must be YYYY-MM-DD")
}

pub fn obs(d: &str, raw: Option<f64>, smoothed: Option<f64>) -> BiomassObservation {
    BiomassObservation {
        date: date(d),
        raw,
        smoothed,
    }
}

/// An event carrying no load and no flags, i.e. a free paddock.
pub fn event(d: &str) -> MoveEvent {
    MoveEvent {
        date: date(d),
        head_count: None,
        livestock_units: None,
        live_weight_kg: None,
        rest_days_explicit: None,
        occupied_explicit: None,
    }
}

pub fn occupied_event(d: &str) -> MoveEvent {
    MoveEvent {
        livestock_units: Some(30.0),
        ..event(d)
    }
}

pub fn paddock(id: &str, area_ha: f64) -> PaddockRecord {
    PaddockRecord {
        id: PaddockId::from(id),
        area_ha: Some(area_ha),
        is_subunit: false,
    }
}

pub fn biomass(id: &str, d: &str, raw: Option<f64>, smoothed: Option<f64>) -> BiomassRecord {
    BiomassRecord {
        paddock_id: PaddockId::from(id),
        date: date(d),
        raw_density: raw,
        smoothed_7d_density: smoothed,
    }
}

pub fn vacated(id: &str, d: &str) -> MoveRecord {
    MoveRecord {
        paddock_id: PaddockId::from(id),
        date: date(d),
        head_count: None,
        livestock_units: None,
        live_weight_kg: None,
        rest_days_explicit: None,
        occupied_explicit: None,
    }
}

pub fn stocked(id: &str, d: &str, livestock_units: f64) -> MoveRecord {
    MoveRecord {
        livestock_units: Some(livestock_units),
        ..vacated(id, d)
    }
}

/// Six top-level paddocks plus one sub-unit, as of [`FARM_DATE`]:
///
/// - `north`: rested 36 days, density inside the entry band.
/// - `south`: grazed by 50 LU since 2025-03-01, density falling.
/// - `east`: rested but over-mature (above the entry band).
/// - `west`: never moved and last observed 16 days before the query.
/// - `bare`: no biomass at all.
/// - `west_z_1`: sub-unit of `west`.
pub fn farm_records() -> DatasetRecords {
    DatasetRecords {
        paddocks: vec![
            paddock("north", 10.0),
            paddock("south", 8.0),
            paddock("east", 12.0),
            paddock("west", 6.0),
            paddock("bare", 4.0),
            PaddockRecord {
                id: PaddockId::from("west_z_1"),
                area_ha: Some(1.5),
                is_subunit: true,
            },
        ],
        biomass: vec![
            biomass("north", "2025-03-01", Some(2650.0), Some(2700.0)),
            biomass("north", "2025-03-08", Some(2900.0), Some(2870.0)),
            biomass("south", "2025-03-01", Some(2250.0), Some(2200.0)),
            biomass("south", "2025-03-08", Some(1950.0), Some(2000.0)),
            biomass("east", "2025-03-01", Some(3500.0), Some(3550.0)),
            biomass("east", "2025-03-08", Some(3650.0), Some(3600.0)),
            biomass("west", "2025-02-13", Some(2450.0), Some(2400.0)),
            biomass("west", "2025-02-20", Some(2550.0), Some(2500.0)),
            biomass("west_z_1", "2025-03-08", Some(2000.0), Some(2000.0)),
        ],
        moves: vec![
            stocked("north", "2025-01-10", 40.0),
            vacated("north", "2025-02-01"),
            stocked("south", "2025-02-01", 20.0),
            vacated("south", "2025-02-10"),
            stocked("south", "2025-03-01", 50.0),
            stocked("east", "2025-01-01", 35.0),
            vacated("east", "2025-01-15"),
        ],
        fiber: vec![
            FiberRecord {
                paddock_id: PaddockId::from("north"),
                fraction: 0.55,
            },
            FiberRecord {
                paddock_id: PaddockId::from("south"),
                fraction: 58.0,
            },
            FiberRecord {
                paddock_id: PaddockId::from("east"),
                fraction: 0.62,
            },
        ],
        water_balance: vec![WaterBalanceRecord {
            paddock_id: PaddockId::from("north"),
            date: date("2025-03-07"),
            p_minus_et0_mm_7d: Some(-12.5),
        }],
    }
}

pub fn farm_dataset() -> Dataset {
    Dataset::from_records(farm_records())
}

pub fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

/// Ascending series of `len` observations with random gaps of 1–5 days
/// and roughly one field in five missing.
pub fn random_biomass_series(rng: &mut impl Rng, len: usize) -> Vec<BiomassObservation> {
    let mut day = date("2024-09-01");
    let mut series = Vec::with_capacity(len);
    for _ in 0..len {
        day = day + Days::new(rng.gen_range(1..=5));
        let raw = rng.gen_bool(0.8).then(|| rng.gen_range(800.0..4500.0));
        let smoothed = rng.gen_bool(0.8).then(|| rng.gen_range(800.0..4500.0));
        series.push(BiomassObservation {
            date: day,
            raw,
            smoothed,
        });
    }
    series
}
