//! Loading normalized records from a data directory and checking them.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use graze_core::{Dataset, DatasetRecords, PaddockId};
use serde::de::DeserializeOwned;

pub const PADDOCKS_FILE: &str = "paddocks.json";
pub const BIOMASS_FILE: &str = "biomass.json";
pub const MOVES_FILE: &str = "moves.json";
pub const FIBER_FILE: &str = "fiber.json";
pub const WATER_BALANCE_FILE: &str = "water_balance.json";

/// Fiber readings outside [0, this] cannot be a fraction or a percentage.
const MAX_FIBER_READING: f64 = 100.0;

/// A data problem that does not stop loading.
#[derive(Debug, Clone, PartialEq)]
pub enum DataIssue {
    UnknownPaddock {
        file: &'static str,
        paddock_id: PaddockId,
    },
    NonPositiveArea {
        paddock_id: PaddockId,
        area_ha: f64,
    },
    MissingArea {
        paddock_id: PaddockId,
    },
    FiberOutOfRange {
        paddock_id: PaddockId,
        value: f64,
    },
}

impl fmt::Display for DataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataIssue::UnknownPaddock { file, paddock_id } => {
                write!(f, "{file} references unknown paddock '{paddock_id}'")
            }
            DataIssue::NonPositiveArea {
                paddock_id,
                area_ha,
            } => write!(
                f,
                "paddock '{paddock_id}' has non-positive area {area_ha} ha; supply is unknown"
            ),
            DataIssue::MissingArea { paddock_id } => {
                write!(f, "paddock '{paddock_id}' has no area; supply is unknown")
            }
            DataIssue::FiberOutOfRange { paddock_id, value } => write!(
                f,
                "paddock '{paddock_id}' fiber reading {value} is outside 0..=100"
            ),
        }
    }
}

pub struct LoadedDataset {
    pub dataset: Dataset,
    pub issues: Vec<DataIssue>,
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let path = dir.join(file);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

fn read_optional_json<T: DeserializeOwned + Default>(dir: &Path, file: &str) -> Result<T> {
    if dir.join(file).exists() {
        read_json(dir, file)
    } else {
        tracing::debug!(file, "optional data file absent");
        Ok(T::default())
    }
}

/// Reads the three required and two optional record files of `dir`.
pub fn load_records(dir: &Path) -> Result<DatasetRecords> {
    Ok(DatasetRecords {
        paddocks: read_json(dir, PADDOCKS_FILE)?,
        biomass: read_json(dir, BIOMASS_FILE)?,
        moves: read_json(dir, MOVES_FILE)?,
        fiber: read_optional_json(dir, FIBER_FILE)?,
        water_balance: read_optional_json(dir, WATER_BALANCE_FILE)?,
    })
}

/// Reports data problems without rejecting anything.
pub fn validate_dataset(records: &DatasetRecords) -> Vec<DataIssue> {
    let known: HashSet<&PaddockId> = records.paddocks.iter().map(|p| &p.id).collect();
    let mut issues = Vec::new();

    for paddock in &records.paddocks {
        match paddock.area_ha {
            Some(area) if area.is_nan() || area <= 0.0 => issues.push(DataIssue::NonPositiveArea {
                paddock_id: paddock.id.clone(),
                area_ha: area,
            }),
            None => issues.push(DataIssue::MissingArea {
                paddock_id: paddock.id.clone(),
            }),
            Some(_) => {}
        }
    }

    // One report per (file, paddock), in first-seen order.
    let references = records
        .biomass
        .iter()
        .map(|r| (BIOMASS_FILE, &r.paddock_id))
        .chain(records.moves.iter().map(|r| (MOVES_FILE, &r.paddock_id)))
        .chain(records.fiber.iter().map(|r| (FIBER_FILE, &r.paddock_id)))
        .chain(
            records
                .water_balance
                .iter()
                .map(|r| (WATER_BALANCE_FILE, &r.paddock_id)),
        );
    let mut reported: HashSet<(&'static str, &PaddockId)> = HashSet::new();
    for (file, id) in references {
        if !known.contains(id) && reported.insert((file, id)) {
            issues.push(DataIssue::UnknownPaddock {
                file,
                paddock_id: id.clone(),
            });
        }
    }

    for record in &records.fiber {
        let value = record.fraction;
        if !value.is_finite() || !(0.0..=MAX_FIBER_READING).contains(&value) {
            issues.push(DataIssue::FiberOutOfRange {
                paddock_id: record.paddock_id.clone(),
                value,
            });
        }
    }
    issues
}

/// Loads, validates and builds the dataset in `dir`. Each issue is logged
/// at `warn` and returned.
pub fn load_dataset(dir: &Path) -> Result<LoadedDataset> {
    let records = load_records(dir)?;
    let issues = validate_dataset(&records);
    for issue in &issues {
        tracing::warn!(dir = %dir.display(), "{issue}");
    }
    tracing::debug!(
        paddocks = records.paddocks.len(),
        biomass = records.biomass.len(),
        moves = records.moves.len(),
        "dataset loaded"
    );
    Ok(LoadedDataset {
        dataset: Dataset::from_records(records),
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use graze_core::test_fixtures::{biomass, paddock, stocked};
    use graze_core::{FiberRecord, PaddockRecord};

    #[test]
    fn clean_records_have_no_issues() {
        let records = DatasetRecords {
            paddocks: vec![paddock("p1", 4.0)],
            biomass: vec![biomass("p1", "2025-01-01", Some(2000.0), None)],
            moves: vec![stocked("p1", "2025-01-01", 10.0)],
            ..DatasetRecords::default()
        };
        assert!(validate_dataset(&records).is_empty());
    }

    #[test]
    fn unknown_references_reported_once_per_file() {
        let records = DatasetRecords {
            paddocks: vec![paddock("p1", 4.0)],
            biomass: vec![
                biomass("ghost", "2025-01-01", Some(2000.0), None),
                biomass("ghost", "2025-01-02", Some(2100.0), None),
            ],
            moves: vec![stocked("ghost", "2025-01-01", 10.0)],
            ..DatasetRecords::default()
        };
        let issues = validate_dataset(&records);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| matches!(i, DataIssue::UnknownPaddock { .. })));
    }

    #[test]
    fn bad_areas_and_fiber_are_reported() {
        let records = DatasetRecords {
            paddocks: vec![
                paddock("zero", 0.0),
                PaddockRecord {
                    id: PaddockId::from("none"),
                    area_ha: None,
                    is_subunit: false,
                },
            ],
            fiber: vec![
                FiberRecord {
                    paddock_id: PaddockId::from("zero"),
                    fraction: 140.0,
                },
                FiberRecord {
                    paddock_id: PaddockId::from("none"),
                    fraction: 62.0,
                },
            ],
            ..DatasetRecords::default()
        };
        let issues = validate_dataset(&records);
        assert_eq!(issues.len(), 3);
        assert!(matches!(issues[0], DataIssue::NonPositiveArea { .. }));
        assert!(matches!(issues[1], DataIssue::MissingArea { .. }));
        assert!(matches!(issues[2], DataIssue::FiberOutOfRange { .. }));
        assert!(issues[2].to_string().contains("140"));
    }
}
