//! `graze_core`: paddock readiness and forage supply engine.
//!
//! No IO, no logging. Every computation is a pure function of a
//! [`Dataset`], an [`EngineConfig`] and a query date; unknown inputs
//! propagate as `None` instead of errors.

mod config;
mod dataset;
pub mod metrics;
pub mod occupancy;
pub mod projection;
pub mod rest;
pub mod scoring;
mod series;
pub mod snapshot;
pub mod supply;
pub mod trend;
mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_fixtures;

pub use config::*;
pub use dataset::{normalize_fiber, Dataset, PaddockSeries};
pub use metrics::{biomass_breaks, farm_kpis, paddock_kpis, FarmKpis, PaddockKpis};
pub use occupancy::{governing_event, infer_occupancy, Occupancy};
pub use projection::{project_density, TargetStatus};
pub use rest::{replay, rest_days, RestState};
pub use scoring::{rank_paddocks, rank_snapshots, Classification, RankingEntry, SubScores};
pub use series::{last_entry_on_or_before, last_on_or_before};
pub use snapshot::{top_level_snapshots, PaddockSnapshot};
pub use supply::{effective_intake, waste_factor, DaySupply, SupplyModel};
pub use trend::{growth_slope, TrendScale};
pub use types::*;
