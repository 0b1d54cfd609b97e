//! Decisions on top of the engine: rule-based advisories, where to move the
//! herd next, and what-if day planning for a hypothetical herd.

mod advisories;
mod planner;

use std::collections::HashSet;

use chrono::NaiveDate;
use graze_core::{rank_snapshots, top_level_snapshots, Dataset, EngineConfig, PaddockId, RankingEntry};
use serde::Serialize;

pub use advisories::{evaluate_rules, sort_advisories, Advisory, PaddockFacts, Severity};
pub use planner::{fiber_days, planned_days, MovePlanner, PlanRow, TrafficLight};

/// Default number of suggested destinations.
pub const DEFAULT_SUGGESTIONS: usize = 8;

pub trait Advisor {
    fn advise(&mut self, dataset: &Dataset, config: &EngineConfig, date: NaiveDate)
        -> Vec<Advisory>;
}

/// Evaluates the advisory rule table over every top-level paddock.
///
/// Remembers which (rule, paddock) pairs fired on the previous call so that
/// repeated evaluations can tell new advisories from standing ones.
#[derive(Debug, Default)]
pub struct RotationAdvisor {
    active: HashSet<(&'static str, PaddockId)>,
}

impl RotationAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// (rule id, paddock) pairs that fired on the last call, sorted.
    pub fn active_advisories(&self) -> Vec<(&'static str, PaddockId)> {
        let mut active: Vec<_> = self.active.iter().cloned().collect();
        active.sort();
        active
    }
}

impl Advisor for RotationAdvisor {
    fn advise(
        &mut self,
        dataset: &Dataset,
        config: &EngineConfig,
        date: NaiveDate,
    ) -> Vec<Advisory> {
        let snapshots = top_level_snapshots(dataset, config, date);
        let mut advisories: Vec<Advisory> = snapshots
            .iter()
            .flat_map(|snapshot| evaluate_rules(&PaddockFacts::gather(snapshot, config)))
            .collect();

        let mut now_active = HashSet::with_capacity(advisories.len());
        for advisory in &mut advisories {
            let key = (advisory.id, advisory.paddock_id.clone());
            advisory.newly_raised = !self.active.contains(&key);
            now_active.insert(key);
        }
        self.active = now_active;

        sort_advisories(&mut advisories);
        advisories
    }
}

/// The first `limit` ranking entries whose paddock is not occupied.
pub fn suggested_destinations(ranking: &[RankingEntry], limit: usize) -> Vec<&RankingEntry> {
    ranking
        .iter()
        .filter(|entry| !entry.occupied)
        .take(limit)
        .collect()
}

/// Everything the `plan` view shows for one date and one hypothetical herd.
#[derive(Debug, Clone, Serialize)]
pub struct RotationPlan {
    pub date: NaiveDate,
    pub stocking_lu: f64,
    pub advisories: Vec<Advisory>,
    pub destinations: Vec<RankingEntry>,
    pub rows: Vec<PlanRow>,
}

impl RotationPlan {
    pub fn build(
        advisor: &mut dyn Advisor,
        dataset: &Dataset,
        config: &EngineConfig,
        date: NaiveDate,
        stocking_lu: f64,
        limit: usize,
    ) -> Self {
        let snapshots = top_level_snapshots(dataset, config, date);
        let ranking = rank_snapshots(&snapshots, config);
        let rows = MovePlanner::new(stocking_lu).plan(&ranking, &snapshots, config);
        let destinations = suggested_destinations(&ranking, limit)
            .into_iter()
            .cloned()
            .collect();
        Self {
            date,
            stocking_lu,
            advisories: advisor.advise(dataset, config, date),
            destinations,
            rows,
        }
    }
}
