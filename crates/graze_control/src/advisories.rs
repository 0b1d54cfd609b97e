//! Rule-based advisories evaluated per paddock from a static rule table.

use graze_core::supply::SupplyModel;
use graze_core::{project_density, DaySupply, EngineConfig, PaddockId, PaddockSnapshot};
use serde::Serialize;

/// Ordered so that `Critical` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory {
    pub id: &'static str,
    pub severity: Severity,
    pub paddock_id: PaddockId,
    pub message: &'static str,
    pub suggested_action: &'static str,
    /// First time this (rule, paddock) pair fired for the advisor that raised it.
    pub newly_raised: bool,
}

/// Everything a rule may look at for one paddock.
pub struct PaddockFacts<'a> {
    pub snapshot: &'a PaddockSnapshot,
    pub config: &'a EngineConfig,
    pub projected_density: Option<f64>,
    pub supply: DaySupply,
}

impl<'a> PaddockFacts<'a> {
    pub fn gather(snapshot: &'a PaddockSnapshot, config: &'a EngineConfig) -> Self {
        let supply = SupplyModel::from_config(config).day_supply(
            snapshot.density,
            snapshot.area_ha,
            snapshot.occupancy.grazing_stocking(),
            snapshot.fiber,
        );
        Self {
            snapshot,
            config,
            projected_density: project_density(snapshot, config, None),
            supply,
        }
    }

    fn occupied(&self) -> bool {
        self.snapshot.occupancy.occupied
    }
}

type RuleFn = fn(&PaddockFacts<'_>) -> bool;

pub(crate) struct AdvisoryRule {
    pub id: &'static str,
    pub severity: Severity,
    check: RuleFn,
    message: &'static str,
    suggested_action: &'static str,
}

pub(crate) const RULES: &[AdvisoryRule] = &[
    AdvisoryRule {
        id: "PROJECTED_BELOW_TARGET",
        severity: Severity::Warning,
        check: |f| {
            f.occupied()
                && f.projected_density
                    .is_some_and(|d| d < f.config.params().target_min)
        },
        message: "Projected residual is below the target band",
        suggested_action: "Move the herd out or reduce stocking",
    },
    AdvisoryRule {
        id: "SUPPLY_EXHAUSTED",
        severity: Severity::Critical,
        check: |f| f.occupied() && f.supply.adjusted.is_some_and(|d| d < 1.0),
        message: "Less than one day of adjusted forage supply left",
        suggested_action: "Move the herd today",
    },
    AdvisoryRule {
        id: "STALE_OBSERVATIONS",
        severity: Severity::Info,
        check: |f| {
            f.snapshot
                .observation_age_days()
                .is_some_and(|age| age > i64::from(f.config.staleness_max_days))
        },
        message: "Latest biomass observation is older than the staleness limit",
        suggested_action: "Refresh biomass measurements for this paddock",
    },
    AdvisoryRule {
        id: "REST_HISTORY_UNKNOWN",
        severity: Severity::Info,
        check: |f| !f.occupied() && f.snapshot.rest_days.is_none(),
        message: "Rest interval cannot be determined from movement history",
        suggested_action: "Record the date the paddock was last grazed",
    },
    AdvisoryRule {
        id: "OVERMATURE_FORAGE",
        severity: Severity::Info,
        check: |f| {
            !f.occupied()
                && f.snapshot
                    .density
                    .is_some_and(|d| d > f.config.params().entry_max)
        },
        message: "Standing forage is above the entry band",
        suggested_action: "Graze soon or cut for conservation",
    },
];

/// Rules firing for one paddock, in table order. `newly_raised` is left false.
pub fn evaluate_rules(facts: &PaddockFacts<'_>) -> Vec<Advisory> {
    RULES
        .iter()
        .filter(|rule| (rule.check)(facts))
        .map(|rule| Advisory {
            id: rule.id,
            severity: rule.severity,
            paddock_id: facts.snapshot.paddock_id.clone(),
            message: rule.message,
            suggested_action: rule.suggested_action,
            newly_raised: false,
        })
        .collect()
}

/// Critical first, then by paddock id, then rule id.
pub fn sort_advisories(advisories: &mut [Advisory]) {
    advisories.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.paddock_id.cmp(&b.paddock_id))
            .then_with(|| a.id.cmp(b.id))
    });
}
