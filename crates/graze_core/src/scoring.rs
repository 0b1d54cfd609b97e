//! Multi-criterion readiness scoring and the paddock ranking.
//!
//! Five sub-scores in [0,100] (entry, quality, trend, rest, data quality)
//! are combined with the active mode's weights into a composite score,
//! which together with entry eligibility yields a three-state class.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::snapshot::{top_level_snapshots, PaddockSnapshot};
use crate::supply::SupplyModel;
use crate::trend::TrendScale;
use crate::{Dataset, EngineConfig, PaddockId, ScoringParameters, WeightProfile};

/// Densities above this start losing quality points (over-mature forage).
pub const OVERMATURITY_THRESHOLD: f64 = 3500.0;
pub const OVERMATURITY_MAX_PENALTY: f64 = 30.0;
const OVERMATURITY_KG_PER_POINT: f64 = 10.0;

pub const STALENESS_POINTS_PER_DAY: f64 = 8.0;
pub const STALENESS_FLOOR: f64 = 55.0;

pub const SOON_THRESHOLD: f64 = 50.0;
pub const READY_THRESHOLD: f64 = 70.0;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Ordered so that `Ready` sorts highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    NotReady,
    Soon,
    Ready,
}

impl Classification {
    pub fn from_score(score: f64, eligible: bool) -> Self {
        if !eligible || score < SOON_THRESHOLD {
            Classification::NotReady
        } else if score < READY_THRESHOLD {
            Classification::Soon
        } else {
            Classification::Ready
        }
    }

    /// −1 / 0 / +1.
    pub fn value(self) -> i8 {
        match self {
            Classification::NotReady => -1,
            Classification::Soon => 0,
            Classification::Ready => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::NotReady => "not-ready",
            Classification::Soon => "soon",
            Classification::Ready => "ready",
        }
    }
}

// ---------------------------------------------------------------------------
// Sub-scores
// ---------------------------------------------------------------------------

pub fn entry_score(density: f64, params: &ScoringParameters) -> f64 {
    let score = if density < params.entry_min {
        100.0 * density / params.entry_min
    } else if density > params.entry_max {
        100.0 * params.entry_max / density
    } else {
        100.0
    };
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn quality_score(density: f64, fiber: Option<f64>, fiber_alpha: f64) -> f64 {
    let fiber_penalty = fiber.map_or(0.0, |f| f * 100.0 * fiber_alpha);
    let overmaturity = if density > OVERMATURITY_THRESHOLD {
        ((density - OVERMATURITY_THRESHOLD) / OVERMATURITY_KG_PER_POINT)
            .min(OVERMATURITY_MAX_PENALTY)
    } else {
        0.0
    };
    (100.0 - fiber_penalty - overmaturity).max(0.0)
}

/// Saturates once the minimum rest is reached; unknown rest scores 0.
pub fn rest_score(rest_days: Option<i64>, params: &ScoringParameters) -> f64 {
    rest_days.map_or(0.0, |days| {
        (100.0 * (days as f64 / params.rest_min_days.max(1.0)).min(1.0)).clamp(0.0, 100.0)
    })
}

/// 100, less 8 points per day of staleness beyond `max_age_days`, floored at 55.
pub fn data_quality_score(age_days: Option<i64>, max_age_days: u32) -> f64 {
    match age_days {
        Some(age) if age > i64::from(max_age_days) => {
            let extra = (age - i64::from(max_age_days)) as f64;
            (100.0 - extra * STALENESS_POINTS_PER_DAY).clamp(STALENESS_FLOOR, 100.0)
        }
        _ => 100.0,
    }
}

/// Density inside the entry band and rest known and at least the minimum.
pub fn is_eligible(density: f64, rest_days: Option<i64>, params: &ScoringParameters) -> bool {
    let in_band = density >= params.entry_min && density <= params.entry_max;
    let rested = rest_days.is_some_and(|days| days as f64 >= params.rest_min_days);
    in_band && rested
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub entry: f64,
    pub quality: f64,
    pub trend: f64,
    pub rest: f64,
    pub data_quality: f64,
}

impl SubScores {
    /// Weighted mean; `weights` must be usable (see [`WeightProfile::is_usable`]).
    pub fn composite(&self, weights: &WeightProfile) -> f64 {
        (self.entry * weights.entry
            + self.quality * weights.quality
            + self.trend * weights.trend
            + self.rest * weights.rest
            + self.data_quality * weights.data_quality)
            / weights.total()
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry {
    pub paddock_id: PaddockId,
    pub density: f64,
    /// Raw 7-day slope, kg/ha/day.
    pub slope: Option<f64>,
    pub fiber_fraction: Option<f64>,
    pub rest_days: Option<i64>,
    pub eligible: bool,
    pub gross_day_supply: Option<f64>,
    pub adjusted_day_supply: Option<f64>,
    pub classification: Classification,
    /// Inferred stocking, reported even when the paddock is free.
    pub stocking: f64,
    pub occupied: bool,
    pub score: f64,
    pub sub_scores: SubScores,
    pub water_balance_mm_7d: Option<f64>,
}

/// Scores one snapshot; `None` when its density is unknown.
pub fn score_snapshot(
    snapshot: &PaddockSnapshot,
    trend: &TrendScale,
    config: &EngineConfig,
) -> Option<RankingEntry> {
    let density = snapshot.density?;
    let params = config.params();
    let sub_scores = SubScores {
        entry: entry_score(density, params),
        quality: quality_score(density, snapshot.fiber, params.fiber_alpha),
        trend: trend.score(snapshot.growth_slope),
        rest: rest_score(snapshot.rest_days, params),
        data_quality: data_quality_score(
            snapshot.observation_age_days(),
            config.staleness_max_days,
        ),
    };
    let score = sub_scores.composite(&config.weights());
    let eligible = is_eligible(density, snapshot.rest_days, params);
    let supply = SupplyModel::from_config(config).day_supply(
        Some(density),
        snapshot.area_ha,
        snapshot.occupancy.grazing_stocking(),
        snapshot.fiber,
    );
    Some(RankingEntry {
        paddock_id: snapshot.paddock_id.clone(),
        density,
        slope: snapshot.growth_slope,
        fiber_fraction: snapshot.fiber,
        rest_days: snapshot.rest_days,
        eligible,
        gross_day_supply: supply.gross,
        adjusted_day_supply: supply.adjusted,
        classification: Classification::from_score(score, eligible),
        stocking: snapshot.occupancy.stocking_lu,
        occupied: snapshot.occupancy.occupied,
        score,
        sub_scores,
        water_balance_mm_7d: snapshot.water_balance_mm_7d,
    })
}

/// Ranks pre-built snapshots: descending class, then descending density.
/// The trend scale spans every snapshot given, ranked or not.
pub fn rank_snapshots(snapshots: &[PaddockSnapshot], config: &EngineConfig) -> Vec<RankingEntry> {
    let trend = TrendScale::from_slopes(snapshots.iter().map(|s| s.growth_slope));
    let mut ranking: Vec<RankingEntry> = snapshots
        .iter()
        .filter_map(|snapshot| score_snapshot(snapshot, &trend, config))
        .collect();
    ranking.sort_by(|a, b| {
        b.classification
            .cmp(&a.classification)
            .then_with(|| b.density.total_cmp(&a.density))
    });
    ranking
}

/// Ranking of all top-level paddocks as of `date`.
pub fn rank_paddocks(dataset: &Dataset, config: &EngineConfig, date: NaiveDate) -> Vec<RankingEntry> {
    rank_snapshots(&top_level_snapshots(dataset, config, date), config)
}
