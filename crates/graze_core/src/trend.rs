//! Seven-day growth slope and its normalization across a comparison set.

use chrono::{Days, NaiveDate};

use crate::series::last_on_or_before;
use crate::BiomassObservation;

pub const TREND_WINDOW_DAYS: u64 = 7;
pub const NEUTRAL_TREND_SCORE: f64 = 50.0;
/// Ranges narrower than this are treated as flat.
const DEGENERATE_RANGE: f64 = 1e-6;

/// (smoothed as of `date` − smoothed as of `date − 7`) / 7, in kg/ha/day.
pub fn growth_slope(biomass: &[BiomassObservation], date: NaiveDate) -> Option<f64> {
    let window_start = date.checked_sub_days(Days::new(TREND_WINDOW_DAYS))?;
    let latest = last_on_or_before(biomass, date, BiomassObservation::smoothed_or_raw)?;
    let earlier = last_on_or_before(biomass, window_start, BiomassObservation::smoothed_or_raw)?;
    Some((latest - earlier) / TREND_WINDOW_DAYS as f64)
}

/// Min/max of the finite slopes in a comparison set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendScale {
    range: Option<(f64, f64)>,
}

impl TrendScale {
    pub fn from_slopes<I>(slopes: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let range = slopes
            .into_iter()
            .flatten()
            .filter(|s| s.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, s| match acc {
                None => Some((s, s)),
                Some((min, max)) => Some((min.min(s), max.max(s))),
            });
        Self { range }
    }

    /// Rescales `slope` into [0,100]; a missing slope counts as flat (0).
    pub fn score(&self, slope: Option<f64>) -> f64 {
        let Some((min, max)) = self.range else {
            return NEUTRAL_TREND_SCORE;
        };
        if (max - min).abs() < DEGENERATE_RANGE {
            return NEUTRAL_TREND_SCORE;
        }
        let own = slope.filter(|s| s.is_finite()).unwrap_or(0.0);
        (100.0 * (own - min) / (max - min)).clamp(0.0, 100.0)
    }
}
