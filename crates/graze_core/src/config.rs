//! Engine configuration: modes, per-mode parameter sets and weight profiles.
//!
//! Every computation takes an `&EngineConfig`; nothing reads ambient state.
//! Switching mode changes which profile is active, it never rewrites one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Modes and sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[serde(alias = "eq")]
    Balanced,
    #[serde(alias = "gain-focused")]
    Gain,
    #[serde(alias = "etico", alias = "conservation")]
    Ethical,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Balanced, Mode::Gain, Mode::Ethical];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Balanced => "balanced",
            Mode::Gain => "gain",
            Mode::Ethical => "ethical",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" | "eq" => Ok(Mode::Balanced),
            "gain" | "gain-focused" => Ok(Mode::Gain),
            "ethical" | "etico" | "conservation" => Ok(Mode::Ethical),
            other => Err(format!(
                "unknown mode '{other}' (expected balanced, gain or ethical)"
            )),
        }
    }
}

/// Which biomass density field is preferred for lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensitySource {
    #[default]
    Smoothed,
    Raw,
}

impl FromStr for DensitySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smoothed" | "smoothed_7d" => Ok(DensitySource::Smoothed),
            "raw" => Ok(DensitySource::Raw),
            other => Err(format!(
                "unknown density source '{other}' (expected smoothed or raw)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter sets and weights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringParameters {
    /// Entry-readiness band, kg/ha.
    pub entry_min: f64,
    pub entry_max: f64,
    /// Target residual band, kg/ha. Only projection status reads it.
    pub target_min: f64,
    pub target_max: f64,
    /// Fiber-intake coefficient (alpha).
    pub fiber_alpha: f64,
    /// Waste-penalty coefficient (beta) and cap (wmax).
    pub waste_beta: f64,
    pub waste_cap: f64,
    pub rest_min_days: f64,
    pub rest_max_days: f64,
}

impl ScoringParameters {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Balanced => Self {
                entry_min: 2600.0,
                entry_max: 3200.0,
                target_min: 1600.0,
                target_max: 1900.0,
                fiber_alpha: 0.6,
                waste_beta: 0.05,
                waste_cap: 0.3,
                rest_min_days: 28.0,
                rest_max_days: 60.0,
            },
            Mode::Gain => Self {
                entry_min: 2800.0,
                entry_max: 3400.0,
                target_min: 1700.0,
                target_max: 2000.0,
                fiber_alpha: 0.75,
                waste_beta: 0.06,
                waste_cap: 0.3,
                rest_min_days: 25.0,
                rest_max_days: 55.0,
            },
            Mode::Ethical => Self {
                entry_min: 2600.0,
                entry_max: 3100.0,
                target_min: 1600.0,
                target_max: 1850.0,
                fiber_alpha: 0.5,
                waste_beta: 0.04,
                waste_cap: 0.25,
                rest_min_days: 30.0,
                rest_max_days: 70.0,
            },
        }
    }
}

/// Relative weights of the five sub-scores. Only proportions matter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    pub entry: f64,
    pub quality: f64,
    pub trend: f64,
    pub rest: f64,
    pub data_quality: f64,
}

impl WeightProfile {
    /// Used whenever the active mode has no usable profile.
    pub const FALLBACK: WeightProfile = WeightProfile {
        entry: 35.0,
        quality: 25.0,
        trend: 20.0,
        rest: 15.0,
        data_quality: 5.0,
    };

    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Balanced => Self::FALLBACK,
            Mode::Gain => Self {
                entry: 40.0,
                quality: 30.0,
                trend: 20.0,
                rest: 8.0,
                data_quality: 2.0,
            },
            Mode::Ethical => Self {
                entry: 30.0,
                quality: 20.0,
                trend: 15.0,
                rest: 30.0,
                data_quality: 5.0,
            },
        }
    }

    pub fn total(&self) -> f64 {
        self.entry + self.quality + self.trend + self.rest + self.data_quality
    }

    /// Non-negative, finite, and not all zero.
    pub fn is_usable(&self) -> bool {
        let parts = [
            self.entry,
            self.quality,
            self.trend,
            self.rest,
            self.data_quality,
        ];
        parts.iter().all(|w| w.is_finite() && *w >= 0.0) && self.total() > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeProfile {
    pub params: ScoringParameters,
    #[serde(default)]
    pub weights: Option<WeightProfile>,
}

impl ModeProfile {
    pub fn builtin(mode: Mode) -> Self {
        Self {
            params: ScoringParameters::for_mode(mode),
            weights: Some(WeightProfile::for_mode(mode)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeProfiles {
    pub balanced: ModeProfile,
    pub gain: ModeProfile,
    pub ethical: ModeProfile,
}

impl ModeProfiles {
    pub fn get(&self, mode: Mode) -> &ModeProfile {
        match mode {
            Mode::Balanced => &self.balanced,
            Mode::Gain => &self.gain,
            Mode::Ethical => &self.ethical,
        }
    }

    pub fn get_mut(&mut self, mode: Mode) -> &mut ModeProfile {
        match mode {
            Mode::Balanced => &mut self.balanced,
            Mode::Gain => &mut self.gain,
            Mode::Ethical => &mut self.ethical,
        }
    }
}

impl Default for ModeProfiles {
    fn default() -> Self {
        Self {
            balanced: ModeProfile::builtin(Mode::Balanced),
            gain: ModeProfile::builtin(Mode::Gain),
            ethical: ModeProfile::builtin(Mode::Ethical),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bumped by every replacement through a shared handle.
    pub revision: u64,
    pub mode: Mode,
    pub source: DensitySource,
    pub profiles: ModeProfiles,
    /// Harvestable share of standing biomass, percent.
    pub utilization_pct: f64,
    /// Base intake, kg DM per livestock unit per day.
    pub base_intake: f64,
    /// Observations older than this start losing data-quality points.
    pub staleness_max_days: u32,
    /// Live weight equivalent to one livestock unit.
    pub livestock_unit_kg: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            revision: 0,
            mode: Mode::Balanced,
            source: DensitySource::Smoothed,
            profiles: ModeProfiles::default(),
            utilization_pct: 60.0,
            base_intake: 10.0,
            staleness_max_days: 6,
            livestock_unit_kg: 450.0,
        }
    }
}

impl EngineConfig {
    pub fn active(&self) -> &ModeProfile {
        self.profiles.get(self.mode)
    }

    pub fn params(&self) -> &ScoringParameters {
        &self.active().params
    }

    pub fn weights(&self) -> WeightProfile {
        self.active()
            .weights
            .filter(WeightProfile::is_usable)
            .unwrap_or(WeightProfile::FALLBACK)
    }

    /// Utilization as a fraction.
    pub fn utilization(&self) -> f64 {
        self.utilization_pct / 100.0
    }

    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}
