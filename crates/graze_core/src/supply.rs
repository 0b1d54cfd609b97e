//! Forage day-supply with fiber-limited intake and a waste penalty.
//!
//! Gross supply `D0 = density × area × utilization / (stocking × intake)`.
//! Supplies above one day lose `min(β × (D0 − 1), wmax)` of their value.

use serde::{Deserialize, Serialize};

use crate::EngineConfig;

/// Plausible effective intake bounds once fiber is known, kg/LU/day.
pub const MIN_EFFECTIVE_INTAKE: f64 = 7.0;
pub const MAX_EFFECTIVE_INTAKE: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DaySupply {
    pub gross: Option<f64>,
    pub adjusted: Option<f64>,
    /// Effective intake used, kg/LU/day.
    pub intake: f64,
}

/// Base intake depressed by fiber; untouched when fiber is unknown.
pub fn effective_intake(base_intake: f64, fiber: Option<f64>, fiber_alpha: f64) -> f64 {
    match fiber {
        Some(fraction) => (base_intake * (1.0 - fiber_alpha * fraction))
            .clamp(MIN_EFFECTIVE_INTAKE, MAX_EFFECTIVE_INTAKE),
        None => base_intake,
    }
}

/// `phi = 1 − min(β × max(D0 − 1, 0), wmax)`.
pub fn waste_factor(gross: f64, beta: f64, cap: f64) -> f64 {
    1.0 - (beta * (gross - 1.0).max(0.0)).min(cap)
}

/// The coefficients a day-supply computation needs, taken from one config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupplyModel {
    pub utilization: f64,
    pub base_intake: f64,
    pub fiber_alpha: f64,
    pub waste_beta: f64,
    pub waste_cap: f64,
}

impl SupplyModel {
    pub fn from_config(config: &EngineConfig) -> Self {
        let params = config.params();
        Self {
            utilization: config.utilization(),
            base_intake: config.base_intake,
            fiber_alpha: params.fiber_alpha,
            waste_beta: params.waste_beta,
            waste_cap: params.waste_cap,
        }
    }

    pub fn intake(&self, fiber: Option<f64>) -> f64 {
        effective_intake(self.base_intake, fiber, self.fiber_alpha)
    }

    /// `area` must already be a usable (positive) area or `None`.
    pub fn day_supply(
        &self,
        density: Option<f64>,
        area: Option<f64>,
        stocking_lu: f64,
        fiber: Option<f64>,
    ) -> DaySupply {
        let intake = self.intake(fiber);
        let demand = stocking_lu * intake;
        let gross = match (density, area) {
            (Some(density), Some(area)) if demand > 0.0 => {
                Some(density * area * self.utilization / demand).filter(|d| d.is_finite())
            }
            _ => None,
        };
        let adjusted =
            gross.map(|d0| d0 * waste_factor(d0, self.waste_beta, self.waste_cap));
        DaySupply {
            gross,
            adjusted,
            intake,
        }
    }
}
