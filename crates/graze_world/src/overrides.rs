use anyhow::{bail, Result};
use graze_core::EngineConfig;
use std::collections::HashMap;

const VALID_KEYS: &[&str] = &[
    "entry_min",
    "entry_max",
    "target_min",
    "target_max",
    "fiber_alpha",
    "waste_beta",
    "waste_cap",
    "rest_min_days",
    "rest_max_days",
    "weight_entry",
    "weight_quality",
    "weight_trend",
    "weight_rest",
    "weight_data_quality",
    "utilization_pct",
    "base_intake",
    "livestock_unit_kg",
    "staleness_max_days",
];

/// Applies `key → number` overrides. Parameter and weight keys target the
/// active mode only; the rest are global scalars.
pub fn apply_overrides(
    config: &mut EngineConfig,
    overrides: &HashMap<String, serde_json::Value>,
) -> Result<()> {
    let mut weights = config.weights();
    let mut weights_touched = false;
    let mode = config.mode;
    for (key, value) in overrides {
        let params = &mut config.profiles.get_mut(mode).params;
        match key.as_str() {
            "entry_min" => params.entry_min = as_f64(key, value)?,
            "entry_max" => params.entry_max = as_f64(key, value)?,
            "target_min" => params.target_min = as_f64(key, value)?,
            "target_max" => params.target_max = as_f64(key, value)?,
            "fiber_alpha" => params.fiber_alpha = as_f64(key, value)?,
            "waste_beta" => params.waste_beta = as_f64(key, value)?,
            "waste_cap" => params.waste_cap = as_f64(key, value)?,
            "rest_min_days" => params.rest_min_days = as_f64(key, value)?,
            "rest_max_days" => params.rest_max_days = as_f64(key, value)?,
            "weight_entry" | "weight_quality" | "weight_trend" | "weight_rest"
            | "weight_data_quality" => {
                let weight = as_non_negative(key, value)?;
                match key.as_str() {
                    "weight_entry" => weights.entry = weight,
                    "weight_quality" => weights.quality = weight,
                    "weight_trend" => weights.trend = weight,
                    "weight_rest" => weights.rest = weight,
                    _ => weights.data_quality = weight,
                }
                weights_touched = true;
            }
            "utilization_pct" => config.utilization_pct = as_f64(key, value)?,
            "base_intake" => config.base_intake = as_f64(key, value)?,
            "livestock_unit_kg" => config.livestock_unit_kg = as_f64(key, value)?,
            "staleness_max_days" => config.staleness_max_days = as_u32(key, value)?,
            _ => bail!(
                "unknown override key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            ),
        }
    }
    if weights_touched {
        config.profiles.get_mut(mode).weights = Some(weights);
    }
    Ok(())
}

/// Parses a `key=value` pair as given on the command line. The value must
/// be a JSON number.
pub fn parse_override(pair: &str) -> Result<(String, serde_json::Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("override '{pair}' must look like key=value");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("override '{pair}' has an empty key");
    }
    let value: serde_json::Value = serde_json::from_str(raw.trim())
        .map_err(|_| anyhow::anyhow!("override '{key}': expected a number, got '{raw}'"))?;
    Ok((key.to_string(), value))
}

fn as_f64(key: &str, value: &serde_json::Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| anyhow::anyhow!("override '{key}': expected a number, got {value}"))
}

fn as_non_negative(key: &str, value: &serde_json::Value) -> Result<f64> {
    let v = as_f64(key, value)?;
    if v < 0.0 {
        bail!("override '{key}': weights must not be negative, got {v}");
    }
    Ok(v)
}

fn as_u32(key: &str, value: &serde_json::Value) -> Result<u32> {
    let val = value.as_u64().ok_or_else(|| {
        anyhow::anyhow!("override '{key}': expected a non-negative integer, got {value}")
    })?;
    u32::try_from(val)
        .map_err(|_| anyhow::anyhow!("override '{key}': value {val} exceeds u32 range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use graze_core::{Mode, ScoringParameters, WeightProfile};

    #[test]
    fn test_param_override_targets_active_mode() {
        let mut config = EngineConfig::default().with_mode(Mode::Gain);
        let overrides = HashMap::from([("entry_min".to_string(), serde_json::json!(2750.0))]);
        apply_overrides(&mut config, &overrides).unwrap();
        assert!((config.params().entry_min - 2750.0).abs() < f64::EPSILON);
        let balanced = &config.profiles.get(Mode::Balanced).params;
        assert_eq!(*balanced, ScoringParameters::for_mode(Mode::Balanced));
    }

    #[test]
    fn test_weight_override_starts_from_effective_profile() {
        let mut config = EngineConfig::default();
        config.profiles.get_mut(Mode::Balanced).weights = None;
        let overrides = HashMap::from([("weight_rest".to_string(), serde_json::json!(40))]);
        apply_overrides(&mut config, &overrides).unwrap();
        let weights = config.weights();
        assert!((weights.rest - 40.0).abs() < f64::EPSILON);
        assert!((weights.entry - WeightProfile::FALLBACK.entry).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scalar_overrides() {
        let mut config = EngineConfig::default();
        let overrides = HashMap::from([
            ("utilization_pct".to_string(), serde_json::json!(45)),
            ("staleness_max_days".to_string(), serde_json::json!(10)),
        ]);
        apply_overrides(&mut config, &overrides).unwrap();
        assert!((config.utilization_pct - 45.0).abs() < f64::EPSILON);
        assert_eq!(config.staleness_max_days, 10);
    }

    #[test]
    fn test_unknown_key_errors() {
        let mut config = EngineConfig::default();
        let overrides = HashMap::from([("nonexistent_field".to_string(), serde_json::json!(1.0))]);
        let err = apply_overrides(&mut config, &overrides)
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown override key"));
        assert!(err.contains("nonexistent_field"));
        assert!(err.contains("waste_cap"));
    }

    #[test]
    fn test_type_mismatch_errors() {
        let mut config = EngineConfig::default();
        let overrides = HashMap::from([(
            "staleness_max_days".to_string(),
            serde_json::json!("not_a_number"),
        )]);
        assert!(apply_overrides(&mut config, &overrides).is_err());
        let negative = HashMap::from([("weight_trend".to_string(), serde_json::json!(-1))]);
        assert!(apply_overrides(&mut config, &negative).is_err());
    }

    #[test]
    fn test_parse_override_pairs() {
        let (key, value) = parse_override("waste_beta=0.07").unwrap();
        assert_eq!(key, "waste_beta");
        assert_eq!(value, serde_json::json!(0.07));
        assert!(parse_override("waste_beta").is_err());
        assert!(parse_override("=3").is_err());
        assert!(parse_override("waste_beta=lots").is_err());
    }
}
