//! Factory defaults, persisted user configuration and how they merge.
//!
//! Merge order: factory defaults, then global overrides (every mode), then
//! per-mode overrides (only when `sticky`, only for their mode), then the
//! remembered mode and density source. A missing or broken file never
//! stops anything: it yields a [`ConfigWarning`] and the layer below wins.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use graze_core::{DensitySource, EngineConfig, Mode, ScoringParameters, WeightProfile};
use serde::{Deserialize, Serialize};

use crate::write_json_atomic;

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub path: PathBuf,
    pub message: String,
}

impl ConfigWarning {
    fn new(path: &Path, message: impl Into<String>) -> Self {
        let warning = Self {
            path: path.to_path_buf(),
            message: message.into(),
        };
        tracing::warn!(path = %warning.path.display(), "{}", warning.message);
        warning
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

// ---------------------------------------------------------------------------
// Override layers
// ---------------------------------------------------------------------------

/// Partial parameter set: only supplied keys replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_min_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_max_days: Option<f64>,
}

impl ParamOverrides {
    /// Every field set from `params`.
    pub fn capture(params: &ScoringParameters) -> Self {
        Self {
            entry_min: Some(params.entry_min),
            entry_max: Some(params.entry_max),
            target_min: Some(params.target_min),
            target_max: Some(params.target_max),
            fiber_alpha: Some(params.fiber_alpha),
            waste_beta: Some(params.waste_beta),
            waste_cap: Some(params.waste_cap),
            rest_min_days: Some(params.rest_min_days),
            rest_max_days: Some(params.rest_max_days),
        }
    }

    pub fn apply(&self, params: &mut ScoringParameters) {
        let fields = [
            (self.entry_min, &mut params.entry_min),
            (self.entry_max, &mut params.entry_max),
            (self.target_min, &mut params.target_min),
            (self.target_max, &mut params.target_max),
            (self.fiber_alpha, &mut params.fiber_alpha),
            (self.waste_beta, &mut params.waste_beta),
            (self.waste_cap, &mut params.waste_cap),
            (self.rest_min_days, &mut params.rest_min_days),
            (self.rest_max_days, &mut params.rest_max_days),
        ];
        for (value, slot) in fields {
            if let Some(value) = value.filter(|v| v.is_finite()) {
                *slot = value;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<ParamOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staleness_max_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub livestock_unit_kg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_intake: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<ParamOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightProfile>,
}

/// The persisted user configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub sticky: bool,
    pub global: GlobalOverrides,
    pub per_mode: BTreeMap<Mode, ModeOverrides>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_source: Option<DensitySource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserConfig {
    /// A fresh configuration holding only what [`UserConfig::record`] writes.
    pub fn capture(config: &EngineConfig, sticky: bool) -> Self {
        let mut user = Self::default();
        user.record(config, sticky);
        user
    }

    /// Records the active mode's parameters and weights plus the global
    /// scalars of `config` into this configuration. Sticky records replace
    /// only the active mode's entry; other modes' entries are kept.
    pub fn record(&mut self, config: &EngineConfig, sticky: bool) {
        let params = Some(ParamOverrides::capture(config.params()));
        let weights = Some(config.weights());
        if sticky {
            self.per_mode
                .insert(config.mode, ModeOverrides { params, weights });
        } else {
            self.global.params = params;
            self.global.weights = weights;
        }
        self.sticky = sticky;
        self.global.staleness_max_days = Some(config.staleness_max_days);
        self.global.livestock_unit_kg = Some(config.livestock_unit_kg);
        self.global.utilization_pct = Some(config.utilization_pct);
        self.global.base_intake = Some(config.base_intake);
        self.last_mode = Some(config.mode);
        self.last_source = Some(config.source);
        self.updated_at = Some(Utc::now());
    }

    /// Layers this configuration over `base`.
    pub fn apply(&self, base: &EngineConfig) -> EngineConfig {
        let mut config = base.clone();
        for mode in Mode::ALL {
            let profile = config.profiles.get_mut(mode);
            if let Some(params) = &self.global.params {
                params.apply(&mut profile.params);
            }
            if let Some(weights) = self.global.weights {
                profile.weights = Some(weights);
            }
            if !self.sticky {
                continue;
            }
            if let Some(overrides) = self.per_mode.get(&mode) {
                if let Some(params) = &overrides.params {
                    params.apply(&mut profile.params);
                }
                if let Some(weights) = overrides.weights {
                    profile.weights = Some(weights);
                }
            }
        }
        let global = &self.global;
        if let Some(days) = global.staleness_max_days {
            config.staleness_max_days = days;
        }
        if let Some(kg) = global.livestock_unit_kg.filter(|v| v.is_finite()) {
            config.livestock_unit_kg = kg;
        }
        if let Some(pct) = global.utilization_pct.filter(|v| v.is_finite()) {
            config.utilization_pct = pct;
        }
        if let Some(intake) = global.base_intake.filter(|v| v.is_finite()) {
            config.base_intake = intake;
        }
        if let Some(mode) = self.last_mode {
            config.mode = mode;
        }
        if let Some(source) = self.last_source {
            config.source = source;
        }
        config
    }
}

// ---------------------------------------------------------------------------
// Loading and persistence
// ---------------------------------------------------------------------------

/// Factory defaults from `path`; built-ins plus a warning when the file is
/// missing or malformed.
pub fn load_defaults(path: &Path) -> (EngineConfig, Option<ConfigWarning>) {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => {
            let warning = ConfigWarning::new(
                path,
                format!("cannot read factory defaults ({err}); using built-in defaults"),
            );
            return (EngineConfig::default(), Some(warning));
        }
    };
    match serde_json::from_str::<EngineConfig>(&json) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), mode = %config.mode, "factory defaults loaded");
            (config, None)
        }
        Err(err) => {
            let warning = ConfigWarning::new(
                path,
                format!("malformed factory defaults ({err}); using built-in defaults"),
            );
            (EngineConfig::default(), Some(warning))
        }
    }
}

/// Persisted user configuration from `path`. An absent file is the empty
/// configuration; an unreadable or malformed one is ignored with a warning.
pub fn load_user_config(path: &Path) -> (UserConfig, Option<ConfigWarning>) {
    if !path.exists() {
        return (UserConfig::default(), None);
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read user configuration ({err})"))
        .and_then(|json| {
            serde_json::from_str::<UserConfig>(&json)
                .map_err(|err| format!("malformed user configuration ({err})"))
        });
    match parsed {
        Ok(user) => (user, None),
        Err(message) => {
            let warning = ConfigWarning::new(path, format!("{message}; ignoring it"));
            (UserConfig::default(), Some(warning))
        }
    }
}

/// Weight profiles that will be replaced by the fallback profile.
fn unusable_weight_warnings(config: &EngineConfig, path: &Path) -> Vec<ConfigWarning> {
    Mode::ALL
        .into_iter()
        .filter(|mode| {
            config
                .profiles
                .get(*mode)
                .weights
                .is_some_and(|w| !w.is_usable())
        })
        .map(|mode| {
            ConfigWarning::new(
                path,
                format!("weights for mode '{mode}' are unusable; the default profile applies"),
            )
        })
        .collect()
}

pub struct ResolvedConfig {
    pub config: EngineConfig,
    pub user: UserConfig,
    pub warnings: Vec<ConfigWarning>,
}

/// Defaults file, then user file, merged.
pub fn resolve_config(defaults_path: &Path, user_path: &Path) -> ResolvedConfig {
    let (defaults, defaults_warning) = load_defaults(defaults_path);
    let (user, user_warning) = load_user_config(user_path);
    let config = user.apply(&defaults);
    let mut warnings: Vec<ConfigWarning> =
        defaults_warning.into_iter().chain(user_warning).collect();
    warnings.extend(unusable_weight_warnings(&config, user_path));
    ResolvedConfig {
        config,
        user,
        warnings,
    }
}

/// Writes `user` as pretty JSON via a temp file and rename.
pub fn export_user_config(user: &UserConfig, path: &Path) -> Result<()> {
    write_json_atomic(user, path)
        .with_context(|| format!("exporting user configuration to {}", path.display()))?;
    tracing::info!(path = %path.display(), "user configuration written");
    Ok(())
}

/// Parses a user configuration for import. Unlike loading, a bad file is an error.
pub fn import_user_config(path: &Path) -> Result<UserConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading user configuration: {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("parsing user configuration: {}", path.display()))
}

/// Deletes the persisted file. Returns whether one existed.
pub fn reset_user_config(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(path)
        .with_context(|| format!("removing user configuration: {}", path.display()))?;
    tracing::info!(path = %path.display(), "user configuration reset");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_defaults_fall_back_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warning) = load_defaults(&dir.path().join("nope.json"));
        assert_eq!(config, EngineConfig::default());
        assert!(warning.is_some());
    }

    #[test]
    fn malformed_user_config_is_ignored_with_warning() {
        let file = write_temp("{ this is not json");
        let (user, warning) = load_user_config(file.path());
        assert_eq!(user, UserConfig::default());
        assert!(warning.unwrap().message.contains("malformed"));
    }

    #[test]
    fn absent_user_config_is_empty_without_warning() {
        let dir = tempfile::tempdir().unwrap();
        let (user, warning) = load_user_config(&dir.path().join("graze_user.json"));
        assert_eq!(user, UserConfig::default());
        assert!(warning.is_none());
    }

    #[test]
    fn partial_param_override_only_replaces_given_keys() {
        let file = write_temp(r#"{"global": {"params": {"entry_min": 2500}}}"#);
        let (user, _) = load_user_config(file.path());
        let config = user.apply(&EngineConfig::default());
        for mode in Mode::ALL {
            let params = &config.profiles.get(mode).params;
            assert!((params.entry_min - 2500.0).abs() < f64::EPSILON);
            let builtin = ScoringParameters::for_mode(mode);
            assert!((params.entry_max - builtin.entry_max).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn per_mode_overrides_need_sticky() {
        let json = r#"{
            "sticky": false,
            "per_mode": {"gain": {"params": {"rest_min_days": 40}}},
            "last_mode": "gain"
        }"#;
        let (mut user, _) = load_user_config(write_temp(json).path());
        let loose = user.apply(&EngineConfig::default());
        assert_eq!(loose.mode, Mode::Gain);
        assert!((loose.params().rest_min_days - 25.0).abs() < f64::EPSILON);

        user.sticky = true;
        let sticky = user.apply(&EngineConfig::default());
        assert!((sticky.params().rest_min_days - 40.0).abs() < f64::EPSILON);
        // Other modes untouched.
        let balanced = &sticky.profiles.get(Mode::Balanced).params;
        assert!((balanced.rest_min_days - 28.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sticky_capture_lands_under_active_mode() {
        let mut config = EngineConfig::default().with_mode(Mode::Ethical);
        config.profiles.get_mut(Mode::Ethical).params.entry_max = 3000.0;
        let user = UserConfig::capture(&config, true);
        assert!(user.global.params.is_none());
        assert!(user.per_mode.contains_key(&Mode::Ethical));
        assert_eq!(user.last_mode, Some(Mode::Ethical));
        let resolved = user.apply(&EngineConfig::default());
        assert_eq!(resolved.profiles, config.profiles);
    }

    #[test]
    fn sticky_records_in_two_modes_keep_both() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graze_user.json");
        let base = EngineConfig::default();

        let mut balanced = base.clone();
        balanced.profiles.get_mut(Mode::Balanced).params.entry_min = 2500.0;
        let mut user = UserConfig::default();
        user.record(&balanced, true);
        export_user_config(&user, &path).unwrap();

        let (mut user, _) = load_user_config(&path);
        let mut gain = user.apply(&base).with_mode(Mode::Gain);
        gain.profiles.get_mut(Mode::Gain).params.rest_min_days = 35.0;
        user.record(&gain, true);
        export_user_config(&user, &path).unwrap();

        let (user, _) = load_user_config(&path);
        assert_eq!(user.per_mode.len(), 2);
        let resolved = user.apply(&base);
        assert_eq!(resolved.mode, Mode::Gain);
        let balanced_params = &resolved.profiles.get(Mode::Balanced).params;
        assert!((balanced_params.entry_min - 2500.0).abs() < f64::EPSILON);
        assert!((resolved.params().rest_min_days - 35.0).abs() < f64::EPSILON);
    }

    #[test]
    fn export_import_round_trip_preserves_every_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graze_user.json");
        let mut config = EngineConfig::default().with_mode(Mode::Gain);
        config.profiles.get_mut(Mode::Gain).params.fiber_alpha = 0.7;
        config.utilization_pct = 55.0;
        let user = UserConfig::capture(&config, true);

        export_user_config(&user, &path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        let imported = import_user_config(&path).unwrap();
        assert_eq!(imported, user);

        let base = EngineConfig::default();
        let before = user.apply(&base);
        let after = imported.apply(&base);
        for mode in Mode::ALL {
            assert_eq!(before.profiles.get(mode), after.profiles.get(mode));
            let (b, a) = (before.clone().with_mode(mode), after.clone().with_mode(mode));
            assert_eq!(b.params(), a.params());
            assert_eq!(b.weights(), a.weights());
        }
    }

    #[test]
    fn reset_removes_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graze_user.json");
        export_user_config(&UserConfig::default(), &path).unwrap();
        assert!(reset_user_config(&path).unwrap());
        assert!(!reset_user_config(&path).unwrap());
    }

    #[test]
    fn unusable_weights_produce_warning() {
        let file = write_temp(
            r#"{"global": {"weights": {"entry": 0, "quality": 0, "trend": 0, "rest": 0, "data_quality": 0}}}"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_config(&dir.path().join("missing_defaults.json"), file.path());
        // One for the missing defaults file, one per mode for the weights.
        assert_eq!(resolved.warnings.len(), 1 + Mode::ALL.len());
        assert_eq!(resolved.config.weights(), WeightProfile::FALLBACK);
    }
}
