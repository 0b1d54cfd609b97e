//! Everything between files on disk and the engine: data loading and
//! validation, factory defaults, persisted user configuration, overrides
//! and the shared configuration handle.

pub mod config;
mod dataset;
pub mod overrides;
mod shared;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

pub use config::{
    export_user_config, import_user_config, load_defaults, load_user_config, reset_user_config,
    resolve_config, ConfigWarning, ResolvedConfig, UserConfig,
};
pub use dataset::{
    load_dataset, load_records, validate_dataset, DataIssue, LoadedDataset, BIOMASS_FILE,
    FIBER_FILE, MOVES_FILE, PADDOCKS_FILE, WATER_BALANCE_FILE,
};
pub use overrides::{apply_overrides, parse_override};
pub use shared::SharedConfig;

/// Writes pretty JSON atomically: write to `.tmp` then rename.
pub fn write_json_atomic<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value).context("serializing JSON")?;
    let mut file = std::fs::File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("syncing {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} to {}", tmp_path.display(), path.display()))?;
    Ok(())
}
