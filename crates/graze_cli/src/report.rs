//! Multi-date ranking report: one `ranking.csv` and one `run_info.json`
//! per run directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use graze_core::{rank_paddocks, Dataset, RankingEntry};
use graze_world::{write_json_atomic, SharedConfig};
use rayon::prelude::*;
use serde::Serialize;
use uuid::Uuid;

pub const RANKING_FILE: &str = "ranking.csv";
pub const RUN_INFO_FILE: &str = "run_info.json";

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    date: NaiveDate,
    rank: usize,
    paddock_id: &'a str,
    density: f64,
    slope: Option<f64>,
    fiber_fraction: Option<f64>,
    rest_days: Option<i64>,
    eligible: bool,
    gross_day_supply: Option<f64>,
    adjusted_day_supply: Option<f64>,
    classification: &'static str,
    stocking: f64,
    occupied: bool,
    score: f64,
    water_balance_mm_7d: Option<f64>,
}

impl<'a> ReportRow<'a> {
    fn new(date: NaiveDate, rank: usize, entry: &'a RankingEntry) -> Self {
        Self {
            date,
            rank,
            paddock_id: &entry.paddock_id.0,
            density: entry.density,
            slope: entry.slope,
            fiber_fraction: entry.fiber_fraction,
            rest_days: entry.rest_days,
            eligible: entry.eligible,
            gross_day_supply: entry.gross_day_supply,
            adjusted_day_supply: entry.adjusted_day_supply,
            classification: entry.classification.as_str(),
            stocking: entry.stocking,
            occupied: entry.occupied,
            score: entry.score,
            water_balance_mm_7d: entry.water_balance_mm_7d,
        }
    }
}

#[derive(Debug)]
pub struct ReportSummary {
    pub run_id: Uuid,
    pub run_dir: PathBuf,
    pub dates: usize,
    pub rows: usize,
}

/// Every date in `from..=to`.
pub fn date_range(from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>> {
    if from > to {
        bail!("report range is empty: --from {from} is after --to {to}");
    }
    Ok(from.iter_days().take_while(|d| *d <= to).collect())
}

/// Ranks every date in parallel against a single configuration snapshot
/// and writes the results under a fresh directory in `output_dir`.
pub fn run_report(
    dataset: &Dataset,
    shared: &SharedConfig,
    from: NaiveDate,
    to: NaiveDate,
    output_dir: &Path,
) -> Result<ReportSummary> {
    let dates = date_range(from, to)?;
    let config = shared.snapshot();

    let rankings: Vec<(NaiveDate, Vec<RankingEntry>)> = dates
        .par_iter()
        .map(|&date| (date, rank_paddocks(dataset, &config, date)))
        .collect();

    let run_id = Uuid::new_v4();
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_dir = output_dir.join(format!("report_{from}_{to}_{timestamp}"));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating output directory: {}", run_dir.display()))?;

    let rows: Vec<ReportRow<'_>> = rankings
        .iter()
        .flat_map(|(date, ranking)| {
            ranking
                .iter()
                .enumerate()
                .map(|(index, entry)| ReportRow::new(*date, index + 1, entry))
        })
        .collect();
    write_csv_atomic(&rows, &run_dir.join(RANKING_FILE))?;

    let run_info = serde_json::json!({
        "run_id": run_id.to_string(),
        "created_at": chrono::Utc::now().to_rfc3339(),
        "runner": "graze_cli",
        "from": from,
        "to": to,
        "dates": dates.len(),
        "rows": rows.len(),
        "mode": config.mode,
        "source": config.source,
        "config_revision": config.revision,
        "paddocks": dataset.top_level().count(),
    });
    write_json_atomic(&run_info, &run_dir.join(RUN_INFO_FILE))?;

    tracing::info!(
        run_id = %run_id,
        dates = dates.len(),
        rows = rows.len(),
        dir = %run_dir.display(),
        "report written"
    );
    Ok(ReportSummary {
        run_id,
        run_dir,
        dates: dates.len(),
        rows: rows.len(),
    })
}

fn write_csv_atomic<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let tmp_path = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing {}", tmp_path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", tmp_path.display()))?;
    drop(writer);
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} to {}", tmp_path.display(), path.display()))?;
    Ok(())
}
