//! Subcommand bodies and their plain-text output.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use graze_control::{RotationAdvisor, RotationPlan};
use graze_core::{
    biomass_breaks, farm_kpis, paddock_kpis, project_density, rank_paddocks, top_level_snapshots,
    EngineConfig, PaddockId, PaddockSnapshot, RankingEntry, SupplyModel, TargetStatus,
};
use graze_world::SharedConfig;

use crate::report::run_report;
use crate::Session;

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.decimals$}"))
}

fn fmt_days(value: Option<i64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |d| d.to_string())
}

fn fmt_fiber(fraction: Option<f64>) -> String {
    fmt_opt(fraction.map(|f| f * 100.0), 1)
}

fn snapshot_for(session: &Session, paddock: &str) -> Result<PaddockSnapshot> {
    let id = PaddockId::from(paddock);
    let record = session
        .dataset
        .paddock(&id)
        .with_context(|| format!("unknown paddock '{paddock}'"))?;
    Ok(PaddockSnapshot::build(
        &session.dataset,
        &session.config,
        record,
        session.date,
    ))
}

fn print_header(title: &str, session: &Session) {
    println!(
        "{title}  date={}  mode={}  source={:?}",
        session.date, session.config.mode, session.config.source
    );
    println!("{}", "-".repeat(96));
}

// ---------------------------------------------------------------------------
// rank
// ---------------------------------------------------------------------------

pub fn rank(session: &Session, json: bool) -> Result<()> {
    let ranking = rank_paddocks(&session.dataset, &session.config, session.date);
    if json {
        let out = serde_json::to_string_pretty(&ranking).context("serializing ranking")?;
        println!("{out}");
        return Ok(());
    }
    print_header("Ranking", session);
    print_ranking_table(&ranking);
    Ok(())
}

fn print_ranking_table(ranking: &[RankingEntry]) {
    println!(
        "{:>3}  {:<10} {:>7} {:>7} {:>6} {:>5} {:>4} {:>6} {:>6} {:<9} {:>6} {:>6}",
        "#", "paddock", "density", "slope", "fiber%", "rest", "elig", "gross", "adj", "class",
        "LU", "score"
    );
    for (index, entry) in ranking.iter().enumerate() {
        println!(
            "{:>3}  {:<10} {:>7.0} {:>7} {:>6} {:>5} {:>4} {:>6} {:>6} {:<9} {:>6.1} {:>6.1}",
            index + 1,
            entry.paddock_id.0,
            entry.density,
            fmt_opt(entry.slope, 1),
            fmt_fiber(entry.fiber_fraction),
            fmt_days(entry.rest_days),
            if entry.eligible { "yes" } else { "no" },
            fmt_opt(entry.gross_day_supply, 1),
            fmt_opt(entry.adjusted_day_supply, 1),
            entry.classification.as_str(),
            entry.stocking,
            entry.score,
        );
    }
    if ranking.is_empty() {
        println!("(no paddock has a density on or before this date)");
    }
}

// ---------------------------------------------------------------------------
// days / project
// ---------------------------------------------------------------------------

pub fn days(session: &Session, paddock: &str, stocking: Option<f64>) -> Result<()> {
    let snapshot = snapshot_for(session, paddock)?;
    let stocking_lu = stocking.unwrap_or_else(|| snapshot.occupancy.grazing_stocking());
    let supply = SupplyModel::from_config(&session.config).day_supply(
        snapshot.density,
        snapshot.area_ha,
        stocking_lu,
        snapshot.fiber,
    );
    print_header("Day supply", session);
    println!("paddock      {}", snapshot.paddock_id);
    println!("density      {} kg/ha", fmt_opt(snapshot.density, 0));
    println!("area         {} ha", fmt_opt(snapshot.area_ha, 2));
    println!(
        "stocking     {stocking_lu:.1} LU{}",
        if stocking.is_some() { " (what-if)" } else { "" }
    );
    println!("intake       {:.2} kg/LU/day", supply.intake);
    println!("gross days   {}", fmt_opt(supply.gross, 1));
    println!("adjusted     {}", fmt_opt(supply.adjusted, 1));
    Ok(())
}

pub fn project(session: &Session, paddock: &str) -> Result<()> {
    let snapshot = snapshot_for(session, paddock)?;
    let projected = project_density(&snapshot, &session.config, None);
    let status = projected.map(|d| TargetStatus::of(d, session.config.params()));
    let params = session.config.params();
    print_header("Projection", session);
    println!("paddock      {}", snapshot.paddock_id);
    println!(
        "observed     {} kg/ha on {}",
        fmt_opt(snapshot.density, 0),
        snapshot
            .last_observed
            .map_or_else(|| "n/a".to_string(), |d| d.to_string())
    );
    println!(
        "occupied     {} ({:.1} LU)",
        snapshot.occupancy.occupied, snapshot.occupancy.stocking_lu
    );
    println!("projected    {} kg/ha", fmt_opt(projected, 0));
    println!(
        "target       {:.0}-{:.0} kg/ha: {}",
        params.target_min,
        params.target_max,
        status.map_or("n/a", TargetStatus::as_str)
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// kpis
// ---------------------------------------------------------------------------

pub fn kpis(session: &Session, paddock: Option<&str>) -> Result<()> {
    print_header("Indicators", session);
    if let Some(paddock) = paddock {
        let snapshot = snapshot_for(session, paddock)?;
        let kpis = paddock_kpis(&snapshot, &session.config);
        println!("paddock      {}", kpis.paddock_id);
        println!("density      {} kg/ha", fmt_opt(kpis.density, 0));
        println!("area         {} ha", fmt_opt(kpis.area_ha, 2));
        println!("stocking     {:.1} LU", kpis.stocking);
        println!("supply       {:.0} kg", kpis.supply_kg);
        println!("demand       {:.1} kg/day", kpis.demand_kg_per_day);
        println!("day supply   {}", fmt_opt(kpis.day_supply, 1));
        return Ok(());
    }
    let snapshots = top_level_snapshots(&session.dataset, &session.config, session.date);
    let farm = farm_kpis(&snapshots, &session.config);
    println!("mean density {} kg/ha", fmt_opt(farm.mean_density, 0));
    println!("area         {:.2} ha", farm.total_area_ha);
    println!("stocking     {:.1} LU", farm.total_stocking);
    println!("supply       {:.0} kg", farm.supply_kg);
    println!("demand       {:.1} kg/day", farm.demand_kg_per_day);
    println!("day supply   {}", fmt_opt(farm.day_supply, 1));
    match biomass_breaks(&snapshots) {
        Some(breaks) => {
            let breaks: Vec<String> = breaks.iter().map(|b| format!("{b:.0}")).collect();
            println!("breaks       {}", breaks.join(" / "));
        }
        None => println!("breaks       n/a"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

pub fn plan(session: &Session, stocking: f64, top: usize) {
    let mut advisor = RotationAdvisor::new();
    let plan = RotationPlan::build(
        &mut advisor,
        &session.dataset,
        &session.config,
        session.date,
        stocking,
        top,
    );
    print_header(&format!("Plan for {stocking:.1} LU"), session);

    println!("Advisories:");
    if plan.advisories.is_empty() {
        println!("  none");
    }
    for advisory in &plan.advisories {
        println!(
            "  [{:<8}] {:<10} {}: {} ({})",
            advisory.severity.as_str(),
            advisory.paddock_id.0,
            advisory.id,
            advisory.message,
            advisory.suggested_action,
        );
    }

    println!();
    println!("Suggested destinations:");
    for (index, entry) in plan.destinations.iter().enumerate() {
        println!(
            "  {}. {:<10} {:>6.0} kg/ha  {}",
            index + 1,
            entry.paddock_id.0,
            entry.density,
            entry.classification.as_str()
        );
    }

    println!();
    println!(
        "{:<10} {:>7} {:>6} {:>6} {:>6} {:>6} {:<6}",
        "paddock", "density", "gross", "fiber", "delta", "days", "light"
    );
    for row in &plan.rows {
        println!(
            "{:<10} {:>7.0} {:>6} {:>6} {:>6} {:>6} {:<6}",
            row.paddock_id.0,
            row.density,
            fmt_opt(row.gross_days, 1),
            fmt_opt(row.fiber_days, 1),
            fmt_opt(row.waste_delta, 2),
            fmt_opt(row.planned_days, 1),
            row.light.as_str(),
        );
    }
}

// ---------------------------------------------------------------------------
// report / config
// ---------------------------------------------------------------------------

pub fn report(session: &Session, from: NaiveDate, to: NaiveDate, output_dir: &Path) -> Result<()> {
    let shared = SharedConfig::new(session.config.clone());
    let summary = run_report(&session.dataset, &shared, from, to, output_dir)?;
    println!(
        "Report {}: {} dates, {} rows",
        summary.run_id, summary.dates, summary.rows
    );
    println!("Output: {}", summary.run_dir.display());
    Ok(())
}

pub fn show_config(config: &EngineConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("serializing configuration")?;
    println!("{json}");
    Ok(())
}
