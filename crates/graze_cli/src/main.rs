use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use graze_core::{Dataset, DensitySource, EngineConfig, Mode};
use graze_world::{apply_overrides, load_dataset, parse_override, resolve_config, UserConfig};
use tracing_subscriber::EnvFilter;

mod commands;
mod report;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "graze", about = "Paddock readiness ranking and forage supply")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Directory holding paddocks.json, biomass.json, moves.json and the optional files.
    #[arg(long, global = true, default_value = "./content/demo")]
    data_dir: PathBuf,
    /// Factory defaults file.
    #[arg(long, global = true, default_value = "./content/defaults.json")]
    defaults: PathBuf,
    /// Persisted user configuration.
    #[arg(long, global = true, default_value = "./graze_user.json")]
    user_config: PathBuf,
    /// Active mode: balanced, gain or ethical.
    #[arg(long, global = true)]
    mode: Option<Mode>,
    /// Preferred density field: smoothed or raw.
    #[arg(long, global = true)]
    source: Option<DensitySource>,
    /// Override a parameter, weight or scalar for this invocation (repeatable).
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    set: Vec<String>,
    /// Query date, YYYY-MM-DD. Defaults to the last date in the data.
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank paddocks for grazing.
    Rank {
        /// Print the ranking as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Gross and waste-adjusted day-supply for one paddock.
    Days {
        #[arg(long)]
        paddock: String,
        /// Hypothetical herd in livestock units instead of the inferred one.
        #[arg(long)]
        stocking: Option<f64>,
    },
    /// Projected density of one paddock and where it sits against the target band.
    Project {
        #[arg(long)]
        paddock: String,
    },
    /// Farm-wide indicators, or one paddock's.
    Kpis {
        #[arg(long)]
        paddock: Option<String>,
    },
    /// Advisories, suggested destinations and a day plan for a hypothetical herd.
    Plan {
        #[arg(long)]
        stocking: f64,
        #[arg(long, default_value_t = graze_control::DEFAULT_SUGGESTIONS)]
        top: usize,
    },
    /// Rankings for every date in a range, written to a run directory.
    Report {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long, default_value = "runs")]
        output_dir: PathBuf,
    },
    /// Inspect or persist the configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration.
    Show,
    /// Copy the persisted user configuration to a file.
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Replace the persisted user configuration with a file's contents.
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete the persisted user configuration.
    Reset,
    /// Persist the effective configuration, including --mode, --source and --set.
    Save {
        /// Store parameters under the active mode only.
        #[arg(long)]
        sticky: bool,
    },
}

// ---------------------------------------------------------------------------
// Session setup
// ---------------------------------------------------------------------------

/// Configuration as resolved for this invocation.
struct Settings {
    config: EngineConfig,
    user: UserConfig,
}

impl Settings {
    /// Defaults, then the user file, then command-line flags.
    fn resolve(args: &GlobalArgs) -> Result<Self> {
        let resolved = resolve_config(&args.defaults, &args.user_config);
        if !resolved.warnings.is_empty() {
            tracing::debug!(count = resolved.warnings.len(), "configuration resolved with warnings");
        }
        let mut config = resolved.config;
        if let Some(mode) = args.mode {
            config.mode = mode;
        }
        if let Some(source) = args.source {
            config.source = source;
        }
        let overrides = args
            .set
            .iter()
            .map(|pair| parse_override(pair))
            .collect::<Result<HashMap<_, _>>>()?;
        apply_overrides(&mut config, &overrides)?;
        Ok(Self {
            config,
            user: resolved.user,
        })
    }

    /// Merges the effective configuration into the loaded user file and writes it.
    fn save(&mut self, user_path: &Path, sticky: bool) -> Result<()> {
        self.user.record(&self.config, sticky);
        graze_world::export_user_config(&self.user, user_path)
    }
}

/// Data plus configuration plus the query date.
struct Session {
    dataset: Dataset,
    config: EngineConfig,
    date: NaiveDate,
}

impl Session {
    fn open(args: &GlobalArgs) -> Result<Self> {
        let Settings { config, .. } = Settings::resolve(args)?;
        let loaded = load_dataset(&args.data_dir)?;
        let date = match args.date {
            Some(date) => date,
            None => loaded
                .dataset
                .horizon()
                .context("the dataset has no biomass or move records; pass --date")?,
        };
        tracing::debug!(%date, mode = %config.mode, "session opened");
        Ok(Self {
            dataset: loaded.dataset,
            config,
            date,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let global = &cli.global;
    match cli.command {
        Commands::Rank { json } => commands::rank(&Session::open(global)?, json)?,
        Commands::Days { paddock, stocking } => {
            commands::days(&Session::open(global)?, &paddock, stocking)?;
        }
        Commands::Project { paddock } => commands::project(&Session::open(global)?, &paddock)?,
        Commands::Kpis { paddock } => commands::kpis(&Session::open(global)?, paddock.as_deref())?,
        Commands::Plan { stocking, top } => commands::plan(&Session::open(global)?, stocking, top),
        Commands::Report {
            from,
            to,
            output_dir,
        } => commands::report(&Session::open(global)?, from, to, &output_dir)?,
        Commands::Config(command) => run_config(global, command)?,
    }
    Ok(())
}

fn run_config(global: &GlobalArgs, command: ConfigCommand) -> Result<()> {
    let mut settings = Settings::resolve(global)?;
    let user_path = &global.user_config;
    match command {
        ConfigCommand::Show => commands::show_config(&settings.config)?,
        ConfigCommand::Export { out } => {
            graze_world::export_user_config(&settings.user, &out)?;
            println!("User configuration exported to {}", out.display());
        }
        ConfigCommand::Import { file } => {
            let imported = graze_world::import_user_config(&file)?;
            graze_world::export_user_config(&imported, user_path)?;
            println!("Imported {} into {}", file.display(), user_path.display());
        }
        ConfigCommand::Reset => {
            if graze_world::reset_user_config(user_path)? {
                println!("Removed {}", user_path.display());
            } else {
                println!("No user configuration at {}", user_path.display());
            }
        }
        ConfigCommand::Save { sticky } => {
            settings.save(user_path, sticky)?;
            println!(
                "Saved mode '{}' ({}) to {}",
                settings.config.mode,
                if sticky { "sticky" } else { "global" },
                user_path.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("graze").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["rank", "--json", "--mode", "gain", "--date", "2025-03-01"]);
        assert_eq!(cli.global.mode, Some(Mode::Gain));
        assert_eq!(cli.global.date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert!(matches!(cli.command, Commands::Rank { json: true }));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let args = ["graze", "rank", "--mode", "fastest"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_settings_layer_flags_over_files() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.json");
        let defaults = dir.path().join("missing_defaults.json");
        let cli = parse(&[
            "config",
            "show",
            "--defaults",
            defaults.to_str().unwrap(),
            "--user-config",
            user.to_str().unwrap(),
            "--mode",
            "ethical",
            "--source",
            "raw",
            "--set",
            "entry_min=2650",
            "--set",
            "utilization_pct=55",
        ]);
        let settings = Settings::resolve(&cli.global).unwrap();
        assert_eq!(settings.config.mode, Mode::Ethical);
        assert_eq!(settings.config.source, DensitySource::Raw);
        assert!((settings.config.params().entry_min - 2650.0).abs() < f64::EPSILON);
        assert!((settings.config.utilization_pct - 55.0).abs() < f64::EPSILON);
        assert_eq!(settings.user, UserConfig::default());
    }

    #[test]
    fn test_sticky_saves_in_two_modes_keep_both() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.json");
        let defaults = dir.path().join("missing_defaults.json");
        let (user_arg, defaults_arg) = (user.to_str().unwrap(), defaults.to_str().unwrap());
        let save = |extra: &[&str]| {
            let mut args = vec!["config", "save", "--sticky", "--user-config", user_arg];
            args.extend_from_slice(&["--defaults", defaults_arg]);
            args.extend_from_slice(extra);
            let cli = parse(&args);
            Settings::resolve(&cli.global)
                .unwrap()
                .save(&cli.global.user_config, true)
                .unwrap();
        };
        save(&["--mode", "balanced", "--set", "entry_min=2500"]);
        save(&["--mode", "gain"]);

        let cli = parse(&["config", "show", "--user-config", user_arg, "--defaults", defaults_arg]);
        let config = Settings::resolve(&cli.global).unwrap().config;
        assert_eq!(config.mode, Mode::Gain);
        let balanced = &config.profiles.get(Mode::Balanced).params;
        assert!((balanced.entry_min - 2500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bad_override_fails_resolution() {
        let cli = parse(&["rank", "--set", "no_such_key=1", "--defaults", "/nonexistent/d.json"]);
        assert!(Settings::resolve(&cli.global).is_err());
    }
}
