//! Command-line interface: `create-dump` and `run`.

use std::fs;
use std::path::{Path, PathBuf};

use ::log::{info, warn};
use anyhow::{bail, ensure, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};

use em_core::ExperimentConfig;
use em_grid::{create_dump, dump_path, resolve_scenario_file, Dataset};
use em_output::{csv_path, CsvWriter, OutputObserver};
use em_sim::{run_experiment, run_units, ExperimentReport, ExperimentResult, NoopObserver, UnitOutcome};
use em_traci::{ScenarioSpec, SumoLauncher};

use crate::log;

/// Grid-based emission mitigation experiments on SUMO.
#[derive(Parser, Debug)]
#[command(name = "emgrid", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a scenario's network into areas and save the dataset dump.
    CreateDump {
        /// Dump name; the file is `<scenario-dir>/dump/<name>.json`.
        name: String,
        /// Scenario directory.
        #[arg(short, long)]
        scenario_dir: PathBuf,
        /// Grid resolution: the network is split into N×N areas.
        #[arg(short, long)]
        areas: u32,
        /// Scenario file, relative to the scenario directory; defaults to the
        /// first `*.sumocfg` there.
        #[arg(long)]
        sumo_config: Option<PathBuf>,
        #[arg(long, default_value = "sumo")]
        sumo_binary: String,
    },
    /// Run experiment configurations against a dump, one session each.
    Run {
        /// Name of a dump created with `create-dump`.
        dump: String,
        /// Scenario directory the dump was created in.
        #[arg(short, long)]
        scenario_dir: PathBuf,
        #[command(flatten)]
        configs: ConfigSource,
        #[command(flatten)]
        opts: RunOpts,
    },
}

/// Where the experiment configurations come from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct ConfigSource {
    /// Configuration file(s).
    #[arg(short = 'c', long = "config", num_args = 1..)]
    pub files: Vec<PathBuf>,
    /// Directory whose `*.json` files are all run.
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunOpts {
    /// Also write the log to `<scenario-dir>/logs/<timestamp>.log`.
    #[arg(long)]
    pub save_logs: bool,
    /// Export per-step area emissions to `<scenario-dir>/csv/`.
    #[arg(long)]
    pub csv: bool,
    /// Maximum number of configurations running at once (default: all).
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl Commands {
    fn execute(self) -> Result<()> {
        match self {
            Self::CreateDump { name, scenario_dir, areas, sumo_config, sumo_binary } => {
                handle_create_dump(&name, &scenario_dir, areas, sumo_config, sumo_binary)
            }
            Self::Run { dump, scenario_dir, configs, opts } => handle_run(&dump, &scenario_dir, &configs, &opts),
        }
    }
}

pub fn run_cli() -> Result<()> {
    Cli::parse().command.execute()
}

// ── create-dump ───────────────────────────────────────────────────────────────

fn handle_create_dump(
    name:         &str,
    scenario_dir: &Path,
    areas:        u32,
    sumo_config:  Option<PathBuf>,
    sumo_binary:  String,
) -> Result<()> {
    log::init(None).context("Failed to initialise logging.")?;

    let config_file = resolve_scenario_file(scenario_dir, sumo_config.as_deref())
        .with_context(|| format!("No *.sumocfg file in {}", scenario_dir.display()))?;
    ensure!(config_file.is_file(), "Scenario file not found: {}", config_file.display());
    info!("Building dump {name:?} from {} with {areas}x{areas} areas", config_file.display());

    let scenario = ScenarioSpec { binary: sumo_binary, config_file };
    let path = create_dump(&SumoLauncher::new(), &scenario, name, scenario_dir, areas)
        .with_context(|| format!("Failed to create dump {name:?}."))?;
    info!("Dump written to {}", path.display());
    Ok(())
}

// ── run ───────────────────────────────────────────────────────────────────────

fn handle_run(dump: &str, scenario_dir: &Path, source: &ConfigSource, opts: &RunOpts) -> Result<()> {
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let log_file = opts.save_logs.then(|| log::log_file_path(scenario_dir, &stamp));
    log::init(log_file.as_deref()).context("Failed to initialise logging.")?;
    if let Some(path) = &log_file {
        info!("Logging to {}", path.display());
    }

    let dump_file = dump_path(scenario_dir, dump);
    ensure!(dump_file.is_file(), "Dump {dump:?} not found at {}", dump_file.display());
    let dataset = Dataset::load(&dump_file).with_context(|| format!("Failed to load dump {dump:?}."))?;
    info!(
        "Dump {dump:?}: {} areas, {} lanes, {} traffic lights",
        dataset.area_count(),
        dataset.lanes.len(),
        dataset.traffic_lights.len()
    );
    drop(dataset);

    let configs = load_configs(source)?;
    let launcher = SumoLauncher::new();

    let outcomes = run_units(&configs, opts.jobs, |config| {
        let dataset = Dataset::load(&dump_file)?;
        if opts.csv {
            let path = csv_path(scenario_dir, dump, &config.name, &stamp);
            run_with_csv(&launcher, &dataset, config, &path)
        } else {
            run_experiment(&launcher, &dataset, config, &mut NoopObserver)
        }
    })?;

    summarise(&outcomes)
}

/// Run one configuration with CSV export.  Export problems are logged and
/// never fail the experiment itself.
fn run_with_csv(
    launcher: &SumoLauncher,
    dataset:  &Dataset,
    config:   &ExperimentConfig,
    path:     &Path,
) -> ExperimentResult<ExperimentReport> {
    let names = dataset.grid.iter().map(|a| a.name.as_str());
    let writer = match CsvWriter::create(path, names) {
        Ok(writer) => writer,
        Err(e) => {
            warn!("{}: CSV export disabled, cannot create {}: {e}", config.name, path.display());
            return run_experiment(launcher, dataset, config, &mut NoopObserver);
        }
    };

    let mut observer = OutputObserver::new(writer);
    let result = run_experiment(launcher, dataset, config, &mut observer);
    if let Some(e) = observer.take_error() {
        warn!("{}: CSV export incomplete ({}): {e}", config.name, path.display());
    }
    result
}

fn summarise(outcomes: &[UnitOutcome]) -> Result<()> {
    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.is_ok())
        .map(|o| o.config_name.as_str())
        .collect();
    if !failed.is_empty() {
        bail!("{} of {} configuration(s) failed: {}", failed.len(), outcomes.len(), failed.join(", "));
    }
    info!("All {} configuration(s) completed", outcomes.len());
    Ok(())
}

// ── Configurations ────────────────────────────────────────────────────────────

/// The configuration files to run, in order.  A directory contributes its
/// `*.json` files sorted by name.
pub fn collect_config_files(source: &ConfigSource) -> Result<Vec<PathBuf>> {
    let Some(dir) = &source.config_dir else {
        return Ok(source.files.clone());
    };

    let entries =
        fs::read_dir(dir).with_context(|| format!("Cannot read configuration directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    ensure!(!files.is_empty(), "No *.json configuration files in {}", dir.display());
    Ok(files)
}

/// Load every configuration; any missing or invalid file is fatal.
pub fn load_configs(source: &ConfigSource) -> Result<Vec<ExperimentConfig>> {
    collect_config_files(source)?
        .iter()
        .map(|path| {
            ensure!(path.is_file(), "Configuration file not found: {}", path.display());
            ExperimentConfig::load(path).with_context(|| format!("Failed to load configuration {}", path.display()))
        })
        .collect()
}
