//! One experiment: a private session, the step loop, and the report.

use std::time::Instant;

use log::{debug, error, info, warn};

use em_core::ExperimentConfig;
use em_grid::{resolve_scenario_file, Dataset};
use em_mitigation::MitigationEngine;
use em_traci::{Gateway, GatewayResult, Launcher, ScenarioSpec};

use crate::aggregator::{aggregate, snapshot_vehicles};
use crate::{ExperimentError, ExperimentReport, ExperimentResult, StepObserver};

/// Steps between progress messages.
const PROGRESS_INTERVAL: usize = 100;

// ── Session guard ─────────────────────────────────────────────────────────────

/// Owns a gateway and closes it when dropped, whatever the exit path.
pub struct Session<G: Gateway> {
    gateway: G,
    label:   String,
}

impl<G: Gateway> Session<G> {
    pub fn new(gateway: G, label: &str) -> Self {
        Self { gateway, label: label.to_string() }
    }

    pub fn gateway(&mut self) -> &mut G {
        &mut self.gateway
    }

    /// Close now and report the outcome.
    pub fn close(mut self) -> GatewayResult<()> {
        self.gateway.close()
    }
}

impl<G: Gateway> Drop for Session<G> {
    fn drop(&mut self) {
        // No-op after an explicit close.
        if let Err(e) = self.gateway.close() {
            warn!("{}: closing simulation session failed: {e}", self.label);
        }
    }
}

// ── Scenario ──────────────────────────────────────────────────────────────────

/// Engine binary and scenario file for `config` run against `dataset`.
///
/// A relative `sumo_config` is taken relative to the scenario directory;
/// without one, the first `*.sumocfg` found there is used.
pub fn scenario_spec(config: &ExperimentConfig, dataset: &Dataset) -> ExperimentResult<ScenarioSpec> {
    let config_file = resolve_scenario_file(&dataset.scenario_dir, config.sumo_config.as_deref()).ok_or_else(|| {
        ExperimentError::Config(format!(
            "{}: no *.sumocfg file in {}",
            config.name,
            dataset.scenario_dir.display()
        ))
    })?;
    Ok(ScenarioSpec { binary: config.sumo_binary.clone(), config_file })
}

// ── Run ───────────────────────────────────────────────────────────────────────

/// Run `config` against `dataset` in a fresh session from `launcher`.
///
/// On a failed step the observer still receives `on_finish` with the
/// partial report, the partial totals are logged, the session is closed and
/// the error is returned.
pub fn run_experiment<L, O>(
    launcher: &L,
    dataset:  &Dataset,
    config:   &ExperimentConfig,
    observer: &mut O,
) -> ExperimentResult<ExperimentReport>
where
    L: Launcher,
    O: StepObserver + ?Sized,
{
    let label = config.name.as_str();
    if let Some(n) = config.areas_number {
        if n != dataset.grid.resolution {
            warn!(
                "{label}: areas_number {n} differs from dump {:?} ({}); using the dump",
                dataset.name, dataset.grid.resolution
            );
        }
    }

    let spec = scenario_spec(config, dataset)?;
    let started = Instant::now();
    let mut session = Session::new(launcher.launch(&spec)?, label);
    let mut engine = MitigationEngine::new(config, dataset);
    let mut outside = 0u64;

    info!(
        "{label}: {} steps on dump {:?} ({} areas, threshold {} mg, window {})",
        config.n_steps,
        dataset.name,
        dataset.area_count(),
        config.emissions_threshold,
        config.window_size
    );
    debug!("{label}: configuration\n{config}");
    observer.on_start(config, dataset);

    let outcome = drive(session.gateway(), dataset, config, &mut engine, observer, &mut outside);

    let report = ExperimentReport::new(config, dataset, &engine, outside, started.elapsed());
    observer.on_finish(&report);
    if let Err(e) = session.close() {
        warn!("{label}: closing simulation session failed: {e}");
    }

    match outcome {
        Ok(()) => {
            report.log_summary();
            Ok(report)
        }
        Err(e) => {
            error!("{label}: failed after {} steps: {e}", report.steps_completed);
            report.log_summary();
            Err(e)
        }
    }
}

fn drive<G, O>(
    gw:       &mut G,
    dataset:  &Dataset,
    config:   &ExperimentConfig,
    engine:   &mut MitigationEngine,
    observer: &mut O,
    outside:  &mut u64,
) -> ExperimentResult<()>
where
    G: Gateway,
    O: StepObserver + ?Sized,
{
    engine.install_overlay(gw, dataset)?;

    for step in 0..config.n_steps as usize {
        gw.step()?;
        let vehicles = snapshot_vehicles(gw)?;
        let agg = aggregate(&dataset.grid, &vehicles);
        *outside += agg.outside as u64;

        let ids: Vec<String> = vehicles.into_iter().map(|v| v.id).collect();
        engine.step(gw, dataset, &agg.per_area, &ids)?;
        observer.on_step(step, &agg.per_area, engine);

        if (step + 1) % PROGRESS_INTERVAL == 0 {
            let inside: u32 = agg.counts.iter().sum();
            debug!(
                "{}: step {}/{} ({} vehicles, {inside} inside the grid)",
                config.name,
                step + 1,
                config.n_steps,
                ids.len()
            );
        }
    }
    Ok(())
}
