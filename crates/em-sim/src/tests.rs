//! Unit tests for em-sim.

#[cfg(test)]
mod helpers {
    use std::path::Path;

    use em_core::{Bounds, Emission, ExperimentConfig, Point2};
    use em_grid::{build_dataset, Dataset};
    use em_traci::{ScriptedGateway, ScriptedWorld, VehicleSample};

    /// Area (1,1) of the 2×2 grid.
    pub const HOT: usize = 3;

    /// CO2 emitted by the single car each step; it sits in area (1,1).
    pub const SCRIPT: [f64; 6] = [50.0, 80.0, 200.0, 10.0, 0.0, 300.0];

    pub fn co2(v: f64) -> Emission {
        Emission::new(v, 0.0, 0.0, 0.0, 0.0)
    }

    pub fn world() -> ScriptedWorld {
        let mut w = ScriptedWorld::new(Bounds::new(0.0, 0.0, 100.0, 100.0))
            .with_lane("h_0", "h", vec![Point2::new(10.0, 25.0), Point2::new(90.0, 25.0)], 13.89)
            .with_lane("v_0", "v", vec![Point2::new(75.0, 60.0), Point2::new(75.0, 90.0)], 13.89);
        for v in SCRIPT {
            w = w.with_step(vec![
                VehicleSample::new("car", Point2::new(75.0, 70.0), co2(v)),
                VehicleSample::new("far", Point2::new(500.0, 500.0), co2(1000.0)),
            ]);
        }
        w
    }

    pub fn dataset(dir: &Path) -> Dataset {
        let mut gw = ScriptedGateway::new(world());
        build_dataset(&mut gw, "base", dir.to_path_buf(), 2).unwrap()
    }

    pub fn config(name: &str, threshold: f64) -> ExperimentConfig {
        let text = format!(
            r#"{{
                "sumo_config": "x.sumocfg",
                "emissions_threshold": {threshold},
                "n_steps": 6,
                "window_size": 2,
                "limit_speed": {{ "enabled": true, "factor": 0.5 }}
            }}"#
        );
        ExperimentConfig::from_json_str(name, &text).unwrap()
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod aggregation {
    use em_core::{Bounds, Emission, Point2};
    use em_grid::build_grid;
    use em_traci::{Gateway, ScriptedGateway};

    use super::helpers::{co2, world};
    use crate::{aggregate, snapshot_vehicles, Vehicle};

    fn vehicle(id: &str, x: f64, y: f64, e: f64) -> Vehicle {
        Vehicle { id: id.into(), position: Point2::new(x, y), emission: co2(e) }
    }

    #[test]
    fn every_vehicle_is_counted_once() {
        let grid = build_grid(Bounds::new(0.0, 0.0, 100.0, 100.0), 2).unwrap();
        let vehicles = vec![
            vehicle("a", 10.0, 10.0, 1.0),
            vehicle("b", 50.0, 50.0, 2.0),  // shared corner
            vehicle("c", 100.0, 0.0, 4.0),  // outer edge
            vehicle("d", 49.99, 99.0, 8.0),
            vehicle("e", -1.0, 10.0, 16.0), // outside
            vehicle("f", 75.0, 75.0, 32.0),
        ];
        let agg = aggregate(&grid, &vehicles);

        let counted: u32 = agg.counts.iter().sum();
        assert_eq!(counted as usize + agg.outside, vehicles.len());
        assert_eq!(agg.outside, 1);

        let inside: Emission = agg.per_area.iter().sum();
        assert_eq!(inside.co2, 1.0 + 2.0 + 4.0 + 8.0 + 32.0);

        assert_eq!(agg.counts, vec![1, 1, 1, 2]);
        assert_eq!(agg.per_area[3].co2, 34.0);
    }

    #[test]
    fn snapshot_reads_position_and_emission() {
        let mut gw = ScriptedGateway::new(world());
        gw.step().unwrap();
        let vehicles = snapshot_vehicles(&mut gw).unwrap();
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0].id, "car");
        assert_eq!(vehicles[0].position, Point2::new(75.0, 70.0));
        assert_eq!(vehicles[0].emission.co2, 50.0);
    }
}

// ── Reductions ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod report {
    use em_core::Emission;

    use crate::{reduction_percentage, Reductions};

    #[test]
    fn twenty_percent() {
        assert_eq!(reduction_percentage(100_000.0, 80_000.0), Some(20.0));
    }

    #[test]
    fn increase_is_negative() {
        assert_eq!(reduction_percentage(100.0, 150.0), Some(-50.0));
    }

    #[test]
    fn zero_reference_is_undefined() {
        assert_eq!(reduction_percentage(0.0, 10.0), None);
    }

    #[test]
    fn per_pollutant() {
        let reference = Emission::new(100.0, 0.0, 10.0, 10.0, 80.0);
        let observed = Emission::new(50.0, 0.0, 10.0, 5.0, 80.0);
        let r = Reductions::between(&reference, &observed);
        assert_eq!(r.co2, Some(50.0));
        assert_eq!(r.co, None);
        assert_eq!(r.nox, Some(0.0));
        assert_eq!(r.hc, Some(50.0));
        assert_eq!(r.overall, Some(25.0));
    }
}

// ── Single experiment ─────────────────────────────────────────────────────────

#[cfg(test)]
mod experiment {
    use em_core::{Emission, ExperimentConfig};
    use em_grid::Dataset;
    use em_mitigation::MitigationEngine;
    use em_traci::ScriptedLauncher;

    use super::helpers::{config, dataset, world, HOT, SCRIPT};
    use crate::{run_experiment, scenario_spec, ExperimentError, ExperimentReport, StepObserver};

    #[derive(Default)]
    struct Recorder {
        started:  bool,
        steps:    Vec<f64>,
        finished: Vec<usize>,
    }

    impl StepObserver for Recorder {
        fn on_start(&mut self, _config: &ExperimentConfig, _dataset: &Dataset) {
            self.started = true;
        }
        fn on_step(&mut self, _step: usize, per_area: &[Emission], _engine: &MitigationEngine) {
            self.steps.push(per_area[HOT].co2);
        }
        fn on_finish(&mut self, report: &ExperimentReport) {
            self.finished.push(report.steps_completed);
        }
    }

    #[test]
    fn full_run_reports_totals_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(dir.path());
        let launcher = ScriptedLauncher::new(world());
        let mut cfg = config("a", 100.0);
        cfg.reference_emissions = Some(Emission::new(1280.0, 0.0, 0.0, 0.0, 0.0));
        let mut rec = Recorder::default();

        let report = run_experiment(&launcher, &ds, &cfg, &mut rec).unwrap();

        assert!(rec.started);
        assert_eq!(rec.steps, SCRIPT);
        assert_eq!(rec.finished, vec![6]);
        assert_eq!(report.steps_completed, 6);
        assert_eq!(report.total.co2, 640.0);
        assert_eq!(report.area_totals[HOT].name, "Area (1,1)");
        assert_eq!(report.vehicles_outside, 6);
        assert_eq!(report.reductions.as_ref().and_then(|r| r.co2), Some(50.0));
        assert!(report.counters.speed_limit >= 1);

        let session = &launcher.sessions()[0];
        let w = session.lock().unwrap();
        assert!(w.closed);
        assert_eq!(w.close_calls, 1);
        assert_eq!(w.polygons.len(), 4);
    }

    #[test]
    fn failure_mid_run_closes_session_and_flushes_partial_totals() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(dir.path());
        let launcher = ScriptedLauncher::new(world().failing_at_step(4));
        let mut rec = Recorder::default();

        let err = run_experiment(&launcher, &ds, &config("a", 100.0), &mut rec).unwrap_err();
        assert!(matches!(err, ExperimentError::Gateway(_)));
        assert_eq!(rec.finished, vec![3]);
        assert_eq!(rec.steps.len(), 3);
        assert!(launcher.sessions()[0].lock().unwrap().closed);
    }

    #[test]
    fn relative_scenario_file_is_under_scenario_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(dir.path());
        let spec = scenario_spec(&config("a", 1.0), &ds).unwrap();
        assert_eq!(spec.config_file, dir.path().join("x.sumocfg"));
        assert_eq!(spec.binary, "sumo");
    }

    #[test]
    fn missing_scenario_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let ds = dataset(dir.path());
        let mut cfg = config("a", 1.0);
        cfg.sumo_config = None;
        assert!(matches!(scenario_spec(&cfg, &ds), Err(ExperimentError::Config(_))));

        std::fs::write(dir.path().join("run.sumocfg"), "").unwrap();
        assert_eq!(scenario_spec(&cfg, &ds).unwrap().config_file, dir.path().join("run.sumocfg"));
    }
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod orchestrator {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use em_core::{Emission, ExperimentConfig};
    use em_grid::Dataset;
    use em_mitigation::MitigationEngine;
    use em_traci::ScriptedLauncher;

    use super::helpers::{config, dataset, world, HOT};
    use crate::{run_dump, run_experiment, run_units, ExperimentError, StepObserver};

    /// Records the hot area's threshold state after every step.
    #[derive(Default)]
    struct Flags(Vec<bool>);

    impl StepObserver for Flags {
        fn on_step(&mut self, _step: usize, _per_area: &[Emission], engine: &MitigationEngine) {
            self.0.push(engine.states()[HOT].over_threshold);
        }
    }

    fn histories(dump: &std::path::Path, configs: &[ExperimentConfig], jobs: usize) -> HashMap<String, Vec<bool>> {
        let launcher = ScriptedLauncher::new(world());
        let seen = Mutex::new(HashMap::new());
        let outcomes = run_units(configs, Some(jobs), |cfg| {
            let ds = Dataset::load(dump)?;
            let mut flags = Flags::default();
            let report = run_experiment(&launcher, &ds, cfg, &mut flags)?;
            seen.lock().unwrap().insert(cfg.name.clone(), flags.0);
            Ok(report)
        })
        .unwrap();
        assert!(outcomes.iter().all(|o| o.is_ok()));
        assert!(launcher.sessions().iter().all(|s| s.lock().unwrap().closed));
        seen.into_inner().unwrap()
    }

    #[test]
    fn concurrent_units_do_not_interfere() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dataset(dir.path()).save().unwrap();
        let configs = vec![config("low", 100.0), config("high", 250.0)];

        let together = histories(&dump, &configs, 2);
        // window 2 over [50, 80, 200, 10, 0, 300]: sums 50, 130, 280, 210, 10, 300
        assert_eq!(together["low"], [false, true, true, true, false, true]);
        assert_eq!(together["high"], [false, false, true, false, false, true]);

        let alone_low = histories(&dump, &configs[..1], 1);
        let alone_high = histories(&dump, &configs[1..], 1);
        assert_eq!(together["low"], alone_low["low"]);
        assert_eq!(together["high"], alone_high["high"]);
    }

    #[test]
    fn a_failing_unit_does_not_stop_its_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dataset(dir.path()).save().unwrap();
        let mut broken = config("broken", 100.0);
        broken.sumo_config = None;
        let configs = vec![config("ok", 100.0), broken];

        let launcher = ScriptedLauncher::new(world());
        let outcomes = run_dump(&launcher, &dump, &configs, None).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].config_name, "ok");
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1].result, Err(ExperimentError::Config(_))));
    }

    #[test]
    fn a_panicking_unit_does_not_lose_its_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dataset(dir.path()).save().unwrap();
        let configs = vec![config("ok", 100.0), config("bad", 100.0)];
        let launcher = ScriptedLauncher::new(world());

        let outcomes = run_units(&configs, Some(2), |cfg| {
            if cfg.name == "bad" {
                panic!("engine adapter crashed");
            }
            let ds = Dataset::load(&dump)?;
            run_experiment(&launcher, &ds, cfg, &mut crate::NoopObserver)
        })
        .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[0].result.as_ref().unwrap().steps_completed, 6);
        assert!(
            matches!(&outcomes[1].result, Err(ExperimentError::Panicked(m)) if m.contains("engine adapter crashed")),
            "{:?}",
            outcomes[1].result
        );
    }

    #[test]
    fn missing_dump_fails_every_unit() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = ScriptedLauncher::new(world());
        let outcomes = run_dump(&launcher, &dir.path().join("none.json"), &[config("a", 1.0)], Some(4)).unwrap();
        assert!(matches!(outcomes[0].result, Err(ExperimentError::Dataset(_))));
        assert!(launcher.sessions().is_empty());
    }

    #[test]
    fn no_configs_no_work() {
        let outcomes = run_units(&[], None, |_| unreachable!()).unwrap();
        assert!(outcomes.is_empty());
    }
}
