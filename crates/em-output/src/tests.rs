//! Unit tests for em-output.

#[cfg(test)]
mod csv_writer {
    use std::fs;
    use std::path::Path;

    use em_core::Emission;

    use crate::{csv_path, CsvWriter, OutputError, OutputWriter};

    #[test]
    fn path_layout() {
        let p = csv_path(Path::new("/s"), "base", "limit", "20240101-120000");
        assert_eq!(p, Path::new("/s/csv/base_limit_20240101-120000.csv"));
    }

    #[test]
    fn header_and_three_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("csv").join("out.csv");
        let mut w = CsvWriter::create(&path, ["Area (0,0)", "Area (0,1)"]).unwrap();
        w.write_step(0, &[Emission::new(1.0, 0.5, 0.0, 0.0, 0.0), Emission::ZERO]).unwrap();
        w.write_step(1, &[Emission::new(0.0, 0.0, 0.0, 0.0, 2.0 / 3.0), Emission::new(1234.5678, 0.0, 0.0, 0.0, 0.0)])
            .unwrap();
        w.finish().unwrap();
        w.finish().unwrap(); // idempotent

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, [
            "Step,\"Area (0,0)\",\"Area (0,1)\"",
            "0,1.500,0.000",
            "1,0.667,1234.568",
        ]);
    }

    #[test]
    fn wrong_column_count_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = CsvWriter::create(&dir.path().join("x.csv"), ["a"]).unwrap();
        let err = w.write_step(0, &[Emission::ZERO, Emission::ZERO]).unwrap_err();
        assert!(matches!(err, OutputError::ColumnMismatch { expected: 1, got: 2 }));
    }
}

#[cfg(test)]
mod observer {
    use std::fs;

    use em_core::{Bounds, Emission, ExperimentConfig, Point2};
    use em_grid::build_dataset;
    use em_sim::run_experiment;
    use em_traci::{ScriptedGateway, ScriptedLauncher, ScriptedWorld, VehicleSample};

    use crate::{CsvWriter, OutputObserver};

    fn world() -> ScriptedWorld {
        let mut w = ScriptedWorld::new(Bounds::new(0.0, 0.0, 10.0, 10.0))
            .with_lane("a_0", "a", vec![Point2::new(1.0, 1.0), Point2::new(9.0, 9.0)], 10.0);
        for i in 1..=5 {
            w = w.with_step(vec![VehicleSample::new(
                "v",
                Point2::new(2.0, 2.0),
                Emission::new(i as f64, 0.0, 0.0, 0.0, 0.0),
            )]);
        }
        w
    }

    fn config() -> ExperimentConfig {
        ExperimentConfig::from_json_str(
            "c",
            r#"{ "sumo_config": "x.sumocfg", "emissions_threshold": 1e9, "n_steps": 5, "window_size": 3 }"#,
        )
        .unwrap()
    }

    #[test]
    fn rows_are_written_per_step() {
        let dir = tempfile::tempdir().unwrap();
        let ds = build_dataset(&mut ScriptedGateway::new(world()), "d", dir.path().to_path_buf(), 1).unwrap();
        let path = dir.path().join("out.csv");
        let mut obs = OutputObserver::new(CsvWriter::create(&path, ds.grid.iter().map(|a| a.name.as_str())).unwrap());

        run_experiment(&ScriptedLauncher::new(world()), &ds, &config(), &mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Step,\"Area (0,0)\"");
        assert_eq!(&lines[1..], ["0,1.000", "1,2.000", "2,3.000", "3,4.000", "4,5.000"]);
    }

    #[test]
    fn failed_run_leaves_a_readable_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let ds = build_dataset(&mut ScriptedGateway::new(world()), "d", dir.path().to_path_buf(), 1).unwrap();
        let path = dir.path().join("partial.csv");
        let mut obs = OutputObserver::new(CsvWriter::create(&path, ["Area (0,0)"]).unwrap());

        let launcher = ScriptedLauncher::new(world().failing_at_step(3));
        assert!(run_experiment(&launcher, &ds, &config(), &mut obs).is_err());

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3, "header plus two completed steps");
    }
}
