//! Unit tests for the emgrid binary.

#[cfg(test)]
mod parsing {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};

    use crate::cli::{Cli, Commands};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("emgrid").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_dump() {
        let cli = parse(&["create-dump", "base", "-s", "scen", "-a", "3"]).unwrap();
        let Commands::CreateDump { name, scenario_dir, areas, sumo_config, sumo_binary } = cli.command else {
            panic!("expected create-dump");
        };
        assert_eq!(name, "base");
        assert_eq!(scenario_dir, PathBuf::from("scen"));
        assert_eq!(areas, 3);
        assert_eq!(sumo_config, None);
        assert_eq!(sumo_binary, "sumo");
    }

    #[test]
    fn run_with_several_config_files() {
        let cli = parse(&["run", "base", "-s", "scen", "-c", "a.json", "b.json", "--csv", "-j", "2"]).unwrap();
        let Commands::Run { dump, configs, opts, .. } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(dump, "base");
        assert_eq!(configs.files, [PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(configs.config_dir, None);
        assert!(opts.csv);
        assert!(!opts.save_logs);
        assert_eq!(opts.jobs, Some(2));
    }

    #[test]
    fn run_needs_exactly_one_config_source() {
        assert!(parse(&["run", "base", "-s", "scen"]).is_err());
        assert!(parse(&["run", "base", "-s", "scen", "-c", "a.json", "--config-dir", "cfg"]).is_err());
        assert!(parse(&["run", "base", "-s", "scen", "--config-dir", "cfg", "--save-logs"]).is_ok());
    }
}

#[cfg(test)]
mod configs {
    use std::fs;

    use crate::cli::{collect_config_files, load_configs, ConfigSource};

    const VALID: &str = r#"{ "emissions_threshold": 500, "n_steps": 10, "window_size": 5 }"#;

    fn dir_source(dir: &std::path::Path) -> ConfigSource {
        ConfigSource { files: Vec::new(), config_dir: Some(dir.to_path_buf()) }
    }

    #[test]
    fn directory_contributes_sorted_json_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            fs::write(dir.path().join(name), VALID).unwrap();
        }
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let files = collect_config_files(&dir_source(dir.path())).unwrap();
        assert_eq!(files, [dir.path().join("a.json"), dir.path().join("b.json")]);

        let configs = load_configs(&dir_source(dir.path())).unwrap();
        let names: Vec<&str> = configs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_config_files(&dir_source(dir.path())).is_err());
    }

    #[test]
    fn missing_or_invalid_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, VALID).unwrap();
        fs::write(&bad, r#"{ "emissions_threshold": 500, "n_steps": 10, "window_size": 0 }"#).unwrap();

        let missing = ConfigSource { files: vec![good.clone(), dir.path().join("nope.json")], config_dir: None };
        let err = load_configs(&missing).unwrap_err();
        assert!(err.to_string().contains("not found"));

        let invalid = ConfigSource { files: vec![good, bad], config_dir: None };
        assert!(load_configs(&invalid).is_err());
    }
}

#[cfg(test)]
mod logging {
    use std::path::Path;

    use ::log::LevelFilter;

    use crate::log::{log_file_path, parse_level};

    #[test]
    fn levels() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::Info);
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::Off);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn log_file_lives_under_the_scenario() {
        assert_eq!(log_file_path(Path::new("/s"), "20240101-120000"), Path::new("/s/logs/20240101-120000.log"));
    }
}
