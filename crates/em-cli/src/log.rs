//! Logger setup: `fern` dispatch to the terminal, optionally mirrored to a
//! plain-text file.
//!
//! The level comes from `EMGRID_LOG_LEVEL` (`off`, `error`, `warn`, `info`,
//! `debug`, `trace`), defaulting to `info`.  Warnings and errors go to
//! stderr, everything else to stdout.

use std::env;
use std::fmt::{Arguments, Display};
use std::fs::{self, OpenOptions};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};

const LOG_LEVEL_VAR: &str = "EMGRID_LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "info";

/// `<scenario_dir>/logs/<stamp>.log`
pub fn log_file_path(scenario_dir: &Path, stamp: &str) -> PathBuf {
    scenario_dir.join("logs").join(format!("{stamp}.log"))
}

pub fn parse_level(level: &str) -> Result<LevelFilter> {
    Ok(match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    })
}

/// Install the global logger.  When `log_file` is given, its directory is
/// created and every message at the chosen level is also written there
/// without colours.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let level = env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_owned());
    let level = parse_level(&level).with_context(|| format!("Invalid {LOG_LEVEL_VAR}"))?;

    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let colour_stdout = std::io::stdout().is_terminal();
    let colour_stderr = std::io::stderr().is_terminal();

    let mut dispatch = Dispatch::new()
        .level(level)
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() > LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, colour_stdout, &colours);
                })
                .chain(std::io::stdout()),
        )
        .chain(
            Dispatch::new()
                .filter(|metadata| metadata.level() <= LevelFilter::Warn)
                .format(move |out, message, record| {
                    write_log_colour(out, message, record, colour_stderr, &colours);
                })
                .chain(std::io::stderr()),
        );

    if let Some(path) = log_file {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        dispatch = dispatch.chain(Dispatch::new().format(write_log_plain).chain(file));
    }

    dispatch.apply().context("Logger already initialised")?;
    Ok(())
}

fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");
    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}
