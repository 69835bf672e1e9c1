//! Versioned JSON dumps.
//!
//! A dump is written once to `<scenario_dir>/dump/<name>.json` and never
//! overwritten.  The file carries a `format_version` that is checked before
//! the body is parsed; every reference and baseline is validated on load.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use em_traci::{Gateway, Launcher, ScenarioSpec};

use crate::dataset::{build_dataset, Dataset};
use crate::{DatasetError, DatasetResult};

/// Current dump schema.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct DumpOut<'a> {
    format_version: u32,
    #[serde(flatten)]
    dataset: &'a Dataset,
}

#[derive(Deserialize)]
struct DumpHeader {
    format_version: u32,
}

#[derive(Deserialize)]
struct DumpIn {
    #[serde(flatten)]
    dataset: Dataset,
}

/// Canonical location of dump `name` for a scenario directory.
pub fn dump_path(scenario_dir: &Path, name: &str) -> PathBuf {
    scenario_dir.join("dump").join(format!("{name}.json"))
}

/// First `*.sumocfg` file in `dir`, by file name.
pub fn find_scenario_file(dir: &Path) -> Option<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "sumocfg"))
        .collect();
    found.sort();
    found.into_iter().next()
}

/// The engine scenario file for `scenario_dir`: `configured` when given (a
/// relative path is taken under `scenario_dir`), otherwise the first
/// `*.sumocfg` found there.
pub fn resolve_scenario_file(scenario_dir: &Path, configured: Option<&Path>) -> Option<PathBuf> {
    match configured {
        Some(path) if path.is_relative() => Some(scenario_dir.join(path)),
        Some(path) => Some(path.to_path_buf()),
        None => find_scenario_file(scenario_dir),
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> DatasetError + '_ {
    move |source| DatasetError::Io { path: path.to_path_buf(), source }
}

impl Dataset {
    /// Write to [`dump_path`] for this dataset's scenario directory.
    pub fn save(&self) -> DatasetResult<PathBuf> {
        let path = dump_path(&self.scenario_dir, &self.name);
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write to `path`, refusing to replace an existing file.
    pub fn save_to(&self, path: &Path) -> DatasetResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => DatasetError::AlreadyExists(path.to_path_buf()),
                _ => DatasetError::Io { path: path.to_path_buf(), source: e },
            })?;

        let mut out = BufWriter::new(file);
        serde_json::to_writer(&mut out, &DumpOut { format_version: FORMAT_VERSION, dataset: self })
            .map_err(|source| DatasetError::Json { path: path.to_path_buf(), source })?;
        out.flush().map_err(io_err(path))?;
        info!("dataset {:?} saved to {}", self.name, path.display());
        Ok(())
    }

    /// Read and validate a dump.
    pub fn load(path: &Path) -> DatasetResult<Dataset> {
        let text = fs::read_to_string(path).map_err(io_err(path))?;
        let json = |source| DatasetError::Json { path: path.to_path_buf(), source };

        let header: DumpHeader = serde_json::from_str(&text).map_err(json)?;
        if header.format_version != FORMAT_VERSION {
            return Err(DatasetError::UnsupportedVersion {
                path:     path.to_path_buf(),
                found:    header.format_version,
                expected: FORMAT_VERSION,
            });
        }
        let DumpIn { dataset } = serde_json::from_str(&text).map_err(json)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Check every reference and baseline.
    pub fn validate(&self) -> DatasetResult<()> {
        let bad = |msg: String| Err(DatasetError::DataIntegrity(format!("{}: {msg}", self.name)));
        let grid = &self.grid;

        if grid.resolution == 0 || !grid.bounds.is_valid() {
            return bad(format!("invalid grid {}x{} over {}", grid.resolution, grid.resolution, grid.bounds));
        }
        let n = grid.resolution as usize;
        if grid.areas.len() != n * n {
            return bad(format!("{} areas for resolution {n}", grid.areas.len()));
        }
        for (idx, lane) in self.lanes.iter().enumerate() {
            if lane.id.index() != idx {
                return bad(format!("lane {:?} stored at {idx} has id {}", lane.name, lane.id));
            }
            if !lane.initial_max_speed.is_finite() || lane.initial_max_speed < 0.0 {
                return bad(format!("lane {:?} has no usable baseline speed", lane.name));
            }
        }
        for (idx, tls) in self.traffic_lights.iter().enumerate() {
            if tls.id.index() != idx {
                return bad(format!("traffic light {:?} stored at {idx} has id {}", tls.name, tls.id));
            }
        }
        for (idx, area) in grid.areas.iter().enumerate() {
            if area.id.index() != idx {
                return bad(format!("{} stored at {idx} has id {}", area.name, area.id));
            }
            if let Some(lane) = area.lanes.iter().find(|l| l.index() >= self.lanes.len()) {
                return bad(format!("{} references missing {lane}", area.name));
            }
            if let Some(tls) = area.traffic_lights.iter().find(|t| t.index() >= self.traffic_lights.len()) {
                return bad(format!("{} references missing {tls}", area.name));
            }
        }
        Ok(())
    }
}

/// Launch a session, build the dataset, close the session and save.
///
/// Fails with [`DatasetError::AlreadyExists`] before launching anything when
/// the dump is already present.
pub fn create_dump<L: Launcher>(
    launcher:     &L,
    scenario:     &ScenarioSpec,
    name:         &str,
    scenario_dir: &Path,
    resolution:   u32,
) -> DatasetResult<PathBuf> {
    let path = dump_path(scenario_dir, name);
    if path.exists() {
        return Err(DatasetError::AlreadyExists(path));
    }

    let mut session = launcher.launch(scenario)?;
    let built = build_dataset(&mut session, name, scenario_dir.to_path_buf(), resolution);
    if let Err(e) = session.close() {
        warn!("closing session after building {name:?} failed: {e}");
    }

    built?.save_to(&path)?;
    Ok(path)
}
