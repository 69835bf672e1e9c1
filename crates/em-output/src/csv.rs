//! CSV backend: one row per step, one column per area.
//!
//! ```text
//! Step,Area (0,0),Area (0,1),...
//! 0,0.000,1523.118,...
//! ```

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use log::info;

use em_core::Emission;

use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// `<scenario_dir>/csv/<dump>_<config>_<stamp>.csv`
pub fn csv_path(scenario_dir: &Path, dump: &str, config: &str, stamp: &str) -> PathBuf {
    scenario_dir.join("csv").join(format!("{dump}_{config}_{stamp}.csv"))
}

pub struct CsvWriter {
    writer:   Writer<File>,
    path:     PathBuf,
    columns:  usize,
    finished: bool,
}

impl CsvWriter {
    /// Create the file (and its directory) and write the header row.
    pub fn create<'a, I>(path: &Path, area_names: I) -> OutputResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut writer = Writer::from_path(path)?;
        let mut header = vec!["Step"];
        header.extend(area_names);
        writer.write_record(&header)?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            columns: header.len() - 1,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputWriter for CsvWriter {
    fn write_step(&mut self, step: usize, per_area: &[Emission]) -> OutputResult<()> {
        if per_area.len() != self.columns {
            return Err(OutputError::ColumnMismatch { expected: self.columns, got: per_area.len() });
        }
        let mut record = Vec::with_capacity(per_area.len() + 1);
        record.push(step.to_string());
        record.extend(per_area.iter().map(|e| format!("{:.3}", e.total())));
        self.writer.write_record(&record)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.flush()?;
        info!("area emissions written to {}", self.path.display());
        Ok(())
    }
}
