//! `OutputObserver<W>`: bridges `StepObserver` to an `OutputWriter`.

use em_core::Emission;
use em_mitigation::MitigationEngine;
use em_sim::{ExperimentReport, StepObserver};

use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`StepObserver`] that writes every step to `W`.
///
/// Writing stops at the first error, which is kept for
/// [`take_error`][Self::take_error].  The writer is finished in
/// `on_finish`, which also runs when the experiment failed part way.
pub struct OutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> OutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any) after the run.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> StepObserver for OutputObserver<W> {
    fn on_step(&mut self, step: usize, per_area: &[Emission], _engine: &MitigationEngine) {
        if self.last_error.is_some() {
            return;
        }
        let result = self.writer.write_step(step, per_area);
        self.store_err(result);
    }

    fn on_finish(&mut self, _report: &ExperimentReport) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
