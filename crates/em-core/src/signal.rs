//! Traffic-light programs as exchanged with the simulation engine.
//!
//! A traffic light owns one or more [`Logic`]s (programs); each logic is an
//! ordered cycle of [`Phase`]s.  The values captured when a dataset is built
//! are the restoration baseline for signal retiming.

use serde::{Deserialize, Serialize};

/// One phase of a signal program.  Durations are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub duration:     f64,
    pub min_duration: f64,
    pub max_duration: f64,
    /// Per-link signal states, e.g. `"GGrrGGrr"`.
    pub state:        String,
    /// Successor phase indices (empty = next in order).
    #[serde(default)]
    pub next:         Vec<i32>,
    #[serde(default)]
    pub name:         String,
}

impl Phase {
    pub fn new(duration: f64, min_duration: f64, max_duration: f64, state: impl Into<String>) -> Self {
        Self {
            duration,
            min_duration,
            max_duration,
            state: state.into(),
            next: Vec::new(),
            name: String::new(),
        }
    }

    /// Copy with all three duration fields multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Phase {
        Phase {
            duration:     self.duration * factor,
            min_duration: self.min_duration * factor,
            max_duration: self.max_duration * factor,
            ..self.clone()
        }
    }
}

/// A complete signal program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Logic {
    pub program_id:          String,
    /// Engine-specific program type (static, actuated, ...).
    pub kind:                i32,
    pub current_phase_index: i32,
    pub phases:              Vec<Phase>,
    #[serde(default)]
    pub parameters:          Vec<(String, String)>,
}

impl Logic {
    /// Copy under a new program id with every phase scaled by `factor`.
    pub fn scaled(&self, program_id: impl Into<String>, factor: f64) -> Logic {
        Logic {
            program_id:          program_id.into(),
            kind:                self.kind,
            current_phase_index: 0,
            phases:              self.phases.iter().map(|p| p.scaled(factor)).collect(),
            parameters:          self.parameters.clone(),
        }
    }

    /// Length of one full cycle in seconds.
    pub fn cycle_secs(&self) -> f64 {
        self.phases.iter().map(|p| p.duration).sum()
    }
}
