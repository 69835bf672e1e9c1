//! Per-experiment configuration.
//!
//! One JSON file describes one experiment.  The file is parsed into an
//! [`ExperimentConfig`], then [`validate`][ExperimentConfig::validate]d:
//! values that cannot be interpreted are rejected, contradictory strategy
//! flags are normalised.
//!
//! ```json
//! {
//!   "sumo_binary": "sumo",
//!   "emissions_threshold": 500000.0,
//!   "n_steps": 200,
//!   "window_size": 100,
//!   "limit_speed": { "enabled": true, "factor": 0.5 },
//!   "adjust_traffic_lights": { "enabled": true, "factor": 0.8 },
//!   "lock_area": { "enabled": false },
//!   "weight_routing": { "enabled": false, "factor": 1.0 },
//!   "without_actions": false
//! }
//! ```

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Emission, VehicleClass};

fn default_binary() -> String {
    "sumo".to_owned()
}

fn default_factor() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

// ── Strategy sections ─────────────────────────────────────────────────────────

/// A strategy that multiplies a baseline by `factor` while active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleStrategy {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_factor")]
    pub factor:  f64,
}

impl Default for ScaleStrategy {
    fn default() -> Self {
        Self { enabled: false, factor: 1.0 }
    }
}

/// Traffic-light retiming.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalRetimeConfig {
    #[serde(default)]
    pub enabled:              bool,
    #[serde(default = "default_factor")]
    pub factor:               f64,
    /// Only retime an area while its speed limiting is active.
    #[serde(default = "default_true")]
    pub requires_speed_limit: bool,
}

impl Default for SignalRetimeConfig {
    fn default() -> Self {
        Self { enabled: false, factor: 1.0, requires_speed_limit: true }
    }
}

/// Area locking for one vehicle class.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LockAreaConfig {
    #[serde(default)]
    pub enabled:       bool,
    #[serde(default)]
    pub vehicle_class: VehicleClass,
}

/// Pollution-weighted rerouting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightRoutingConfig {
    #[serde(default)]
    pub enabled:  bool,
    /// Multiplier applied to the edge's emission total before it is set as
    /// routing effort.
    #[serde(default = "default_factor")]
    pub factor:   f64,
    /// Divide the edge's emission total by its lane count.
    #[serde(default)]
    pub per_lane: bool,
}

impl Default for WeightRoutingConfig {
    fn default() -> Self {
        Self { enabled: false, factor: 1.0, per_lane: false }
    }
}

// ── ExperimentConfig ──────────────────────────────────────────────────────────

/// Everything one experiment run needs besides the dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Taken from the file stem; not part of the JSON document.
    #[serde(skip)]
    pub name: String,

    /// Engine executable, resolved against `$SUMO_HOME/bin` when set.
    #[serde(default = "default_binary")]
    pub sumo_binary: String,

    /// Engine scenario file.  Defaults to the first `*.sumocfg` in the
    /// dump's scenario directory.
    #[serde(default)]
    pub sumo_config: Option<PathBuf>,

    /// Expected grid resolution; the dump's own value is authoritative.
    #[serde(default)]
    pub areas_number: Option<u32>,

    /// Window sum (mg) at or above which an area is mitigated.
    pub emissions_threshold: f64,

    /// Number of simulation steps to run.
    pub n_steps: u32,

    /// Capacity of each area's sliding window, in steps.
    pub window_size: usize,

    #[serde(default)]
    pub limit_speed: ScaleStrategy,

    #[serde(default)]
    pub adjust_traffic_lights: SignalRetimeConfig,

    #[serde(default)]
    pub lock_area: LockAreaConfig,

    #[serde(default)]
    pub weight_routing: WeightRoutingConfig,

    /// Reference run: every strategy is forced off.
    #[serde(default)]
    pub without_actions: bool,

    /// Totals of a reference run over the same step budget.
    #[serde(default)]
    pub reference_emissions: Option<Emission>,

    /// Draw the grid as polygons in the engine's GUI.
    #[serde(default = "default_true")]
    pub overlay: bool,
}

impl ExperimentConfig {
    /// Load and validate a configuration file.  The file stem becomes
    /// [`name`][Self::name].
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_json_str(&name, &text)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(name: &str, text: &str) -> CoreResult<Self> {
        let mut config: ExperimentConfig = serde_json::from_str(text)
            .map_err(|e| CoreError::Config(format!("{name}: {e}")))?;
        config.name = name.to_owned();
        config.validate()?;
        Ok(config)
    }

    /// Reject unusable values, normalise strategy flags, then check the
    /// factors of the strategies still enabled.
    ///
    /// Precedence: `without_actions` turns every strategy off; otherwise
    /// `weight_routing` turns the other three off.
    pub fn validate(&mut self) -> CoreResult<()> {
        if self.window_size == 0 {
            return Err(CoreError::Config(format!("{}: window_size must be at least 1", self.name)));
        }
        if !self.emissions_threshold.is_finite() || self.emissions_threshold < 0.0 {
            return Err(CoreError::Config(format!(
                "{}: emissions_threshold must be a non-negative number, got {}",
                self.name, self.emissions_threshold
            )));
        }
        if self.areas_number == Some(0) {
            return Err(CoreError::Config(format!("{}: areas_number must be at least 1", self.name)));
        }

        if self.without_actions {
            if self.any_action_enabled() {
                warn!("{}: without_actions is set, disabling every mitigation strategy", self.name);
            }
            self.limit_speed.enabled = false;
            self.adjust_traffic_lights.enabled = false;
            self.lock_area.enabled = false;
            self.weight_routing.enabled = false;
        } else if self.weight_routing.enabled {
            if self.limit_speed.enabled || self.adjust_traffic_lights.enabled || self.lock_area.enabled {
                warn!("{}: weight routing cannot be combined with other actions, disabling them", self.name);
            }
            self.limit_speed.enabled = false;
            self.adjust_traffic_lights.enabled = false;
            self.lock_area.enabled = false;
        }

        // Only strategies that survived normalisation ever use their factor.
        let factors = [
            ("limit_speed", self.limit_speed.enabled, self.limit_speed.factor),
            ("adjust_traffic_lights", self.adjust_traffic_lights.enabled, self.adjust_traffic_lights.factor),
            ("weight_routing", self.weight_routing.enabled, self.weight_routing.factor),
        ];
        for (key, enabled, factor) in factors {
            if enabled && !(factor.is_finite() && factor > 0.0) {
                return Err(CoreError::Config(format!(
                    "{}: {key}.factor must be positive, got {factor}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// `true` if at least one mitigation strategy is enabled.
    pub fn any_action_enabled(&self) -> bool {
        self.limit_speed.enabled
            || self.adjust_traffic_lights.enabled
            || self.lock_area.enabled
            || self.weight_routing.enabled
    }
}

impl std::fmt::Display for ExperimentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "step number = {}", self.n_steps)?;
        writeln!(f, "window size = {}", self.window_size)?;
        writeln!(f, "emissions threshold = {} mg", self.emissions_threshold)?;
        writeln!(f, "weight routing mode = {}", self.weight_routing.enabled)?;
        writeln!(f, "lock area mode = {}", self.lock_area.enabled)?;
        writeln!(
            f,
            "limit speed mode = {}, RF = {}%",
            self.limit_speed.enabled,
            self.limit_speed.factor * 100.0
        )?;
        write!(
            f,
            "adjust traffic light mode = {}, RF = {}%",
            self.adjust_traffic_lights.enabled,
            self.adjust_traffic_lights.factor * 100.0
        )
    }
}
