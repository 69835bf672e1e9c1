//! `MitigationEngine`: per-area state machine driven once per step.

use log::{debug, info};
use serde::Serialize;

use em_core::{AreaId, Emission, ExperimentConfig};
use em_grid::Dataset;
use em_traci::{Color, Gateway};

use crate::action::{plan, Action};
use crate::{strategies, AreaState, MitigationError, MitigationResult};

/// Overlay colour of an area below the threshold.
pub const OVERLAY_CALM: Color = Color::rgb(0, 160, 0);
/// Overlay colour of an area at or above the threshold.
pub const OVERLAY_HOT: Color = Color::RED;

/// How often each strategy fired over a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ActivationCounters {
    pub speed_limit:    u32,
    pub signal_retime:  u32,
    pub lock:           u32,
    pub weight_routing: u32,
    /// Areas restored (one per below-threshold transition with any strategy active).
    pub restore:        u32,
}

/// Owns every area's runtime state for one experiment.
pub struct MitigationEngine {
    config:   ExperimentConfig,
    areas:    Vec<AreaState>,
    counters: ActivationCounters,
    steps:    usize,
}

impl MitigationEngine {
    pub fn new(config: &ExperimentConfig, dataset: &Dataset) -> Self {
        Self {
            config:   config.clone(),
            areas:    (0..dataset.area_count()).map(|_| AreaState::new(config.window_size)).collect(),
            counters: ActivationCounters::default(),
            steps:    0,
        }
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn states(&self) -> &[AreaState] {
        &self.areas
    }

    #[inline]
    pub fn state(&self, area: AreaId) -> &AreaState {
        &self.areas[area.index()]
    }

    pub fn counters(&self) -> ActivationCounters {
        self.counters
    }

    /// Steps processed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Per-area sums over every processed step, indexed by `AreaId`.
    pub fn area_totals(&self) -> Vec<Emission> {
        self.areas.iter().map(AreaState::total).collect()
    }

    /// Sum over all areas and steps.
    pub fn total(&self) -> Emission {
        self.areas.iter().map(AreaState::total).sum()
    }

    /// Draw every area as an unfilled polygon, when the overlay is enabled.
    pub fn install_overlay<G: Gateway>(&self, gw: &mut G, ds: &Dataset) -> MitigationResult<()> {
        if !self.config.overlay {
            return Ok(());
        }
        for area in ds.grid.iter() {
            gw.add_polygon(&area.name, &area.polygon(), OVERLAY_CALM, false)?;
        }
        debug!("{}: overlay of {} areas installed", self.config.name, ds.area_count());
        Ok(())
    }

    /// Process one step.  `per_area` is indexed by `AreaId`; `vehicles` are
    /// the ids present this step (rerouted by weight routing).
    pub fn step<G: Gateway>(
        &mut self,
        gw:       &mut G,
        ds:       &Dataset,
        per_area: &[Emission],
        vehicles: &[String],
    ) -> MitigationResult<()> {
        if per_area.len() != self.areas.len() {
            return Err(MitigationError::DataIntegrity(format!(
                "{} area emissions for {} areas",
                per_area.len(),
                self.areas.len()
            )));
        }

        let step = self.steps;
        for (idx, &emission) in per_area.iter().enumerate() {
            let area = ds.grid.areas[idx].id;
            let state = &mut self.areas[idx];

            let sum = state.record(emission);
            let over = sum >= self.config.emissions_threshold;
            if state.set_over_threshold(step, over) && self.config.overlay {
                let name = &ds.grid.area(area).name;
                gw.set_polygon_color(name, if over { OVERLAY_HOT } else { OVERLAY_CALM })?;
                gw.set_polygon_filled(name, over)?;
            }

            for action in plan(&self.config, state, over) {
                self.apply(gw, ds, area, action, vehicles)?;
            }
        }
        self.steps += 1;
        Ok(())
    }

    fn apply<G: Gateway>(
        &mut self,
        gw:       &mut G,
        ds:       &Dataset,
        area:     AreaId,
        action:   Action,
        vehicles: &[String],
    ) -> MitigationResult<()> {
        let label = &self.config.name;
        let name = &ds.grid.area(area).name;
        let state = &mut self.areas[area.index()];

        match action {
            Action::LimitSpeed { factor } => {
                strategies::limit_speed(gw, ds, area, factor)?;
                state.speed_limited = true;
                self.counters.speed_limit += 1;
                info!("{label}: decreased max speed into {name} by {:.0}%", (1.0 - factor) * 100.0);
            }
            Action::RetimeSignals { factor } => {
                strategies::retime_signals(gw, ds, area, factor)?;
                state.signals_adjusted = true;
                self.counters.signal_retime += 1;
                info!("{label}: scaled traffic light phases in {name} by {factor}");
            }
            Action::Lock { class } => {
                if strategies::lock_area(gw, ds, area, &class)? {
                    state.locked = true;
                    self.counters.lock += 1;
                    info!("{label}: locked {name} for {}", class.as_str());
                }
            }
            Action::WeightRouting { factor, per_lane } => {
                strategies::weight_routing(gw, ds, area, factor, per_lane, vehicles)?;
                state.weight_adjusted = true;
                self.counters.weight_routing += 1;
                info!("{label}: weighted edges in {name} by emission, rerouted {} vehicles", vehicles.len());
            }
            Action::Restore => {
                if state.speed_limited {
                    strategies::restore_speed(gw, ds, area)?;
                    state.speed_limited = false;
                }
                if state.signals_adjusted {
                    strategies::restore_signals(gw, ds, area)?;
                    state.signals_adjusted = false;
                }
                if state.locked {
                    strategies::unlock_area(gw, ds, area)?;
                    state.locked = false;
                }
                if state.weight_adjusted {
                    strategies::reset_weights(gw, ds, area)?;
                    state.weight_adjusted = false;
                }
                self.counters.restore += 1;
                info!("{label}: restored {name}");
            }
        }
        Ok(())
    }
}
