//! End-of-run totals and reductions against a reference run.

use std::time::Duration;

use log::info;
use serde::Serialize;

use em_core::{Emission, ExperimentConfig, Pollutant};
use em_grid::Dataset;
use em_mitigation::{ActivationCounters, MitigationEngine};

/// `(reference - observed) / reference` in percent.  `None` when the
/// reference is zero.
pub fn reduction_percentage(reference: f64, observed: f64) -> Option<f64> {
    if reference == 0.0 {
        return None;
    }
    Some((reference - observed) * 100.0 / reference)
}

/// Reduction per pollutant and over the summed total.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reductions {
    pub co2:     Option<f64>,
    pub co:      Option<f64>,
    pub nox:     Option<f64>,
    pub hc:      Option<f64>,
    pub pmx:     Option<f64>,
    pub overall: Option<f64>,
}

impl Reductions {
    pub fn between(reference: &Emission, observed: &Emission) -> Self {
        let r = |p: Pollutant| reduction_percentage(reference.get(p), observed.get(p));
        Self {
            co2:     r(Pollutant::Co2),
            co:      r(Pollutant::Co),
            nox:     r(Pollutant::Nox),
            hc:      r(Pollutant::Hc),
            pmx:     r(Pollutant::Pmx),
            overall: reduction_percentage(reference.total(), observed.total()),
        }
    }

    pub fn get(&self, p: Pollutant) -> Option<f64> {
        match p {
            Pollutant::Co2 => self.co2,
            Pollutant::Co  => self.co,
            Pollutant::Nox => self.nox,
            Pollutant::Hc  => self.hc,
            Pollutant::Pmx => self.pmx,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AreaTotal {
    pub name:  String,
    pub total: Emission,
}

/// Summary of one experiment, complete or partial.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExperimentReport {
    pub config_name:      String,
    pub dataset_name:     String,
    pub steps_completed:  usize,
    /// Summed over all areas and steps.
    pub total:            Emission,
    pub area_totals:      Vec<AreaTotal>,
    pub counters:         ActivationCounters,
    /// Vehicle-steps spent outside the grid.
    pub vehicles_outside: u64,
    pub elapsed_secs:     f64,
    pub reductions:       Option<Reductions>,
}

impl ExperimentReport {
    pub fn new(
        config:   &ExperimentConfig,
        dataset:  &Dataset,
        engine:   &MitigationEngine,
        outside:  u64,
        elapsed:  Duration,
    ) -> Self {
        let area_totals: Vec<AreaTotal> = dataset
            .grid
            .iter()
            .zip(engine.area_totals())
            .map(|(area, total)| AreaTotal { name: area.name.clone(), total })
            .collect();
        let total: Emission = area_totals.iter().map(|a| a.total).sum();
        let reductions = config.reference_emissions.as_ref().map(|r| Reductions::between(r, &total));

        Self {
            config_name:      config.name.clone(),
            dataset_name:     dataset.name.clone(),
            steps_completed:  engine.steps(),
            total,
            area_totals,
            counters:         engine.counters(),
            vehicles_outside: outside,
            elapsed_secs:     elapsed.as_secs_f64(),
            reductions,
        }
    }

    /// Simulated steps per wall-clock second.
    pub fn real_time_factor(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.steps_completed as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        let label = &self.config_name;
        info!(
            "{label}: {} steps in {:.1}s ({:.1} steps/s)",
            self.steps_completed,
            self.elapsed_secs,
            self.real_time_factor()
        );
        info!("{label}: total emissions = {:.3} mg", self.total.total());
        for p in Pollutant::ALL {
            info!("{label}: total {} = {:.3} mg", p.as_str(), self.total.get(p));
        }
        if let Some(red) = &self.reductions {
            for p in Pollutant::ALL {
                match red.get(p) {
                    Some(pct) => info!("{label}: {} reduction = {pct:.2}%", p.as_str()),
                    None => info!("{label}: {} reduction undefined (zero reference)", p.as_str()),
                }
            }
            if let Some(pct) = red.overall {
                info!("{label}: overall reduction = {pct:.2}%");
            }
        }
    }
}
