//! Per-pollutant emission masses.
//!
//! The engine reports emission *rates* in mg/s; with the default one-second
//! step length a rate read once per step is also the mass emitted during
//! that step, which is how every total in this workspace is interpreted.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// The five pollutants tracked per vehicle, lane edge and area.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Pollutant {
    Co2,
    Co,
    Nox,
    Hc,
    Pmx,
}

impl Pollutant {
    pub const ALL: [Pollutant; 5] = [
        Pollutant::Co2,
        Pollutant::Co,
        Pollutant::Nox,
        Pollutant::Hc,
        Pollutant::Pmx,
    ];

    /// Upper-case label used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            Pollutant::Co2 => "CO2",
            Pollutant::Co  => "CO",
            Pollutant::Nox => "NOx",
            Pollutant::Hc  => "HC",
            Pollutant::Pmx => "PMx",
        }
    }
}

impl std::fmt::Display for Pollutant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pollutant masses in milligrams.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    pub co2: f64,
    pub co:  f64,
    pub nox: f64,
    pub hc:  f64,
    pub pmx: f64,
}

impl Emission {
    pub const ZERO: Emission = Emission { co2: 0.0, co: 0.0, nox: 0.0, hc: 0.0, pmx: 0.0 };

    pub fn new(co2: f64, co: f64, nox: f64, hc: f64, pmx: f64) -> Self {
        Self { co2, co, nox, hc, pmx }
    }

    /// Sum over all pollutants, the scalar the threshold is compared with.
    #[inline]
    pub fn total(&self) -> f64 {
        self.co2 + self.co + self.nox + self.hc + self.pmx
    }

    pub fn get(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Co2 => self.co2,
            Pollutant::Co  => self.co,
            Pollutant::Nox => self.nox,
            Pollutant::Hc  => self.hc,
            Pollutant::Pmx => self.pmx,
        }
    }
}

impl Add for Emission {
    type Output = Emission;

    fn add(self, rhs: Emission) -> Emission {
        Emission {
            co2: self.co2 + rhs.co2,
            co:  self.co + rhs.co,
            nox: self.nox + rhs.nox,
            hc:  self.hc + rhs.hc,
            pmx: self.pmx + rhs.pmx,
        }
    }
}

impl AddAssign for Emission {
    fn add_assign(&mut self, rhs: Emission) {
        *self = *self + rhs;
    }
}

impl Sum for Emission {
    fn sum<I: Iterator<Item = Emission>>(iter: I) -> Emission {
        iter.fold(Emission::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Emission> for Emission {
    fn sum<I: Iterator<Item = &'a Emission>>(iter: I) -> Emission {
        iter.copied().sum()
    }
}

impl std::fmt::Display for Emission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CO2={:.3} CO={:.3} NOx={:.3} HC={:.3} PMx={:.3} mg",
            self.co2, self.co, self.nox, self.hc, self.pmx
        )
    }
}
