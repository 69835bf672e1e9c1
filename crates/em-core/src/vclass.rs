//! Vehicle classes understood by the engine's lane permission model.
//!
//! Only the classes relevant to area locking are enumerated; any other
//! engine class name can still be carried through [`VehicleClass::Other`].

use serde::{Deserialize, Serialize};

/// An engine vehicle class (`passenger`, `bus`, ...).
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    /// Private car, the class locked out by default.
    #[default]
    Passenger,
    Bus,
    Truck,
    Delivery,
    Bicycle,
    Pedestrian,
    /// Any other engine class name, passed through verbatim.
    #[serde(untagged)]
    Other(String),
}

impl VehicleClass {
    /// Name as used on the engine's control channel.
    pub fn as_str(&self) -> &str {
        match self {
            VehicleClass::Passenger  => "passenger",
            VehicleClass::Bus        => "bus",
            VehicleClass::Truck      => "truck",
            VehicleClass::Delivery   => "delivery",
            VehicleClass::Bicycle    => "bicycle",
            VehicleClass::Pedestrian => "pedestrian",
            VehicleClass::Other(s)   => s,
        }
    }
}

impl std::fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
