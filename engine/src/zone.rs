use serde::{Deserialize, Serialize};
use std::fmt;

pub type ZoneId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Heat,
    Cool,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Mode::Heat => "heat",
            Mode::Cool => "cool",
        })
    }
}

/// Thermal state shown for a zone, derived from a snapshot by [`status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    Off,
    Heating,
    Cooling,
    Comfort,
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoneStatus::Off => "off",
            ZoneStatus::Heating => "heating",
            ZoneStatus::Cooling => "cooling",
            ZoneStatus::Comfort => "comfort",
        };
        f.pad(s)
    }
}

/// Initial description of a zone, as listed in the default schedule or in
/// the `[[zones]]` section of a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSeed {
    pub id: ZoneId,
    pub name: String,
    pub ambient: f64,
    pub setpoint: f64,
    pub mode: Mode,
    #[serde(default)]
    pub test_temps: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub ambient: f64,
    pub setpoint: f64,
    pub is_on: bool,
    pub mode: Mode,
    /// Temperature restored whenever the zone is switched on or off.
    pub original_ambient: f64,
    pub test_temps: Vec<f64>,
    /// Position in `test_temps`; `None` until the first comfort arrival.
    pub test_index: Option<usize>,
}

impl Zone {
    pub fn from_seed(seed: ZoneSeed) -> Zone {
        Zone {
            id: seed.id,
            name: seed.name,
            ambient: seed.ambient,
            setpoint: seed.setpoint,
            is_on: false,
            mode: seed.mode,
            original_ambient: seed.ambient,
            test_temps: seed.test_temps,
            test_index: None,
        }
    }

    pub fn status(&self) -> ZoneStatus {
        status(self)
    }
}

/// Derives the thermal state of `zone`. Works on any zone value, including
/// ones that are not part of a registry.
pub fn status(zone: &Zone) -> ZoneStatus {
    if !zone.is_on {
        ZoneStatus::Off
    } else if zone.setpoint > zone.ambient {
        ZoneStatus::Heating
    } else if zone.setpoint < zone.ambient {
        ZoneStatus::Cooling
    } else {
        ZoneStatus::Comfort
    }
}
