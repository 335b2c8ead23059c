//! Derived operating views of a status record.
//!
//! These collapse the power, heat and hot-water flags into the coarse
//! modes and actions that climate front-ends display.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::BridgeError;

/// Combustion state reported while the burner is idle.
pub const COMBUSTION_IDLE: u8 = 1;
/// Combustion state reported while heating.
pub const COMBUSTION_HEATING: u8 = 2;
/// Combustion state reported while drying.
pub const COMBUSTION_DRYING: u8 = 4;

/// Overall operating mode.
///
/// | mode   | power | heat | hot water |
/// |--------|-------|------|-----------|
/// | `off`  | off   | -    | -         |
/// | `auto` | on    | on   | on        |
/// | `heat` | on    | on   | off       |
/// | `dry`  | on    | off  | on        |
/// | `cool` | on    | off  | off       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    Off,
    Auto,
    Heat,
    Dry,
    Cool,
}

impl HvacMode {
    /// Mode implied by the three switches.
    pub fn from_switches(power: bool, heat: bool, hot_water: bool) -> Self {
        match (power, heat, hot_water) {
            (false, _, _) => Self::Off,
            (true, true, true) => Self::Auto,
            (true, true, false) => Self::Heat,
            (true, false, true) => Self::Dry,
            (true, false, false) => Self::Cool,
        }
    }

    /// Switch settings `(power, heat, hot_water)` that select this mode.
    ///
    /// `Off` only turns power off; the other two switches are left alone.
    pub fn switches(self) -> (bool, Option<bool>, Option<bool>) {
        match self {
            Self::Off => (false, None, None),
            Self::Auto => (true, Some(true), Some(true)),
            Self::Heat => (true, Some(true), Some(false)),
            Self::Dry => (true, Some(false), Some(true)),
            Self::Cool => (true, Some(false), Some(false)),
        }
    }

    /// Lowercase mode name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Auto => "auto",
            Self::Heat => "heat",
            Self::Dry => "dry",
            Self::Cool => "cool",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HvacMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "auto" => Ok(Self::Auto),
            "heat" => Ok(Self::Heat),
            "dry" => Ok(Self::Dry),
            "cool" => Ok(Self::Cool),
            other => Err(BridgeError::InvalidMode(other.to_string())),
        }
    }
}

/// What the burner is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacAction {
    Off,
    Idle,
    Heating,
    Drying,
}

impl HvacAction {
    /// Unpowered or unattributed combustion states read as `Off`.
    pub fn from_state(power: bool, combustion_state: u8) -> Self {
        if !power {
            return Self::Off;
        }
        match combustion_state {
            COMBUSTION_IDLE => Self::Idle,
            COMBUSTION_HEATING => Self::Heating,
            COMBUSTION_DRYING => Self::Drying,
            _ => Self::Off,
        }
    }

    /// Lowercase action name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Idle => "idle",
            Self::Heating => "heating",
            Self::Drying => "drying",
        }
    }
}

impl fmt::Display for HvacAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
