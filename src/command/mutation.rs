//! Status mutations requested by external callers.
//!
//! A [`Mutation`] is a small edit applied to the reply copy of a status
//! report. Temperature variants should be built through the validating
//! constructors; the raw variants are kept public so the publish layer can
//! match on them.

use std::fmt;

use crate::codec::{HotWaterSetpoint, HvacMode, StatusPayload};
use crate::error::{BridgeError, Result};

/// Lowest accepted room/heat-water setpoint in °C.
pub const ROOM_TEMP_MIN: u8 = 15;
/// Highest accepted room/heat-water setpoint in °C.
pub const ROOM_TEMP_MAX: u8 = 30;
/// Lowest accepted hot-water setpoint in °C.
pub const HOT_WATER_TEMP_MIN: u8 = 40;
/// Highest accepted hot-water setpoint in °C.
pub const HOT_WATER_TEMP_MAX: u8 = 60;

/// Go-out byte written when away mode is switched on.
pub const GO_OUT_ON: u8 = 0x80;

/// An edit to apply to the next reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Power(bool),
    Heat(bool),
    HotWater(bool),
    PreHeat(bool),
    QuickHeat(bool),
    /// Sets both the room and the heat-water setpoint.
    RoomTemperature(u8),
    HotWaterTemperature(u8),
    /// Away mode. Switching it off while heating is on turns heating off
    /// instead and leaves the go-out byte alone; the appliance clears it
    /// itself.
    Away(bool),
    Mode(HvacMode),
}

fn check_range(value: i64, min: u8, max: u8) -> Result<u8> {
    if value < i64::from(min) || value > i64::from(max) {
        return Err(BridgeError::InvalidTemperature { value, min, max });
    }
    Ok(value as u8)
}

impl Mutation {
    /// Room temperature in [`ROOM_TEMP_MIN`]..=[`ROOM_TEMP_MAX`].
    pub fn room_temperature(value: i64) -> Result<Self> {
        check_range(value, ROOM_TEMP_MIN, ROOM_TEMP_MAX).map(Self::RoomTemperature)
    }

    /// Hot-water temperature in [`HOT_WATER_TEMP_MIN`]..=[`HOT_WATER_TEMP_MAX`].
    pub fn hot_water_temperature(value: i64) -> Result<Self> {
        check_range(value, HOT_WATER_TEMP_MIN, HOT_WATER_TEMP_MAX)
            .map(Self::HotWaterTemperature)
    }

    /// Parse a mode name and wrap it.
    pub fn mode(name: &str) -> Result<Self> {
        name.parse().map(Self::Mode)
    }

    /// Edit `status` in place.
    ///
    /// Fails without touching `status` when the value cannot be carried by
    /// the payload, which only happens for variants built directly with an
    /// out-of-range value.
    pub fn apply(&self, status: &mut StatusPayload) -> Result<()> {
        match *self {
            Self::Power(on) => status.is_power_on = on,
            Self::Heat(on) => status.is_heat_on = on,
            Self::HotWater(on) => status.is_hot_water_on = on,
            Self::PreHeat(on) => status.is_pre_heat = on,
            Self::QuickHeat(on) => status.is_quick_heat = on,
            Self::RoomTemperature(degrees) => {
                status.desired_room_temp = degrees;
                status.desired_heat_water_temp = degrees;
            }
            Self::HotWaterTemperature(degrees) => {
                let setpoint = HotWaterSetpoint::Degrees(degrees);
                setpoint.to_byte()?;
                status.desired_hot_water_temp = setpoint;
            }
            Self::Away(true) => status.is_go_out = GO_OUT_ON,
            Self::Away(false) => {
                if status.is_away() && status.is_heat_on {
                    status.is_heat_on = false;
                } else {
                    status.is_go_out = 0;
                }
            }
            Self::Mode(mode) => {
                let (power, heat, hot_water) = mode.switches();
                status.is_power_on = power;
                if let Some(heat) = heat {
                    status.is_heat_on = heat;
                }
                if let Some(hot_water) = hot_water {
                    status.is_hot_water_on = hot_water;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let switch = |on: bool| if on { "on" } else { "off" };
        match self {
            Self::Power(on) => write!(f, "power {}", switch(*on)),
            Self::Heat(on) => write!(f, "heat {}", switch(*on)),
            Self::HotWater(on) => write!(f, "hotwater {}", switch(*on)),
            Self::PreHeat(on) => write!(f, "preheat {}", switch(*on)),
            Self::QuickHeat(on) => write!(f, "quickheat {}", switch(*on)),
            Self::RoomTemperature(t) => write!(f, "desiredtemp {}", t),
            Self::HotWaterTemperature(t) => write!(f, "desiredhotwatertemp {}", t),
            Self::Away(on) => write!(f, "goout {}", switch(*on)),
            Self::Mode(mode) => write!(f, "mode {}", mode),
        }
    }
}
