//! Status payload codec.
//!
//! Layout of the 152-character payload carried by status reports and their
//! replies (widths in characters):
//!
//! ```text
//! flags 2 │ room set 2 │ heat-water set 2 │ hot-water set 2 │ room 2 │ water 2
//! drive 2 │ opaque1 4 │ go-out 2 │ mode 2 │ opaque2 4 │ reserve 2
//! opaque3 70 │ clock 14 │ opaque4 40
//! ```
//!
//! Opaque ranges are not understood; they are carried from the last decoded
//! report into the reply byte for byte.

use serde::Serialize;

use super::clock::ClockStamp;
use super::mode::{HvacAction, HvacMode};
use crate::error::{BridgeError, Result};
use crate::protocol::{ReadFault, TextReader, TextWriter};

/// Total payload width in characters.
pub const STATUS_PAYLOAD_LEN: usize = 152;

const OPAQUE1_LEN: usize = 4;
const OPAQUE2_LEN: usize = 4;
const OPAQUE3_LEN: usize = 70;
const OPAQUE4_LEN: usize = 40;

/// Bits of the leading flags byte.
pub mod heat_flags {
    pub const POWER_ON: u8 = 0b0000_0001;
    pub const HEAT_MODE: u8 = 0b0000_0010;
    pub const HEAT_ON: u8 = 0b0000_0100;
    pub const HOT_WATER_ON: u8 = 0b0000_1000;
    pub const PRE_HEAT: u8 = 0b0001_0000;
    pub const QUICK_HEAT: u8 = 0b0010_0000;
    /// Unattributed.
    pub const BIT6: u8 = 0b0100_0000;
    /// Unattributed.
    pub const BIT7: u8 = 0b1000_0000;
}

/// Bits of the drive-status byte.
pub mod drive_flags {
    /// Low nibble holds the combustion state.
    pub const COMBUSTION_MASK: u8 = 0b0000_1111;
    /// Unattributed.
    pub const BIT4: u8 = 0b0001_0000;
    pub const HOT_WATER_IN_USE: u8 = 0b0010_0000;
    /// Unattributed.
    pub const BIT6: u8 = 0b0100_0000;
    /// Unattributed.
    pub const BIT7: u8 = 0b1000_0000;
}

#[inline]
fn bit(byte: u8, mask: u8) -> bool {
    byte & mask != 0
}

#[inline]
fn set(on: bool, mask: u8) -> u8 {
    if on {
        mask
    } else {
        0
    }
}

/// Desired hot-water temperature.
///
/// The wire byte holds whole degrees in its low 7 bits. When the high bit is
/// set the appliance means a literal 0.5 and the low bits are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "f32")]
pub enum HotWaterSetpoint {
    /// Whole degrees, 0..=127.
    Degrees(u8),
    /// The high-bit value, read as 0.5.
    Half,
}

impl HotWaterSetpoint {
    const HIGH_BIT: u8 = 0x80;

    /// Read the hot-water byte; any value with the high bit set is `Half`.
    pub fn from_byte(byte: u8) -> Self {
        if byte & Self::HIGH_BIT != 0 {
            Self::Half
        } else {
            Self::Degrees(byte)
        }
    }

    /// Wire byte for this setpoint. `Degrees` above 127 cannot be carried.
    pub fn to_byte(self) -> Result<u8> {
        match self {
            Self::Degrees(d) if d < Self::HIGH_BIT => Ok(d),
            Self::Degrees(_) => Err(BridgeError::OutOfRange {
                field: "desired_hot_water_temp",
            }),
            Self::Half => Ok(Self::HIGH_BIT),
        }
    }

    /// Setpoint in degrees Celsius.
    pub fn celsius(self) -> f32 {
        match self {
            Self::Degrees(d) => f32::from(d),
            Self::Half => 0.5,
        }
    }
}

impl Default for HotWaterSetpoint {
    fn default() -> Self {
        Self::Degrees(0)
    }
}

impl From<HotWaterSetpoint> for f32 {
    fn from(value: HotWaterSetpoint) -> Self {
        value.celsius()
    }
}

/// One field that differs between two status records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub from: String,
    pub to: String,
}

/// Decoded appliance status.
///
/// Fields are public so commands can edit them; the fixed-width text fields
/// must keep their width or [`encode`](Self::encode) fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub is_power_on: bool,
    pub is_heat_mode: bool,
    pub is_heat_on: bool,
    pub is_hot_water_on: bool,
    pub is_pre_heat: bool,
    pub is_quick_heat: bool,
    pub heat_flag_bit6: bool,
    pub heat_flag_bit7: bool,

    pub desired_room_temp: u8,
    pub desired_heat_water_temp: u8,
    pub desired_hot_water_temp: HotWaterSetpoint,

    pub current_room_temp: u8,
    pub current_water_temp: u8,

    /// 0..=15; see [`HvacAction`] for the attributed values.
    pub combustion_state: u8,
    pub drive_flag_bit4: bool,
    pub is_hot_water_using: bool,
    pub drive_flag_bit6: bool,
    pub drive_flag_bit7: bool,

    pub opaque1: String,
    /// Away mode: 0 off, 0x80 on.
    pub is_go_out: u8,
    pub mode_data: u8,
    pub opaque2: String,
    pub reserve_data: u8,
    pub opaque3: String,
    pub clock_stamp: String,
    pub opaque4: String,
}

impl Default for StatusPayload {
    fn default() -> Self {
        Self {
            is_power_on: false,
            is_heat_mode: false,
            is_heat_on: false,
            is_hot_water_on: false,
            is_pre_heat: false,
            is_quick_heat: false,
            heat_flag_bit6: false,
            heat_flag_bit7: false,
            desired_room_temp: 0,
            desired_heat_water_temp: 0,
            desired_hot_water_temp: HotWaterSetpoint::default(),
            current_room_temp: 0,
            current_water_temp: 0,
            combustion_state: super::mode::COMBUSTION_IDLE,
            drive_flag_bit4: false,
            is_hot_water_using: false,
            drive_flag_bit6: false,
            drive_flag_bit7: false,
            opaque1: "ffff".to_string(),
            is_go_out: 0,
            mode_data: 0,
            opaque2: "0".repeat(OPAQUE2_LEN),
            reserve_data: 0,
            opaque3: "0".repeat(OPAQUE3_LEN),
            clock_stamp: "0".repeat(ClockStamp::WIDTH),
            opaque4: "0".repeat(OPAQUE4_LEN),
        }
    }
}

impl StatusPayload {
    /// Parse a status payload.
    pub fn decode(text: &str) -> Result<Self> {
        if !text.is_ascii() {
            return Err(BridgeError::OutOfRange { field: "payload" });
        }
        if text.len() < STATUS_PAYLOAD_LEN {
            return Err(BridgeError::TruncatedStatus {
                expected: STATUS_PAYLOAD_LEN,
                actual: text.len(),
            });
        }
        if text.len() > STATUS_PAYLOAD_LEN {
            return Err(BridgeError::TrailingStatus {
                expected: STATUS_PAYLOAD_LEN,
                actual: text.len(),
            });
        }

        let mut r = StatusReader {
            inner: TextReader::new(text),
            total: text.len(),
        };
        let flags = r.byte("flags")?;
        let desired_room_temp = r.byte("desired_room_temp")?;
        let desired_heat_water_temp = r.byte("desired_heat_water_temp")?;
        let desired_hot_water_temp = HotWaterSetpoint::from_byte(r.byte("desired_hot_water_temp")?);
        let current_room_temp = r.byte("current_room_temp")?;
        let current_water_temp = r.byte("current_water_temp")?;
        let drive = r.byte("drive_status")?;
        let opaque1 = r.fixed("opaque1", OPAQUE1_LEN)?;
        let is_go_out = r.byte("is_go_out")?;
        let mode_data = r.byte("mode_data")?;
        let opaque2 = r.fixed("opaque2", OPAQUE2_LEN)?;
        let reserve_data = r.byte("reserve_data")?;
        let opaque3 = r.fixed("opaque3", OPAQUE3_LEN)?;
        let clock_stamp = r.fixed("clock_stamp", ClockStamp::WIDTH)?;
        let opaque4 = r.fixed("opaque4", OPAQUE4_LEN)?;
        debug_assert_eq!(r.inner.remaining(), 0);

        Ok(Self {
            is_power_on: bit(flags, heat_flags::POWER_ON),
            is_heat_mode: bit(flags, heat_flags::HEAT_MODE),
            is_heat_on: bit(flags, heat_flags::HEAT_ON),
            is_hot_water_on: bit(flags, heat_flags::HOT_WATER_ON),
            is_pre_heat: bit(flags, heat_flags::PRE_HEAT),
            is_quick_heat: bit(flags, heat_flags::QUICK_HEAT),
            heat_flag_bit6: bit(flags, heat_flags::BIT6),
            heat_flag_bit7: bit(flags, heat_flags::BIT7),
            desired_room_temp,
            desired_heat_water_temp,
            desired_hot_water_temp,
            current_room_temp,
            current_water_temp,
            combustion_state: drive & drive_flags::COMBUSTION_MASK,
            drive_flag_bit4: bit(drive, drive_flags::BIT4),
            is_hot_water_using: bit(drive, drive_flags::HOT_WATER_IN_USE),
            drive_flag_bit6: bit(drive, drive_flags::BIT6),
            drive_flag_bit7: bit(drive, drive_flags::BIT7),
            opaque1,
            is_go_out,
            mode_data,
            opaque2,
            reserve_data,
            opaque3,
            clock_stamp,
            opaque4,
        })
    }

    /// Render the payload text.
    pub fn encode(&self) -> Result<String> {
        if self.combustion_state > drive_flags::COMBUSTION_MASK {
            return Err(BridgeError::OutOfRange {
                field: "combustion_state",
            });
        }

        let flags = set(self.is_power_on, heat_flags::POWER_ON)
            | set(self.is_heat_mode, heat_flags::HEAT_MODE)
            | set(self.is_heat_on, heat_flags::HEAT_ON)
            | set(self.is_hot_water_on, heat_flags::HOT_WATER_ON)
            | set(self.is_pre_heat, heat_flags::PRE_HEAT)
            | set(self.is_quick_heat, heat_flags::QUICK_HEAT)
            | set(self.heat_flag_bit6, heat_flags::BIT6)
            | set(self.heat_flag_bit7, heat_flags::BIT7);

        let drive = self.combustion_state
            | set(self.drive_flag_bit4, drive_flags::BIT4)
            | set(self.is_hot_water_using, drive_flags::HOT_WATER_IN_USE)
            | set(self.drive_flag_bit6, drive_flags::BIT6)
            | set(self.drive_flag_bit7, drive_flags::BIT7);

        let mut w = TextWriter::with_capacity(STATUS_PAYLOAD_LEN);
        w.put_hex(flags);
        w.put_hex(self.desired_room_temp);
        w.put_hex(self.desired_heat_water_temp);
        w.put_hex(self.desired_hot_water_temp.to_byte()?);
        w.put_hex(self.current_room_temp);
        w.put_hex(self.current_water_temp);
        w.put_hex(drive);
        put_fixed(&mut w, "opaque1", &self.opaque1, OPAQUE1_LEN)?;
        w.put_hex(self.is_go_out);
        w.put_hex(self.mode_data);
        put_fixed(&mut w, "opaque2", &self.opaque2, OPAQUE2_LEN)?;
        w.put_hex(self.reserve_data);
        put_fixed(&mut w, "opaque3", &self.opaque3, OPAQUE3_LEN)?;
        put_fixed(&mut w, "clock_stamp", &self.clock_stamp, ClockStamp::WIDTH)?;
        put_fixed(&mut w, "opaque4", &self.opaque4, OPAQUE4_LEN)?;
        Ok(w.finish())
    }

    /// Overwrite the clock field.
    pub fn stamp_clock(&mut self, stamp: &ClockStamp) -> Result<()> {
        self.clock_stamp = stamp.encode()?;
        Ok(())
    }

    /// Away mode is any non-zero go-out byte.
    #[inline]
    pub fn is_away(&self) -> bool {
        self.is_go_out != 0
    }

    /// Operating mode derived from the power, heat and hot-water switches.
    pub fn hvac_mode(&self) -> HvacMode {
        HvacMode::from_switches(self.is_power_on, self.is_heat_on, self.is_hot_water_on)
    }

    /// What the appliance is doing right now.
    pub fn hvac_action(&self) -> HvacAction {
        HvacAction::from_state(self.is_power_on, self.combustion_state)
    }

    /// Fields whose value differs from `previous`, in layout order.
    pub fn changes_from(&self, previous: &StatusPayload) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        macro_rules! diff {
            ($($field:ident),* $(,)?) => {
                $(
                    if self.$field != previous.$field {
                        changes.push(FieldChange {
                            field: stringify!($field),
                            from: format!("{:?}", previous.$field),
                            to: format!("{:?}", self.$field),
                        });
                    }
                )*
            };
        }

        diff!(
            is_power_on,
            is_heat_mode,
            is_heat_on,
            is_hot_water_on,
            is_pre_heat,
            is_quick_heat,
            heat_flag_bit6,
            heat_flag_bit7,
            desired_room_temp,
            desired_heat_water_temp,
            desired_hot_water_temp,
            current_room_temp,
            current_water_temp,
            combustion_state,
            drive_flag_bit4,
            is_hot_water_using,
            drive_flag_bit6,
            drive_flag_bit7,
            opaque1,
            is_go_out,
            mode_data,
            opaque2,
            reserve_data,
            opaque3,
            clock_stamp,
            opaque4,
        );

        changes
    }
}

/// Field reader that maps read faults to status errors.
struct StatusReader<'a> {
    inner: TextReader<'a>,
    total: usize,
}

impl StatusReader<'_> {
    fn fault(&self, field: &'static str, fault: ReadFault) -> BridgeError {
        match fault {
            ReadFault::Exhausted => BridgeError::TruncatedStatus {
                expected: STATUS_PAYLOAD_LEN,
                actual: self.total,
            },
            ReadFault::NotHex => BridgeError::OutOfRange { field },
        }
    }

    fn byte(&mut self, field: &'static str) -> Result<u8> {
        match self.inner.read_hex() {
            Ok(value) => Ok(value),
            Err(fault) => Err(self.fault(field, fault)),
        }
    }

    fn fixed(&mut self, field: &'static str, width: usize) -> Result<String> {
        match self.inner.read_str(width) {
            Ok(value) => Ok(value.to_owned()),
            Err(fault) => Err(self.fault(field, fault)),
        }
    }
}

fn put_fixed(w: &mut TextWriter, field: &'static str, value: &str, width: usize) -> Result<()> {
    if value.len() != width || !value.is_ascii() {
        return Err(BridgeError::FieldWidth {
            field,
            expected: width,
            actual: value.chars().count(),
        });
    }
    w.put_str(value);
    Ok(())
}
