//! Codec module - the status payload carried inside frames.
//!
//! - [`StatusPayload`] - fixed-width status record with bitfields
//! - [`ClockStamp`] - the clock sub-field written into every reply
//! - [`HvacMode`] / [`HvacAction`] - coarse views derived from a status
//!
//! # Example
//!
//! ```
//! use rinnai_bridge::codec::{StatusPayload, STATUS_PAYLOAD_LEN};
//!
//! let status = StatusPayload::default();
//! let text = status.encode().unwrap();
//! assert_eq!(text.len(), STATUS_PAYLOAD_LEN);
//! assert_eq!(StatusPayload::decode(&text).unwrap(), status);
//! ```

mod clock;
mod mode;
mod status;

pub use clock::{ClockStamp, CLOCK_FIELD_MAX};
pub use mode::{HvacAction, HvacMode, COMBUSTION_DRYING, COMBUSTION_HEATING, COMBUSTION_IDLE};
pub use status::{
    drive_flags, heat_flags, FieldChange, HotWaterSetpoint, StatusPayload, STATUS_PAYLOAD_LEN,
};
