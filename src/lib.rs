//! # rinnai-bridge
//!
//! Command bridge for boiler/water-heater controllers that speak a polling
//! ASCII-hex protocol.
//!
//! The appliance cannot be called. It periodically posts a status report and
//! only takes instructions inside the reply to that report. This crate
//! queues external commands and folds them into the next reply.
//!
//! ## Architecture
//!
//! - **Frame codec** ([`protocol`]): the `prefix │ command │ length │ payload │
//!   checksum │ tail` envelope
//! - **Status codec** ([`codec`]): the fixed-width 152-character status record
//! - **Command queue** ([`command`]): exactly-once delivery with deadlines
//! - **Exchange coordinator** ([`coordinator`]): registration and status-report
//!   handling
//! - **Bridge** ([`Bridge`]): the facade the HTTP listener and front-ends call
//!
//! ## Example
//!
//! ```
//! use rinnai_bridge::{protocol::{prefix, Frame, EXCHANGE_COMMAND}, Bridge};
//!
//! let bridge = Bridge::new();
//! let request = Frame::new(prefix::REGISTER_REQUEST, EXCHANGE_COMMAND, "")
//!     .encode()
//!     .unwrap();
//!
//! let reply = bridge.handle_inbound_frame(&request).unwrap();
//! assert_eq!(Frame::decode(&reply).unwrap().prefix, prefix::REGISTER_ACK);
//! ```

pub mod codec;
pub mod command;
pub mod coordinator;
pub mod error;
pub mod liveness;
pub mod protocol;

mod bridge;

pub use bridge::{
    Bridge, BridgeBuilder, BridgeConfig, DEFAULT_CHANGE_CAPACITY, DEFAULT_COMMAND_TIMEOUT,
    DEFAULT_REGISTRATION_TOKEN,
};
pub use codec::{HotWaterSetpoint, HvacAction, HvacMode, StatusPayload};
pub use command::Mutation;
pub use coordinator::{ExchangeState, StatusChange};
pub use error::{BridgeError, Result};
