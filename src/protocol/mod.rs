//! Protocol module - wire format and frame codec.
//!
//! This module implements the outer envelope of the appliance protocol:
//! - ASCII-hex field primitives and the payload checksum
//! - Known frame prefixes and command codes
//! - Frame struct with strict decode/encode

mod frame;
mod wire_format;

pub use frame::Frame;
pub use wire_format::{
    checksum, prefix, EXCHANGE_COMMAND, FRAME_TAIL, MAX_PAYLOAD_LEN, MIN_FRAME_LEN, PREFIX_LEN,
};

pub(crate) use wire_format::{ReadFault, TextReader, TextWriter};
