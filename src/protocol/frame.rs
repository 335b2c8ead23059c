//! Frame struct and its text codec.
//!
//! A frame is the outer envelope of every appliance exchange. The codec
//! knows nothing about payload semantics.
//!
//! # Example
//!
//! ```
//! use rinnai_bridge::protocol::{prefix, Frame};
//!
//! let frame = Frame::new(prefix::STATUS_REPORT, 0x01, "AB");
//! let text = frame.encode().unwrap();
//! assert_eq!(text, "re01010102AB837d");
//! assert_eq!(Frame::decode(&text).unwrap(), frame);
//! ```

use super::wire_format::{
    checksum, ReadFault, TextReader, TextWriter, FRAME_TAIL, MAX_PAYLOAD_LEN, MIN_FRAME_LEN,
    PREFIX_LEN,
};
use crate::error::{BridgeError, Result};

/// A complete protocol frame.
///
/// Checksum and tail are derived during encoding and verified during
/// decoding, so they are not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Six-character protocol tag (see [`prefix`](super::prefix)).
    pub prefix: String,
    /// Command code.
    pub command: u8,
    /// ASCII payload, at most 255 characters.
    pub payload: String,
}

impl Frame {
    /// Create a new frame.
    pub fn new(prefix: impl Into<String>, command: u8, payload: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            command,
            payload: payload.into(),
        }
    }

    /// Check whether this frame carries the given tag and command code.
    #[inline]
    pub fn is(&self, prefix: &str, command: u8) -> bool {
        self.prefix == prefix && self.command == command
    }

    /// Parse a frame from raw text.
    ///
    /// The whole input must be exactly one frame: no partial frames and
    /// nothing after the tail.
    pub fn decode(raw: &str) -> Result<Self> {
        if !raw.is_ascii() {
            return Err(BridgeError::MalformedFrame("non-ASCII input"));
        }
        if raw.len() < MIN_FRAME_LEN {
            return Err(BridgeError::MalformedFrame("input shorter than a frame"));
        }

        let mut reader = TextReader::new(raw);
        let prefix = reader
            .read_str(PREFIX_LEN)
            .map_err(|_| BridgeError::MalformedFrame("input ends inside prefix"))?;
        let command = reader
            .read_hex()
            .map_err(fault("input ends inside command", "command is not a hex byte"))?;
        let length = reader
            .read_hex()
            .map_err(fault("input ends inside length", "length is not a hex byte"))?;
        let payload = reader
            .read_str(usize::from(length))
            .map_err(|_| BridgeError::MalformedFrame("payload shorter than declared length"))?;
        let received = reader
            .read_hex()
            .map_err(fault("input ends inside checksum", "checksum is not a hex byte"))?;

        let computed = checksum(payload);
        if computed != received {
            return Err(BridgeError::ChecksumMismatch {
                expected: computed,
                actual: received,
            });
        }

        let tail = reader
            .read_hex()
            .map_err(fault("input ends inside tail", "tail is not a hex byte"))?;
        if tail != FRAME_TAIL {
            return Err(BridgeError::BadTail(tail));
        }

        if reader.remaining() != 0 {
            return Err(BridgeError::TrailingData(reader.remaining()));
        }

        Ok(Self::new(prefix, command, payload))
    }

    /// Render the frame as wire text.
    ///
    /// The checksum is always recomputed from the payload.
    pub fn encode(&self) -> Result<String> {
        let prefix_len = self.prefix.chars().count();
        if prefix_len != PREFIX_LEN {
            return Err(BridgeError::InvalidPrefixLength(prefix_len));
        }
        if !self.prefix.is_ascii() {
            return Err(BridgeError::MalformedFrame("non-ASCII prefix"));
        }
        if !self.payload.is_ascii() {
            return Err(BridgeError::MalformedFrame("non-ASCII payload"));
        }
        let length = u8::try_from(self.payload.len())
            .map_err(|_| BridgeError::PayloadTooLong(self.payload.len()))?;
        debug_assert!(usize::from(length) <= MAX_PAYLOAD_LEN);

        let mut writer = TextWriter::with_capacity(MIN_FRAME_LEN + self.payload.len());
        writer.put_str(&self.prefix);
        writer.put_hex(self.command);
        writer.put_hex(length);
        writer.put_str(&self.payload);
        writer.put_hex(checksum(&self.payload));
        writer.put_hex(FRAME_TAIL);
        Ok(writer.finish())
    }
}

fn fault(short: &'static str, not_hex: &'static str) -> impl Fn(ReadFault) -> BridgeError {
    move |f| match f {
        ReadFault::Exhausted => BridgeError::MalformedFrame(short),
        ReadFault::NotHex => BridgeError::MalformedFrame(not_hex),
    }
}
