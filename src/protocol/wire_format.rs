//! Wire format primitives.
//!
//! Implements the ASCII-hex frame layout:
//! ```text
//! ┌──────────┬─────────┬────────┬──────────────┬──────────┬──────┐
//! │ Prefix   │ Command │ Length │ Payload      │ Checksum │ Tail │
//! │ 6 chars  │ 2 hex   │ 2 hex  │ Length chars │ 2 hex    │ "7d" │
//! └──────────┴─────────┴────────┴──────────────┴──────────┴──────┘
//! ```
//!
//! Every byte value travels as two hex digits; the payload itself is
//! ASCII text of at most 255 characters.

/// Prefix width in characters.
pub const PREFIX_LEN: usize = 6;

/// Maximum payload length (one hex byte).
pub const MAX_PAYLOAD_LEN: usize = 0xff;

/// Constant tail byte closing every frame.
pub const FRAME_TAIL: u8 = 0x7d;

/// Command code observed for both registration and status exchanges.
pub const EXCHANGE_COMMAND: u8 = 0x01;

/// Shortest possible frame: prefix + command + length + checksum + tail.
pub const MIN_FRAME_LEN: usize = PREFIX_LEN + 2 * 4;

/// Frame prefixes (protocol tags).
pub mod prefix {
    /// Appliance asks to register.
    pub const REGISTER_REQUEST: &str = "re0000";
    /// Server acknowledges a registration.
    pub const REGISTER_ACK: &str = "re0100";
    /// Appliance status report; also the ordinary acknowledgement tag.
    pub const STATUS_REPORT: &str = "re0101";
    /// Server reply that carries a command.
    pub const COMMAND_REPLY: &str = "sm0101";
}

/// Sum of payload character codes, modulo 256.
///
/// # Example
///
/// ```
/// use rinnai_bridge::protocol::checksum;
///
/// assert_eq!(checksum(""), 0);
/// assert_eq!(checksum("AB"), 0x41 + 0x42);
/// ```
pub fn checksum(payload: &str) -> u8 {
    payload.bytes().fold(0u8, |acc, b| acc.wrapping_add(b))
}

/// Why a [`TextReader`] could not produce a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadFault {
    /// Not enough input left.
    Exhausted,
    /// Two characters were read but they are not hex digits.
    NotHex,
}

/// Cursor over ASCII text, consuming fixed-width fields.
pub(crate) struct TextReader<'a> {
    buf: &'a str,
    pos: usize,
}

impl<'a> TextReader<'a> {
    /// Callers must have checked `buf.is_ascii()`; slicing is byte-based.
    pub(crate) fn new(buf: &'a str) -> Self {
        debug_assert!(buf.is_ascii());
        Self { buf, pos: 0 }
    }

    pub(crate) fn read_str(&mut self, len: usize) -> Result<&'a str, ReadFault> {
        if self.remaining() < len {
            return Err(ReadFault::Exhausted);
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub(crate) fn read_hex(&mut self) -> Result<u8, ReadFault> {
        let digits = self.read_str(2)?;
        parse_hex_byte(digits).ok_or(ReadFault::NotHex)
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Parse exactly two hex digits. Rejects signs, which `from_str_radix` allows.
fn parse_hex_byte(digits: &str) -> Option<u8> {
    if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

/// Append-only builder for ASCII-hex text.
#[derive(Debug, Default)]
pub(crate) struct TextWriter {
    buf: String,
}

impl TextWriter {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
        }
    }

    /// Two lowercase hex digits, zero padded.
    pub(crate) fn put_hex(&mut self, value: u8) {
        use std::fmt::Write;
        // Writing into a String cannot fail.
        let _ = write!(self.buf, "{value:02x}");
    }

    pub(crate) fn put_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_wraps_modulo_256() {
        // 3 * 0x7a = 0x16e
        assert_eq!(checksum("zzz"), 0x6e);
    }

    #[test]
    fn test_min_frame_len() {
        assert_eq!(MIN_FRAME_LEN, 14);
        assert_eq!("re01000100007d".len(), MIN_FRAME_LEN);
    }

    #[test]
    fn test_reader_consumes_fields_in_order() {
        let mut reader = TextReader::new("abcdef0a7D");
        assert_eq!(reader.read_str(6), Ok("abcdef"));
        assert_eq!(reader.read_hex(), Ok(0x0a));
        assert_eq!(reader.read_hex(), Ok(0x7d));
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.read_hex(), Err(ReadFault::Exhausted));
    }

    #[test]
    fn test_reader_rejects_signed_and_non_hex_digits() {
        assert_eq!(TextReader::new("+f").read_hex(), Err(ReadFault::NotHex));
        assert_eq!(TextReader::new("g0").read_hex(), Err(ReadFault::NotHex));
        assert_eq!(TextReader::new(" 1").read_hex(), Err(ReadFault::NotHex));
    }

    #[test]
    fn test_reader_short_input() {
        let mut reader = TextReader::new("a");
        assert_eq!(reader.read_hex(), Err(ReadFault::Exhausted));
        assert_eq!(reader.read_str(2), Err(ReadFault::Exhausted));
    }

    #[test]
    fn test_writer_lowercase_zero_padded() {
        let mut writer = TextWriter::with_capacity(8);
        writer.put_hex(0);
        writer.put_hex(0x0f);
        writer.put_hex(0xAB);
        writer.put_str("xy");
        assert_eq!(writer.finish(), "000fabxy");
    }
}
