//! Clock-stamp sub-encoding of the status payload.
//!
//! Seven two-character fields: minute, hour, day-of-week (Sunday = 0),
//! day-of-month, month (1-12), year modulo 100, second. Each value must be
//! in 0..=99 and is written as the lowercase hex digits of the number
//! itself, so minute 25 becomes `"19"`. The appliance accepts this form;
//! it is not BCD.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};

use crate::error::{BridgeError, Result};
use crate::protocol::TextWriter;

/// Largest value any clock field may carry.
pub const CLOCK_FIELD_MAX: u8 = 99;

/// Wall-clock time in the appliance's field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockStamp {
    pub minute: u8,
    pub hour: u8,
    /// Days since Sunday.
    pub weekday: u8,
    pub day: u8,
    pub month: u8,
    /// Year modulo 100.
    pub year: u8,
    pub second: u8,
}

impl ClockStamp {
    /// Encoded width in characters.
    pub const WIDTH: usize = 14;

    /// Capture the fields of a calendar date-time.
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self {
            minute: at.minute() as u8,
            hour: at.hour() as u8,
            weekday: at.weekday().num_days_from_sunday() as u8,
            day: at.day() as u8,
            month: at.month() as u8,
            year: at.year().rem_euclid(100) as u8,
            second: at.second() as u8,
        }
    }

    /// Current local time.
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Render the 14-character field.
    pub fn encode(&self) -> Result<String> {
        let fields = [
            ("clock.minute", self.minute),
            ("clock.hour", self.hour),
            ("clock.weekday", self.weekday),
            ("clock.day", self.day),
            ("clock.month", self.month),
            ("clock.year", self.year),
            ("clock.second", self.second),
        ];

        let mut writer = TextWriter::with_capacity(Self::WIDTH);
        for (field, value) in fields {
            if value > CLOCK_FIELD_MAX {
                return Err(BridgeError::OutOfRange { field });
            }
            writer.put_hex(value);
        }
        Ok(writer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};

    #[test]
    fn test_encode_renders_decimal_values_as_hex_digits() {
        let stamp = ClockStamp {
            minute: 25,
            hour: 9,
            weekday: 3,
            day: 15,
            month: 10,
            year: 26,
            second: 59,
        };
        // 25 -> 19, 9 -> 09, 3 -> 03, 15 -> 0f, 10 -> 0a, 26 -> 1a, 59 -> 3b
        assert_eq!(stamp.encode().unwrap(), "1909030f0a1a3b");
    }

    #[test]
    fn test_encode_rejects_values_above_99() {
        let stamp = ClockStamp {
            minute: 100,
            hour: 0,
            weekday: 0,
            day: 1,
            month: 1,
            year: 0,
            second: 0,
        };
        assert!(matches!(
            stamp.encode(),
            Err(BridgeError::OutOfRange { field: "clock.minute" })
        ));
    }

    #[test]
    fn test_encode_accepts_99() {
        let stamp = ClockStamp {
            minute: 0,
            hour: 0,
            weekday: 0,
            day: 1,
            month: 1,
            year: 99,
            second: 0,
        };
        assert_eq!(stamp.encode().unwrap(), "00000001016300");
    }

    #[test]
    fn test_from_datetime_field_order() {
        // 2026-10-16 is a Friday.
        let at = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(7, 42, 5)
            .unwrap()
            .and_utc();
        let stamp = ClockStamp::from_datetime(&at);

        assert_eq!(stamp.minute, 42);
        assert_eq!(stamp.hour, 7);
        assert_eq!(stamp.weekday, 5);
        assert_eq!(stamp.day, 16);
        assert_eq!(stamp.month, 10);
        assert_eq!(stamp.year, 26);
        assert_eq!(stamp.second, 5);
        assert_eq!(stamp.encode().unwrap().len(), ClockStamp::WIDTH);
    }

    #[test]
    fn test_from_datetime_uses_the_zone_of_the_value() {
        let utc = NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_opt(23, 30, 0)
            .unwrap()
            .and_utc();
        let plus_two = utc.with_timezone(&FixedOffset::east_opt(2 * 3600).unwrap());
        let stamp = ClockStamp::from_datetime(&plus_two);

        assert_eq!(stamp.hour, 1);
        assert_eq!(stamp.day, 1);
        assert_eq!(stamp.month, 1);
        assert_eq!(stamp.year, 25);
        // Tuesday in UTC, already Wednesday at +02:00.
        assert_eq!(ClockStamp::from_datetime(&utc.with_timezone(&Utc)).weekday, 2);
        assert_eq!(stamp.weekday, 3);
    }

    #[test]
    fn test_now_is_encodable() {
        assert_eq!(ClockStamp::now().encode().unwrap().len(), ClockStamp::WIDTH);
    }
}
