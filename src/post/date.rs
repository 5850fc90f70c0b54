use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Canonical wire layout: `YYYYMMDDTHH:MM:SS`.
const WIRE_FORMAT: &str = "%Y%m%dT%H:%M:%S";

/// Display layout used by the post document: `MM/DD/YYYY HH:MM:SS`.
const DISPLAY_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// A post's creation time as exchanged with the server.
///
/// There is no timezone; the server interprets the value in the blog's
/// local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WireTimestamp(NaiveDateTime);

impl WireTimestamp {
    /// Build a timestamp from calendar fields, rejecting impossible dates.
    pub fn from_parts(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .map(WireTimestamp)
            .ok_or_else(|| {
                Error::format(format!(
                    "Date {:04}-{:02}-{:02} {:02}:{:02}:{:02} is out of range.",
                    year, month, day, hour, minute, second
                ))
            })
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    /// Render in the canonical wire form `YYYYMMDDTHH:MM:SS`.
    pub fn to_wire(&self) -> String {
        self.0.format(WIRE_FORMAT).to_string()
    }

    /// Render in the document form `MM/DD/YYYY HH:MM:SS` (24-hour).
    pub fn to_display(&self) -> String {
        self.0.format(DISPLAY_FORMAT).to_string()
    }

    /// Render as `YYYY-MM-DD HH:MM:SS` for listings.
    pub fn to_listing(&self) -> String {
        self.0.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl fmt::Display for WireTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Parse a document date `MM/DD/YYYY HH:MM:SS [AM|PM]`.
///
/// The meridiem token is case-insensitive. `12 AM` is midnight, `12 PM` is
/// noon, other PM hours gain twelve.
pub fn parse_display(value: &str) -> Result<WireTimestamp> {
    let invalid = || Error::format(format!("Date value \"{}\" is invalid.", value));

    let upper = value.trim().to_uppercase();
    let mut tokens = upper.split(' ');
    let date = tokens.next().ok_or_else(invalid)?;
    let time = tokens.next().ok_or_else(invalid)?;
    let meridiem = tokens.next();
    if tokens.next().is_some() {
        return Err(invalid());
    }

    let date: Vec<&str> = date.split('/').collect();
    let time: Vec<&str> = time.split(':').collect();
    if date.len() != 3 || time.len() != 3 {
        return Err(invalid());
    }

    let month = fixed_digits(date[0], 2).ok_or_else(invalid)?;
    let day = fixed_digits(date[1], 2).ok_or_else(invalid)?;
    let year = fixed_digits(date[2], 4).ok_or_else(invalid)?;
    let mut hour = fixed_digits(time[0], 2).ok_or_else(invalid)?;
    let minute = fixed_digits(time[1], 2).ok_or_else(invalid)?;
    let second = fixed_digits(time[2], 2).ok_or_else(invalid)?;

    match meridiem {
        None => {}
        Some("AM") => {
            if hour == 12 {
                hour = 0;
            }
        }
        Some("PM") => {
            if hour != 12 {
                hour += 12;
            }
        }
        Some(other) => {
            return Err(Error::format(format!("Expect (AM|PM) get \"{}\"", other)));
        }
    }

    WireTimestamp::from_parts(year as i32, month, day, hour, minute, second)
}

/// Decode a wire timestamp as servers actually send it.
///
/// Accepts `YYYYMMDDTHH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, a space instead of
/// the `T`, and time parts with or without colons. Anything after the
/// seconds (fractions, zone designators) is ignored.
pub fn parse_wire(value: &str) -> Result<WireTimestamp> {
    let invalid = || {
        Error::format(format!(
            "\"{}\" is not a correct ISO8601 date format",
            value
        ))
    };

    let mut cursor = WireCursor::new(value.trim().as_bytes());
    let year = cursor.digits(4).ok_or_else(invalid)?;
    cursor.skip(b'-');
    let month = cursor.digits(2).ok_or_else(invalid)?;
    cursor.skip(b'-');
    let day = cursor.digits(2).ok_or_else(invalid)?;
    if !cursor.skip(b'T') && !cursor.skip(b' ') {
        return Err(invalid());
    }
    let hour = cursor.digits(2).ok_or_else(invalid)?;
    cursor.skip(b':');
    let minute = cursor.digits(2).ok_or_else(invalid)?;
    cursor.skip(b':');
    let second = cursor.digits(2).ok_or_else(invalid)?;

    WireTimestamp::from_parts(year as i32, month, day, hour, minute, second)
}

/// Convert a document date straight to its canonical wire form.
pub fn display_to_wire(value: &str) -> Result<String> {
    parse_display(value).map(|ts| ts.to_wire())
}

/// Convert any accepted wire spelling to the document date form.
pub fn wire_to_display(value: &str) -> Result<String> {
    parse_wire(value).map(|ts| ts.to_display())
}

fn fixed_digits(field: &str, width: usize) -> Option<u32> {
    if field.len() != width || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

struct WireCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WireCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        WireCursor { bytes, pos: 0 }
    }

    fn digits(&mut self, width: usize) -> Option<u32> {
        let end = self.pos + width;
        let field = self.bytes.get(self.pos..end)?;
        if !field.iter().all(u8::is_ascii_digit) {
            return None;
        }
        self.pos = end;
        Some(field.iter().fold(0, |acc, b| acc * 10 + u32::from(b - b'0')))
    }

    fn skip(&mut self, expected: u8) -> bool {
        if self.bytes.get(self.pos) == Some(&expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_display_to_wire_24_hour() {
        assert_eq!(
            display_to_wire("11/19/2005 08:30:00").unwrap(),
            "20051119T08:30:00"
        );
        assert_eq!(
            display_to_wire("01/02/2003 23:59:58").unwrap(),
            "20030102T23:59:58"
        );
    }

    #[test]
    fn test_meridiem_boundaries() {
        assert_eq!(
            display_to_wire("12/25/2020 12:00:00 AM").unwrap(),
            "20201225T00:00:00"
        );
        assert_eq!(
            display_to_wire("12/25/2020 12:00:00 PM").unwrap(),
            "20201225T12:00:00"
        );
        assert_eq!(
            display_to_wire("12/25/2020 01:00:00 PM").unwrap(),
            "20201225T13:00:00"
        );
        assert_eq!(
            display_to_wire("12/25/2020 11:15:00 am").unwrap(),
            "20201225T11:15:00"
        );
    }

    #[test]
    fn test_bad_meridiem_rejected() {
        let err = display_to_wire("12/25/2020 01:00:00 XM").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("XM"));
    }

    #[test]
    fn test_malformed_display_dates() {
        for value in [
            "",
            "12/25/2020",
            "2020-12-25 01:00:00",
            "1/2/2020 01:00:00",
            "12/25/2020 01:00",
            "12/25/2020 01:00:00 PM extra",
            "13/25/2020 01:00:00",
            "02/30/2020 01:00:00",
            "12/25/2020 11:00:00  PM",
        ] {
            let err = display_to_wire(value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{:?} should fail", value);
        }
    }

    #[test]
    fn test_wire_variants() {
        for value in [
            "20051119T08:30:00",
            "2005-11-19T08:30:00",
            "2005-11-19 08:30:00",
            "20051119T083000",
            "20051119T08:30:00Z",
            "2005-11-19T08:30:00.000+10:00",
        ] {
            assert_eq!(
                wire_to_display(value).unwrap(),
                "11/19/2005 08:30:00",
                "{:?}",
                value
            );
        }
    }

    #[test]
    fn test_wire_rejects_garbage() {
        for value in ["", "yesterday", "2005/11/19 08:30:00", "20051119", "051119T08:30:00"] {
            let err = wire_to_display(value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{:?} should fail", value);
        }
    }

    #[test]
    fn test_round_trip_is_identity_on_canonical_form() {
        for wire in [
            "20051119T08:30:00",
            "19991231T23:59:59",
            "20200229T00:00:00",
            "20240101T12:00:00",
        ] {
            let display = wire_to_display(wire).unwrap();
            assert_eq!(display_to_wire(&display).unwrap(), wire);
        }
    }

    #[test]
    fn test_accessors_and_listing() {
        let ts = parse_wire("20051119T08:30:05").unwrap();
        assert_eq!(
            (ts.year(), ts.month(), ts.day(), ts.hour(), ts.minute(), ts.second()),
            (2005, 11, 19, 8, 30, 5)
        );
        assert_eq!(ts.to_listing(), "2005-11-19 08:30:05");
        assert_eq!(ts.to_string(), "20051119T08:30:05");
    }
}
