//! Conversion between the plain-timed (`HH:MM:SS,mmm`) and styled
//! (`H:MM:SS.cc`) timestamp notations.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use crate::error::{Result, SubtitleError};

static PLAIN_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):([0-5]\d):([0-5]\d),(\d{3})$").expect("valid regex"));

static STYLED_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):([0-5]\d):([0-5]\d)\.(\d{2})$").expect("valid regex"));

/// A wall-clock offset with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Timestamp {
    millis: u64,
}

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Truncates to whole milliseconds. Negative and non-finite inputs clamp to zero.
    pub fn from_seconds(seconds: f64) -> Self {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Self::default();
        }
        // The epsilon keeps values like 0.29 from landing on 289.999...
        Self {
            millis: (seconds * 1000.0 + 1e-6).floor() as u64,
        }
    }

    pub fn millis(&self) -> u64 {
        self.millis
    }

    pub fn as_seconds(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    /// Parse `HH:MM:SS,mmm`. The hour field may have any number of digits.
    pub fn parse_plain(s: &str) -> Result<Self> {
        let caps = PLAIN_TIME
            .captures(s.trim())
            .ok_or_else(|| SubtitleError::MalformedTimestamp(s.to_string()))?;
        let field = |i: usize| -> Result<u64> {
            caps[i]
                .parse()
                .map_err(|_| SubtitleError::MalformedTimestamp(s.to_string()))
        };
        let (h, m, sec, ms) = (field(1)?, field(2)?, field(3)?, field(4)?);
        total_millis(h, m, sec, ms)
            .map(Self::from_millis)
            .ok_or_else(|| SubtitleError::MalformedTimestamp(s.to_string()))
    }

    /// Parse `H:MM:SS.cc`.
    pub fn parse_styled(s: &str) -> Result<Self> {
        let caps = STYLED_TIME
            .captures(s.trim())
            .ok_or_else(|| SubtitleError::MalformedTimestamp(s.to_string()))?;
        let field = |i: usize| -> Result<u64> {
            caps[i]
                .parse()
                .map_err(|_| SubtitleError::MalformedTimestamp(s.to_string()))
        };
        let (h, m, sec, cs) = (field(1)?, field(2)?, field(3)?, field(4)?);
        total_millis(h, m, sec, cs * 10)
            .map(Self::from_millis)
            .ok_or_else(|| SubtitleError::MalformedTimestamp(s.to_string()))
    }

    fn parts(&self) -> (u64, u64, u64, u64) {
        let ms = self.millis % 1000;
        let total_secs = self.millis / 1000;
        (total_secs / 3600, (total_secs / 60) % 60, total_secs % 60, ms)
    }

    /// Format as `HH:MM:SS,mmm`.
    pub fn to_plain(&self) -> String {
        let (h, m, s, ms) = self.parts();
        format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
    }

    /// Format as `H:MM:SS.cc`, truncating to centiseconds.
    pub fn to_styled(&self) -> String {
        let (h, m, s, ms) = self.parts();
        format!("{}:{:02}:{:02}.{:02}", h, m, s, ms / 10)
    }
}

/// `None` when the hour field is too large to represent.
fn total_millis(h: u64, m: u64, s: u64, ms: u64) -> Option<u64> {
    h.checked_mul(3600)?
        .checked_add(m * 60 + s)?
        .checked_mul(1000)?
        .checked_add(ms)
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_styled())
    }
}

/// `00:01:02,999` -> `0:01:02.99`
pub fn plain_to_styled(t: &str) -> Result<String> {
    Ok(Timestamp::parse_plain(t)?.to_styled())
}

/// `0:01:02.99` -> `00:01:02,990`
pub fn styled_to_plain(t: &str) -> Result<String> {
    Ok(Timestamp::parse_styled(t)?.to_plain())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_to_styled_truncates_millis() {
        assert_eq!(plain_to_styled("00:00:01,005").unwrap(), "0:00:01.00");
        assert_eq!(plain_to_styled("00:01:02,999").unwrap(), "0:01:02.99");
        assert_eq!(plain_to_styled("01:00:00,120").unwrap(), "1:00:00.12");
    }

    #[test]
    fn test_plain_to_styled_long_hours() {
        assert_eq!(plain_to_styled("123:04:05,678").unwrap(), "123:04:05.67");
    }

    #[test]
    fn test_malformed_timestamp() {
        for bad in ["", "00:00:01.000", "0:0:1,000", "aa:bb:cc,ddd", "00:00:01,00"] {
            match plain_to_styled(bad) {
                Err(SubtitleError::MalformedTimestamp(s)) => assert_eq!(s, bad),
                other => panic!("expected MalformedTimestamp for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_styled_to_plain() {
        assert_eq!(styled_to_plain("0:01:02.99").unwrap(), "00:01:02,990");
        assert!(styled_to_plain("00:01:02,990").is_err());
    }

    #[test]
    fn test_from_seconds() {
        assert_eq!(Timestamp::from_seconds(1.5).to_plain(), "00:00:01,500");
        assert_eq!(Timestamp::from_seconds(-3.0).millis(), 0);
        assert_eq!(Timestamp::from_seconds(3661.25).to_styled(), "1:01:01.25");
    }

    #[test]
    fn test_from_seconds_truncates() {
        assert_eq!(Timestamp::from_seconds(1.9996).to_plain(), "00:00:01,999");
        assert_eq!(Timestamp::from_seconds(0.29).millis(), 290);
        assert_eq!(Timestamp::from_seconds(0.4).millis(), 400);
    }

    #[test]
    fn test_hour_overflow_is_malformed() {
        let plain = "99999999999999999:00:00,000";
        assert!(matches!(
            plain_to_styled(plain),
            Err(SubtitleError::MalformedTimestamp(s)) if s == plain
        ));
        let styled = "99999999999999999:00:00.00";
        assert!(matches!(
            styled_to_plain(styled),
            Err(SubtitleError::MalformedTimestamp(s)) if s == styled
        ));
        // Hours beyond u64 fail at the digit parse.
        assert!(plain_to_styled("999999999999999999999:00:00,000").is_err());
    }

    #[test]
    fn test_minutes_and_seconds_out_of_range() {
        for bad in ["00:99:99,000", "00:60:00,000", "00:00:60,000"] {
            assert!(plain_to_styled(bad).is_err(), "{} accepted", bad);
        }
        assert!(styled_to_plain("0:60:00.00").is_err());
        assert_eq!(plain_to_styled("00:59:59,999").unwrap(), "0:59:59.99");
    }
}
