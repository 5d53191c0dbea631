// src/record/timestamp.rs
use chrono::{Datelike, NaiveDate, TimeZone, Timelike, Utc};
use regex::bytes::Regex;

/// Bytes 8..33: `"DD-MON-YYYY\0"`, `"HH:MM:SS\0"`, `".hh\0"`
pub const DATE_TIME_LEN: usize = 25;

/// Bytes 112..117: `".mmm\0"`
pub const MILLIS_LEN: usize = 5;

const DATE_TIME_PATTERN: &str =
    r"(?-u)^([0-9]{2})-([A-Za-z]{3})-([0-9]{4})\x00([0-9]{2}):([0-9]{2}):([0-9]{2})";

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Month abbreviation to 0-based month index, ignoring case
pub fn month_index(abbrev: &[u8]) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| m.as_bytes().eq_ignore_ascii_case(abbrev))
        .map(|i| i as u32)
}

/// Parses the ASCII ping timestamp of an 83P header.
///
/// The pattern is compiled when the matcher is built; hold one per decoder.
#[derive(Debug, Clone)]
pub struct TimestampMatcher {
    pattern: Regex,
}

impl TimestampMatcher {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(TimestampMatcher {
            pattern: Regex::new(DATE_TIME_PATTERN)?,
        })
    }

    /// Epoch milliseconds (UTC) from the date/time field and the milliseconds field
    pub fn parse(&self, date_time: &[u8], millis: &[u8]) -> Result<i64, String> {
        let caps = self
            .pattern
            .captures(date_time)
            .ok_or_else(|| format!("date/time {:?} does not match DD-MON-YYYY HH:MM:SS", String::from_utf8_lossy(date_time)))?;

        let number = |i: usize| -> Result<u32, String> {
            let field = caps.get(i).map(|m| m.as_bytes()).unwrap_or_default();
            std::str::from_utf8(field)
                .ok()
                .and_then(|s| s.parse::<u32>().ok())
                .ok_or_else(|| format!("non-numeric field {}", String::from_utf8_lossy(field)))
        };

        let month_field = caps.get(2).map(|m| m.as_bytes()).unwrap_or_default();
        let month = month_index(month_field)
            .ok_or_else(|| format!("unknown month {:?}", String::from_utf8_lossy(month_field)))?;

        let day = number(1)?;
        let year = number(3)?;
        let (hour, minute, second) = (number(4)?, number(5)?, number(6)?);

        let date_time = NaiveDate::from_ymd_opt(year as i32, month + 1, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .ok_or_else(|| format!("{day:02}-{}-{year} {hour:02}:{minute:02}:{second:02} is not a valid instant", MONTHS[month as usize]))?;

        let millis = parse_millis(millis)?;
        Ok(Utc.from_utc_datetime(&date_time).timestamp_millis() + millis)
    }
}

/// `".mmm"` to milliseconds. An empty (all NUL) field counts as zero.
fn parse_millis(field: &[u8]) -> Result<i64, String> {
    let trimmed: Vec<u8> = field
        .iter()
        .copied()
        .take_while(|&b| b != 0)
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let digits = trimmed.strip_prefix(b".").unwrap_or(&trimmed[..]);

    if digits.is_empty() {
        return Ok(0);
    }
    if digits.len() > 3 || !digits.iter().all(u8::is_ascii_digit) {
        return Err(format!("malformed milliseconds {:?}", String::from_utf8_lossy(field)));
    }

    // ".5" is half a second
    let mut value = 0i64;
    for i in 0..3 {
        let d = digits.get(i).map(|b| (b - b'0') as i64).unwrap_or(0);
        value = value * 10 + d;
    }
    Ok(value)
}

/// Render epoch milliseconds into the two ASCII timestamp fields
pub fn encode_timestamp(epoch_ms: i64) -> Option<([u8; DATE_TIME_LEN], [u8; MILLIS_LEN])> {
    let dt = Utc.timestamp_millis_opt(epoch_ms).single()?;
    if !(0..=9999).contains(&dt.year()) {
        return None;
    }
    let millis = dt.timestamp_subsec_millis();

    let mut date_time = [0u8; DATE_TIME_LEN];
    let date = format!("{:02}-{}-{:04}", dt.day(), MONTHS[dt.month0() as usize], dt.year());
    let time = format!("{:02}:{:02}:{:02}", dt.hour(), dt.minute(), dt.second());
    let hundredths = format!(".{:02}", millis / 10);
    date_time[0..11].copy_from_slice(date.as_bytes());
    date_time[12..20].copy_from_slice(time.as_bytes());
    date_time[21..24].copy_from_slice(hundredths.as_bytes());

    let mut millis_field = [0u8; MILLIS_LEN];
    millis_field[0..4].copy_from_slice(format!(".{millis:03}").as_bytes());

    Some((date_time, millis_field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(s: &str) -> Vec<u8> {
        s.replace('|', "\0").into_bytes()
    }

    #[test]
    fn test_month_index_case_insensitive() {
        assert_eq!(month_index(b"JAN"), Some(0));
        assert_eq!(month_index(b"jul"), Some(6));
        assert_eq!(month_index(b"Dec"), Some(11));
        assert_eq!(month_index(b"XYZ"), None);
    }

    #[test]
    fn test_parse_known_instant() {
        let m = TimestampMatcher::new().unwrap();
        let ts = m.parse(&field("12-NOV-2014|10:20:30|.45|"), &field(".456|")).unwrap();
        // 2014-11-12T10:20:30.456Z
        assert_eq!(ts, 1_415_787_630_456);
    }

    #[test]
    fn test_parse_lowercase_month() {
        let m = TimestampMatcher::new().unwrap();
        let upper = m.parse(&field("01-MAR-2020|00:00:00|"), &field(".000|")).unwrap();
        let lower = m.parse(&field("01-mar-2020|00:00:00|"), &field(".000|")).unwrap();
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let m = TimestampMatcher::new().unwrap();
        assert!(m.parse(&field("garbage garbage garb"), &field(".000|")).is_err());
        assert!(m.parse(&field("12-FOO-2014|10:20:30|"), &field(".000|")).is_err());
        assert!(m.parse(&field("31-FEB-2014|10:20:30|"), &field(".000|")).is_err());
        assert!(m.parse(&field("12-NOV-2014|10:20:30|"), &field(".4x6|")).is_err());
    }

    #[test]
    fn test_millis_variants() {
        assert_eq!(parse_millis(b"\0\0\0\0\0").unwrap(), 0);
        assert_eq!(parse_millis(b".007\0").unwrap(), 7);
        assert_eq!(parse_millis(b".5\0\0\0").unwrap(), 500);
        assert_eq!(parse_millis(b"123\0\0").unwrap(), 123);
    }

    #[test]
    fn test_encode_then_parse() {
        let m = TimestampMatcher::new().unwrap();
        let ts = 1_415_787_630_456;
        let (date_time, millis) = encode_timestamp(ts).unwrap();
        assert_eq!(&date_time[0..11], b"12-NOV-2014");
        assert_eq!(&millis[0..4], b".456");
        assert_eq!(m.parse(&date_time, &millis).unwrap(), ts);
    }
}
