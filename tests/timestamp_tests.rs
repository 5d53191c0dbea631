// tests/timestamp_tests.rs
use deltat_rs::record::timestamp::{encode_timestamp, TimestampMatcher};
use deltat_rs::{DeltaTWriter, NoNavigation, ParserConfig, PingHeader, SwathCursor};
use chrono::{TimeZone, Utc};
use std::io::Cursor;

fn channel(times: &[i64]) -> Vec<u8> {
    let mut writer = DeltaTWriter::new(Vec::new());
    for &t in times {
        writer.write_ping(&PingHeader::new(2, false, t), &[100, 100], None).unwrap();
    }
    writer.into_inner().unwrap()
}

fn cursor(times: &[i64]) -> SwathCursor<Cursor<Vec<u8>>, NoNavigation> {
    SwathCursor::from_reader(Cursor::new(channel(times)), NoNavigation, &ParserConfig::default()).unwrap()
}

#[test]
fn test_header_timestamp_is_utc() {
    let t = Utc.with_ymd_and_hms(2014, 11, 12, 10, 20, 30).unwrap().timestamp_millis() + 456;
    let mut c = cursor(&[t]);
    let header = c.next_header().unwrap().unwrap();
    assert_eq!(header.timestamp_ms, t);
}

#[test]
fn test_every_month_round_trips() {
    let matcher = TimestampMatcher::new().unwrap();
    for month in 1..=12 {
        let t = Utc.with_ymd_and_hms(2021, month, 28, 23, 59, 59).unwrap().timestamp_millis() + 999;
        let (date_time, millis) = encode_timestamp(t).unwrap();
        assert_eq!(matcher.parse(&date_time, &millis).unwrap(), t, "month {month}");
    }
}

#[test]
fn test_leap_day() {
    let matcher = TimestampMatcher::new().unwrap();
    let mut date_time = [0u8; 25];
    date_time[..11].copy_from_slice(b"29-Feb-2016");
    date_time[12..20].copy_from_slice(b"00:00:01");
    let t = matcher.parse(&date_time, b".250\0").unwrap();
    assert_eq!(t, Utc.with_ymd_and_hms(2016, 2, 29, 0, 0, 1).unwrap().timestamp_millis() + 250);

    date_time[..11].copy_from_slice(b"29-Feb-2015");
    assert!(matcher.parse(&date_time, b".250\0").is_err());
}

#[test]
fn test_seek_returns_first_at_or_after() {
    let base = 1_600_000_000_000;
    let times: Vec<i64> = (0..10).map(|i| base + i * 1000).collect();
    let mut c = cursor(&times);

    for &target in &[base - 5, base, base + 1, base + 4_500, base + 9_000] {
        let expected = times.iter().copied().find(|&t| t >= target).unwrap();
        assert_eq!(c.seek_to(target).unwrap().unwrap().timestamp_ms, expected, "target {target}");
    }
    assert!(c.seek_to(base + 9_001).unwrap().is_none());
}

#[test]
fn test_seek_with_repeated_timestamps() {
    let base = 1_600_000_000_000;
    let mut c = cursor(&[base, base + 10, base + 10, base + 20]);

    let swath = c.seek_to(base + 10).unwrap().unwrap();
    assert_eq!(swath.timestamp_ms, base + 10);
    // first of the two equal pings
    assert_eq!(c.position(), 2 * 260);
}

#[test]
fn test_sequence_after_seek_continues() {
    let base = 1_600_000_000_000;
    let mut c = cursor(&[base, base + 10, base + 20, base + 30]);
    c.seek_to(base + 15).unwrap();
    assert_eq!(c.next().unwrap().unwrap().timestamp_ms, base + 30);
    assert!(c.next().unwrap().is_none());
}
