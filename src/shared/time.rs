use std::fmt::Display;

use chrono::{Local, NaiveDate, Timelike};

/// Seconds since the start of a service day. Hours may run past 24 for trips
/// that continue after midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time(u32);

impl From<u32> for Time {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hms_string())
    }
}

impl Time {
    pub fn now() -> Self {
        let now = Local::now();
        Self(now.num_seconds_from_midnight())
    }

    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    /// Zero-padded "HH:MM:SS", the form stop times are stored and compared in.
    pub fn to_hms_string(&self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }

    pub fn from_hms(time: &str) -> Option<Self> {
        const HOUR_TO_SEC: u32 = 60 * 60;
        const MINUTE_TO_SEC: u32 = 60;
        let mut split = time.trim().split(':');
        let hours: u32 = split.next()?.parse().ok()?;
        let minutes: u32 = split.next()?.parse().ok()?;
        let seconds: u32 = split.next()?.parse().ok()?;
        if split.next().is_some() || minutes > 59 || seconds > 59 {
            return None;
        }
        hours
            .checked_mul(HOUR_TO_SEC)?
            .checked_add(minutes * MINUTE_TO_SEC + seconds)
            .map(Self)
    }
}

/// A calendar date in GTFS "YYYYMMDD" form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServiceDate(NaiveDate);

impl Display for ServiceDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_gtfs_string())
    }
}

impl From<NaiveDate> for ServiceDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl ServiceDate {
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(value, "%Y%m%d").ok().map(Self)
    }

    /// Lexical order of this string matches date order.
    pub fn to_gtfs_string(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

#[test]
fn parse_unparse_test() {
    for time in ["00:00:00", "00:00:30", "00:30:00", "12:00:00", "12:30:30"] {
        let stime = Time::from_hms(time).unwrap();
        assert_eq!(time, stime.to_hms_string())
    }
}

#[test]
fn valid_time_test() {
    assert_eq!(Time::from_hms("00:00:00").unwrap().as_seconds(), 0);
    assert_eq!(Time::from_hms("00:01:30").unwrap().as_seconds(), 90);
    assert_eq!(Time::from_hms("01:01:30").unwrap().as_seconds(), 3690);
}

#[test]
fn after_midnight_time_test() {
    let time = Time::from_hms("25:10:00").unwrap();
    assert_eq!(time.as_seconds(), 25 * 3600 + 600);
    assert_eq!(time.to_hms_string(), "25:10:00");
}

#[test]
fn unpadded_time_is_padded_test() {
    assert_eq!(Time::from_hms("7:05:00").unwrap().to_hms_string(), "07:05:00");
}

#[test]
fn invalid_time_test() {
    assert!(Time::from_hms("00:00:0a").is_none());
    assert!(Time::from_hms("00:00").is_none());
    assert!(Time::from_hms("00:61:00").is_none());
    assert!(Time::from_hms("00:00:00:00").is_none());
    assert!(Time::from_hms("4000000000:00:00").is_none());
}

#[test]
fn service_date_test() {
    let date = ServiceDate::parse("20240115").unwrap();
    assert_eq!(date.to_gtfs_string(), "20240115");
    assert!(ServiceDate::parse("2024-01-15").is_none());
    assert!(ServiceDate::parse("20241315").is_none());
}

#[test]
fn service_date_order_matches_string_order() {
    let a = ServiceDate::parse("20231231").unwrap();
    let b = ServiceDate::parse("20240101").unwrap();
    assert!(a < b);
    assert!(a.to_gtfs_string() < b.to_gtfs_string());
}
