//! Publication-date normalisation.
//!
//! Feeds disagree wildly on date formats.  Everything funnels through
//! [`normalize`], which returns either a UTC timestamp or `None`; it never
//! errors and never returns a naive or non-UTC value.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Anything a collector might hand us as a date.
#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Missing,
    Text(&'a str),
    Naive(NaiveDateTime),
    Fixed(DateTime<FixedOffset>),
    Utc(DateTime<Utc>),
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(s: &'a str) -> Self {
        DateInput::Text(s)
    }
}

impl<'a> From<Option<&'a str>> for DateInput<'a> {
    fn from(s: Option<&'a str>) -> Self {
        s.map_or(DateInput::Missing, DateInput::Text)
    }
}

impl From<NaiveDateTime> for DateInput<'_> {
    fn from(dt: NaiveDateTime) -> Self {
        DateInput::Naive(dt)
    }
}

impl From<DateTime<FixedOffset>> for DateInput<'_> {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        DateInput::Fixed(dt)
    }
}

impl From<DateTime<Utc>> for DateInput<'_> {
    fn from(dt: DateTime<Utc>) -> Self {
        DateInput::Utc(dt)
    }
}

/// Zone abbreviations seen in RFC 822 style feeds, as numeric offsets.
const NAMED_ZONES: &[(&str, &str)] = &[
    ("GMT", "+0000"),
    ("UT", "+0000"),
    ("UTC", "+0000"),
    ("Z", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("BST", "+0100"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
];

/// Explicit formats carrying their own offset, tried after the flexible pass.
const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Explicit formats that end in a literal `Z`.
const ZULU_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ"];

/// Explicit formats without zone information; interpreted as local time.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
];

/// Normalise any supported date representation to UTC.
pub fn normalize(input: DateInput<'_>) -> Option<DateTime<Utc>> {
    match input {
        DateInput::Missing => None,
        DateInput::Text(s) => normalize_str(s),
        DateInput::Naive(dt) => Some(local_to_utc(dt)),
        DateInput::Fixed(dt) => Some(dt.with_timezone(&Utc)),
        DateInput::Utc(dt) => Some(dt),
    }
}

/// Parse a date string, trying the flexible parsers first and then the
/// explicit format list.  The first successful parse wins.
pub fn normalize_str(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("none") {
        return None;
    }

    if let Some(dt) = parse_flexible(s) {
        return Some(dt);
    }

    let zoned = substitute_zone(s);
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&zoned, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ZULU_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(local_to_utc(dt));
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(local_to_utc);
    }

    tracing::debug!(raw = s, "No date format matched");
    None
}

/// RFC 3339 and RFC 2822, the two formats feeds are supposed to use.
fn parse_flexible(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    DateTime::parse_from_rfc2822(&substitute_zone(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Replace a trailing zone abbreviation (`GMT`, `CEST`, ...) with its offset.
fn substitute_zone(s: &str) -> Cow<'_, str> {
    let Some((head, tail)) = s.rsplit_once(' ') else {
        return Cow::Borrowed(s);
    };
    let upper = tail.to_ascii_uppercase();
    NAMED_ZONES
        .iter()
        .find(|(name, _)| *name == upper)
        .map_or(Cow::Borrowed(s), |(_, offset)| {
            Cow::Owned(format!("{head} {offset}"))
        })
}

/// Treat a naive timestamp as local time.  If the local zone cannot map it
/// (a DST gap), assume it was UTC already.
fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// `serde` hook for stored timestamps that may predate strict RFC 3339.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(normalize_str))
}
