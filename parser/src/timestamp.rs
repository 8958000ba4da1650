//! Free-form timestamp recognition.
//!
//! Log lines carry timestamps in whatever layout the producing program
//! chose. [`normalize`] searches a timestamp field for the most plausible
//! date-time and returns it as a [`NominalTimestamp`].

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use tracing::trace;

/// Longest run of words tried as one date-time candidate.
const MAX_WINDOW: usize = 5;

/// Characters stripped from both ends of every word before parsing.
const NOISE: &[char] = &['[', ']', '(', ')', '{', '}', '<', '>', '"', '\'', ',', ';'];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%d/%b/%Y:%H:%M:%S",
    "%d-%b-%Y %H:%M:%S%.f",
    "%d %b %Y %H:%M:%S%.f",
    "%b %d %Y %H:%M:%S%.f",
    "%a %b %d %H:%M:%S %Y",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d/%b/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d %Y",
];

/// A wall-clock date-time read from a log line.
///
/// The value is *nominal*: it is whatever the log line said, with any UTC
/// offset discarded and no timezone conversion applied. It renders as
/// `YYYY-MM-DDTHH:MM:SS[.fff]Z`, but the trailing `Z` is only a label and
/// does not make the value a UTC instant. Compare and bucket these values
/// among themselves; do not mix them with real instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NominalTimestamp(NaiveDateTime);

impl NominalTimestamp {
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }
}

impl fmt::Display for NominalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Z", self.0.format("%Y-%m-%dT%H:%M:%S%.f"))
    }
}

/// Find a date-time inside `token`, ignoring surrounding noise.
///
/// Contiguous runs of words are tried longest first, then leftmost first.
/// A bare time without a date is not accepted. Returns `None` when nothing
/// in the token reads as a date.
pub fn normalize(token: &str) -> Option<NominalTimestamp> {
    let words: Vec<String> = token.split_whitespace().filter_map(clean_word).collect();

    for len in (1..=words.len().min(MAX_WINDOW)).rev() {
        for window in words.windows(len) {
            let candidate = window.join(" ");
            if let Some(value) = parse_candidate(&candidate) {
                return Some(NominalTimestamp(value));
            }
        }
    }

    trace!("No date-time recognised in {:?}", token);
    None
}

fn clean_word(word: &str) -> Option<String> {
    let word = word.trim_matches(NOISE);
    if word.is_empty() {
        return None;
    }
    // "10:00:00,123" is a comma-separated fraction, as Python's logging writes it
    if word.contains(':') {
        Some(word.replace(',', "."))
    } else {
        Some(word.to_string())
    }
}

fn parse_candidate(candidate: &str) -> Option<NaiveDateTime> {
    if let Ok(value) = DateTime::parse_from_rfc3339(candidate) {
        return plausible(value.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(candidate, format) {
            return plausible(value);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
            return plausible(date.and_time(NaiveTime::MIN));
        }
    }

    None
}

fn plausible(value: NaiveDateTime) -> Option<NaiveDateTime> {
    (1000..=9999).contains(&value.year()).then_some(value)
}
