use crate::parsers::ParseOptions;
use crate::record_stream::RecordStream;
use crate::timestamp::NominalTimestamp;
use crate::{LogRecord, ParseError};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// An hour of one calendar day.
///
/// Ordering compares the structured `(date, hour)` pair, so hour 2 sorts
/// before hour 10 on the same day and every hour of a day sorts before the
/// next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourlyBucketKey {
    pub date: NaiveDate,
    pub hour: u32,
}

impl HourlyBucketKey {
    /// The date as the number `YYYYMMDD`.
    pub fn date_code(&self) -> u32 {
        self.date.year() as u32 * 10_000 + self.date.month() * 100 + self.date.day()
    }
}

impl From<NominalTimestamp> for HourlyBucketKey {
    fn from(ts: NominalTimestamp) -> Self {
        Self {
            date: ts.date(),
            hour: ts.hour(),
        }
    }
}

impl fmt::Display for HourlyBucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08} {:02}", self.date_code(), self.hour)
    }
}

/// Per-hour event counts of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedSeries {
    pub name: String,
    buckets: BTreeMap<HourlyBucketKey, usize>,
}

impl AggregatedSeries {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buckets: BTreeMap::new(),
        }
    }

    pub fn from_records<I>(name: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = LogRecord>,
    {
        let mut series = Self::new(name);
        for record in records {
            series.push(&record);
        }
        series
    }

    /// Count a record in its hour. Returns `false` for a record without a
    /// timestamp, which is dropped.
    pub fn push(&mut self, record: &LogRecord) -> bool {
        match record.timestamp {
            Some(ts) => {
                *self.buckets.entry(HourlyBucketKey::from(ts)).or_insert(0) += 1;
                true
            }
            None => false,
        }
    }

    /// Buckets in chronological order.
    pub fn buckets(&self) -> impl Iterator<Item = (HourlyBucketKey, usize)> + '_ {
        self.buckets.iter().map(|(key, count)| (*key, *count))
    }

    pub fn count(&self, key: &HourlyBucketKey) -> usize {
        self.buckets.get(key).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Counts of one file aligned to [`MergedSeries::axis`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCounts {
    pub name: String,
    pub counts: Vec<usize>,
}

/// Several files' hourly counts on one shared, sorted axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedSeries {
    pub axis: Vec<HourlyBucketKey>,
    pub files: Vec<FileCounts>,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("No log data found in the watched files")]
    NoData,
}

/// Align every series onto the sorted union of their bucket keys.
///
/// Fails with [`AggregateError::NoData`] when no series has a single bucket.
pub fn merge(series: &[AggregatedSeries]) -> Result<MergedSeries, AggregateError> {
    let axis: Vec<HourlyBucketKey> = series
        .iter()
        .flat_map(|s| s.buckets.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if axis.is_empty() {
        return Err(AggregateError::NoData);
    }

    let files = series
        .iter()
        .map(|s| FileCounts {
            name: s.name.clone(),
            counts: axis.iter().map(|key| s.count(key)).collect(),
        })
        .collect();

    debug!("Merged {} series onto {} hourly buckets", series.len(), axis.len());
    Ok(MergedSeries { axis, files })
}

/// Read one file and count its records per hour.
pub fn aggregate_file(
    name: &str,
    path: &Path,
    options: &ParseOptions,
) -> Result<AggregatedSeries, ParseError> {
    let mut series = AggregatedSeries::new(name);
    let mut dropped = 0usize;

    for record in RecordStream::open(path, options)? {
        if !series.push(&record?) {
            dropped += 1;
        }
    }

    if dropped > 0 {
        debug!("{}: {} records without a usable timestamp", name, dropped);
    }
    Ok(series)
}

/// Aggregate and merge several files.
///
/// A file that cannot be opened or parsed is logged and left out; the
/// remaining files are still merged.
pub fn merge_files<'a, I>(files: I, options: &ParseOptions) -> Result<MergedSeries, AggregateError>
where
    I: IntoIterator<Item = (&'a str, &'a Path)>,
{
    let mut series = Vec::new();

    for (name, path) in files {
        match aggregate_file(name, path, options) {
            Ok(s) => series.push(s),
            Err(e) => warn!("Skipping {} in hourly merge: {}", path.display(), e),
        }
    }

    info!("Hourly merge over {} readable files", series.len());
    merge(&series)
}
