use crate::LogRecord;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Coarse severity used for the single-file histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warn,
    Info,
    Debug,
    Other,
}

impl Severity {
    /// Checked in this order; the first token contained in the level wins.
    const PRIORITY: [Severity; 4] = [Severity::Error, Severity::Warn, Severity::Info, Severity::Debug];

    /// Classify a raw level field by substring containment.
    ///
    /// Unknown levels are `Other`, so every record lands in exactly one bucket.
    pub fn classify(level: &str) -> Self {
        Self::PRIORITY
            .into_iter()
            .find(|severity| level.contains(severity.as_str()))
            .unwrap_or(Severity::Other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warn => "WARN",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
            Severity::Other => "OTHER",
        }
    }
}

/// One dot of the "events by hour" scatter plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub hour: u32,
    /// Vertical offset in `[0, 1)`, only there to keep dots from overlapping.
    pub jitter: f64,
    pub severity: Severity,
}

/// Severity histogram of one file plus the points for its scatter plot.
#[derive(Debug, Clone, Default)]
pub struct SeverityReport {
    pub levels: BTreeMap<Severity, usize>,
    pub points: Vec<ScatterPoint>,
}

impl SeverityReport {
    pub fn from_records<I, R>(records: I, rng: &mut R) -> Self
    where
        I: IntoIterator<Item = LogRecord>,
        R: Rng,
    {
        let mut report = Self::default();
        for record in records {
            report.push(&record, rng);
        }
        report
    }

    /// Count a record and add its scatter point. Records without a
    /// timestamp are ignored.
    pub fn push<R: Rng>(&mut self, record: &LogRecord, rng: &mut R) {
        let Some(ts) = record.timestamp else {
            return;
        };

        let severity = Severity::classify(&record.level);
        *self.levels.entry(severity).or_insert(0) += 1;
        self.points.push(ScatterPoint {
            hour: ts.hour(),
            jitter: rng.random_range(0.0..1.0),
            severity,
        });
    }

    pub fn total(&self) -> usize {
        self.levels.values().sum()
    }
}
