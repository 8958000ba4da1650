use crate::timestamp::NominalTimestamp;

/// Severity tokens recognised when locating the level column of a line.
pub const KNOWN_LEVELS: [&str; 5] = ["INFO", "DEBUG", "WARNING", "ERROR", "CRITICAL"];

/// Line shape inferred from the first non-blank line of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub delimiter: String,
    /// Field index holding the severity, `None` when no known token was seen.
    pub level_column_index: Option<usize>,
}

/// One line split into its three meaningful fields, borrowed from the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFields<'a> {
    pub timestamp: &'a str,
    pub level: &'a str,
    pub message: &'a str,
}

/// A parsed log line. Lives for one request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// `None` when the timestamp token could not be normalized.
    pub timestamp: Option<NominalTimestamp>,
    /// The timestamp field exactly as it appeared in the line.
    pub raw_timestamp: String,
    pub level: String,
    pub message: String,
}

impl LogRecord {
    /// Timestamp for display: the nominal value, or the raw token when it
    /// could not be normalized.
    pub fn display_timestamp(&self) -> String {
        match &self.timestamp {
            Some(ts) => ts.to_string(),
            None => self.raw_timestamp.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to detect log format: no delimiter occurs 2 or 3 times in {line:?}")]
    FormatDetection { line: String },
}
