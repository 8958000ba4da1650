// Parser crate for watched log files
// Format detection, line splitting, timestamp normalization and hourly aggregation

pub mod types;
pub mod format_detector;
pub mod timestamp;
pub mod parsers;
pub mod record_stream;

// Line parser implementations
pub mod line_parser;
pub mod legacy_parser;

// Analytics over parsed records
pub mod severity;
pub mod hourly;

// Re-export main types
pub use types::*;
pub use format_detector::detect_format;
pub use timestamp::{normalize, NominalTimestamp};
pub use parsers::{ParseMode, ParseOptions};
pub use record_stream::RecordStream;
pub use line_parser::{HeuristicParser, LineParser};
pub use legacy_parser::LegacyPipeParser;
pub use severity::{ScatterPoint, Severity, SeverityReport};
pub use hourly::{
    aggregate_file, merge, merge_files, AggregateError, AggregatedSeries, FileCounts,
    HourlyBucketKey, MergedSeries,
};
