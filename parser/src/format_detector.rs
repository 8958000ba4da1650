use crate::{FormatSpec, ParseError, KNOWN_LEVELS};
use tracing::{debug, warn};

/// Delimiters tried against the first line, highest priority first.
pub const DELIMITER_CANDIDATES: [&str; 6] = [" | ", " - ", " : ", "|", "-", ":"];

/// Infer the line shape of a file from its first non-blank line.
///
/// The first candidate that occurs exactly 2 or 3 times wins. The level
/// column is then located by scanning the split fields for a known severity
/// token.
pub fn detect_format(first_line: &str) -> Result<FormatSpec, ParseError> {
    let delimiter = detect_delimiter(first_line).ok_or_else(|| {
        warn!("No usable delimiter in first line: {:?}", first_line);
        ParseError::FormatDetection {
            line: first_line.to_string(),
        }
    })?;

    let level_column_index = detect_level_column(first_line, delimiter);
    debug!(
        "Detected delimiter {:?}, level column {:?}",
        delimiter, level_column_index
    );

    Ok(FormatSpec {
        delimiter: delimiter.to_string(),
        level_column_index,
    })
}

/// Returns the first candidate occurring exactly 2 or 3 times in `line`.
pub fn detect_delimiter(line: &str) -> Option<&'static str> {
    DELIMITER_CANDIDATES
        .iter()
        .copied()
        .find(|candidate| matches!(line.matches(*candidate).count(), 2 | 3))
}

/// Index of the first field that is exactly one of [`KNOWN_LEVELS`].
pub fn detect_level_column(line: &str, delimiter: &str) -> Option<usize> {
    line.split(delimiter)
        .map(str::trim)
        .position(|field| KNOWN_LEVELS.contains(&field))
}
