use crate::format_detector::detect_format;
use crate::{FormatSpec, LineFields, ParseError};

/// Splits raw log lines into timestamp, level and message.
///
/// An implementation first derives a [`FormatSpec`] from the first non-blank
/// line of a file, then applies it to every line of that file.
pub trait LineParser: Send + Sync {
    /// Returns the name of this parser (e.g., "heuristic", "legacy")
    fn name(&self) -> &'static str;

    /// Derive the format of a file from its first non-blank line.
    fn detect(&self, first_line: &str) -> Result<FormatSpec, ParseError>;

    /// Split one line. `None` means the line is skipped; this is not an error.
    fn parse_line<'a>(&self, line: &'a str, spec: &FormatSpec) -> Option<LineFields<'a>>;
}

/// Canonical parser: delimiter and level column are inferred per file.
pub struct HeuristicParser;

impl LineParser for HeuristicParser {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn detect(&self, first_line: &str) -> Result<FormatSpec, ParseError> {
        detect_format(first_line)
    }

    fn parse_line<'a>(&self, line: &'a str, spec: &FormatSpec) -> Option<LineFields<'a>> {
        if line.trim().is_empty() {
            return None;
        }

        let fields: Vec<&str> = line.split(spec.delimiter.as_str()).map(str::trim).collect();
        let message = match fields.len() {
            3 => fields[2],
            // field 2 is the source component, discarded
            4 => fields[3],
            _ => return None,
        };
        if message.is_empty() {
            return None;
        }

        let level = spec
            .level_column_index
            .and_then(|idx| fields.get(idx).copied())
            .unwrap_or(fields[1]);

        Some(LineFields {
            timestamp: fields[0],
            level,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spec(delimiter: &str, level: Option<usize>) -> FormatSpec {
        FormatSpec {
            delimiter: delimiter.to_string(),
            level_column_index: level,
        }
    }

    #[test]
    fn test_three_fields() {
        let fields = HeuristicParser
            .parse_line("2025-05-19 10:00:00 | ERROR | disk full", &spec(" | ", Some(1)))
            .unwrap();
        assert_eq!(
            fields,
            LineFields {
                timestamp: "2025-05-19 10:00:00",
                level: "ERROR",
                message: "disk full",
            }
        );
    }

    #[test]
    fn test_four_fields_discards_source() {
        let fields = HeuristicParser
            .parse_line("2025-05-19 10:00:00|db|CRITICAL|connection lost", &spec("|", Some(2)))
            .unwrap();
        assert_eq!(fields.level, "CRITICAL");
        assert_eq!(fields.message, "connection lost");
    }

    #[test]
    fn test_unknown_level_column_uses_second_field() {
        let fields = HeuristicParser
            .parse_line("ts | notice | started", &spec(" | ", None))
            .unwrap();
        assert_eq!(fields.level, "notice");
    }

    #[test]
    fn test_level_column_out_of_range_falls_back() {
        let fields = HeuristicParser
            .parse_line("ts | lvl | msg", &spec(" | ", Some(3)))
            .unwrap();
        assert_eq!(fields.level, "lvl");
        assert_eq!(fields.message, "msg");
    }

    #[test]
    fn test_level_used_verbatim() {
        let fields = HeuristicParser
            .parse_line("ts | Warn-ish | msg", &spec(" | ", Some(1)))
            .unwrap();
        assert_eq!(fields.level, "Warn-ish");
    }

    #[test]
    fn test_skipped_lines() {
        let spec = spec(" | ", Some(1));
        assert!(HeuristicParser.parse_line("", &spec).is_none());
        assert!(HeuristicParser.parse_line("   \t", &spec).is_none());
        assert!(HeuristicParser.parse_line("ts | INFO", &spec).is_none());
        assert!(HeuristicParser.parse_line("a | b | c | d | e", &spec).is_none());
        assert!(HeuristicParser.parse_line("ts | INFO | ", &spec).is_none());
    }
}
