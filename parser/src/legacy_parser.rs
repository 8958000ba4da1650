use crate::{line_parser::LineParser, FormatSpec, LineFields, ParseError};

/// Fixed-format parser kept for dashboards that relied on the old behaviour:
/// every line is `timestamp|level|message[|...]`, nothing is inferred.
pub struct LegacyPipeParser;

impl LineParser for LegacyPipeParser {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn detect(&self, _first_line: &str) -> Result<FormatSpec, ParseError> {
        Ok(FormatSpec {
            delimiter: "|".to_string(),
            level_column_index: Some(1),
        })
    }

    fn parse_line<'a>(&self, line: &'a str, _spec: &FormatSpec) -> Option<LineFields<'a>> {
        if line.trim().is_empty() {
            return None;
        }

        let mut parts = line.split('|').map(str::trim);
        let timestamp = parts.next()?;
        let level = parts.next()?;
        let message = parts.next()?;

        Some(LineFields {
            timestamp,
            level,
            message,
        })
    }
}
