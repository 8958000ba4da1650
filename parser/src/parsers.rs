//! Central parser selection.
//!
//! The heuristic parser is the default for every file. The legacy
//! fixed-format parser is only chosen when a deployment opts into
//! [`ParseMode::Legacy`].

use crate::legacy_parser::LegacyPipeParser;
use crate::line_parser::{HeuristicParser, LineParser};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Heuristic,
    Legacy,
}

impl ParseMode {
    pub fn parser(self) -> Box<dyn LineParser> {
        let parser: Box<dyn LineParser> = match self {
            ParseMode::Heuristic => Box::new(HeuristicParser),
            ParseMode::Legacy => Box::new(LegacyPipeParser),
        };
        debug!("Using {} line parser", parser.name());
        parser
    }
}

/// Parsing settings fixed at process start and handed to each parse pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub mode: ParseMode,
    /// Upper bound on raw lines read per file pass; `None` reads everything.
    pub max_lines: Option<usize>,
}
