use clap::Parser;
use logwatch_parser::{ParseMode, ParseOptions};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Process configuration, read once at startup from flags or environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "logwatch", version, about = "Log file dashboard backend")]
pub struct Config {
    /// Address the HTTP API listens on
    #[arg(long, env = "LOGWATCH_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// JSON file holding the list of watched files
    #[arg(long, env = "LOGWATCH_REGISTRY", default_value = "logwatch.json")]
    pub registry: PathBuf,

    /// Also write the service's own logs to this file
    #[arg(long, env = "LOGWATCH_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Parse every file as `timestamp|level|message` instead of detecting the format
    #[arg(long, env = "LOGWATCH_LEGACY_FORMAT")]
    pub legacy_format: bool,

    /// Stop reading a file after this many lines
    #[arg(long, env = "LOGWATCH_MAX_LINES")]
    pub max_lines: Option<usize>,
}

impl Config {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            mode: if self.legacy_format {
                ParseMode::Legacy
            } else {
                ParseMode::Heuristic
            },
            max_lines: self.max_lines,
        }
    }
}
