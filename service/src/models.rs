use logwatch_parser::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A log file the dashboard keeps track of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedFile {
    pub short_name: String,
    pub full_path: String,
}

impl WatchedFile {
    pub fn from_path(full_path: &str) -> Self {
        let short_name = Path::new(full_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| full_path.to_string());

        Self {
            short_name,
            full_path: full_path.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FilesResponse {
    pub files: Vec<WatchedFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogFilesResponse {
    pub log_files: Vec<WatchedFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddFileRequest {
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parsed lines as `[timestamp, level, message]` triples.
#[derive(Debug, Clone, Serialize)]
pub struct LogLinesResponse {
    pub lines: Vec<[String; 3]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsResponse {
    pub levels: BTreeMap<Severity, usize>,
    /// Base64-encoded PNG.
    pub plot: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergedAnalyticsResponse {
    /// Base64-encoded PNG.
    pub plot: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_is_file_name() {
        let file = WatchedFile::from_path("/var/log/app/server.log");
        assert_eq!(file.short_name, "server.log");
        assert_eq!(file.full_path, "/var/log/app/server.log");
    }

    #[test]
    fn test_short_name_falls_back_to_full_path() {
        assert_eq!(WatchedFile::from_path("/").short_name, "/");
    }
}
