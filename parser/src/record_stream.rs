use crate::line_parser::LineParser;
use crate::parsers::ParseOptions;
use crate::timestamp::normalize;
use crate::{FormatSpec, LogRecord, ParseError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, trace};

/// Lazy pipeline from raw lines to [`LogRecord`]s for one file.
///
/// The format is detected once, from the first non-blank line, when the
/// stream is created. A detection failure is returned from [`RecordStream::new`];
/// malformed lines after that are skipped without error. The stream cannot be
/// restarted.
pub struct RecordStream<R> {
    reader: R,
    parser: Box<dyn LineParser>,
    spec: Option<FormatSpec>,
    pending: Option<String>,
    max_lines: Option<usize>,
    lines_read: usize,
    skipped: usize,
    done: bool,
}

impl RecordStream<BufReader<File>> {
    /// Open a log file and detect its format.
    pub fn open(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Self, ParseError> {
        let path = path.as_ref();
        info!("Opening log file {}", path.display());
        let file = File::open(path)?;
        Self::new(BufReader::new(file), options)
    }
}

impl<R: BufRead> RecordStream<R> {
    pub fn new(reader: R, options: &ParseOptions) -> Result<Self, ParseError> {
        let mut stream = Self {
            reader,
            parser: options.mode.parser(),
            spec: None,
            pending: None,
            max_lines: options.max_lines,
            lines_read: 0,
            skipped: 0,
            done: false,
        };

        while let Some(line) = stream.read_line()? {
            if line.trim().is_empty() {
                continue;
            }
            stream.spec = Some(stream.parser.detect(&line)?);
            stream.pending = Some(line);
            break;
        }

        if stream.spec.is_none() {
            debug!("No non-blank line found, stream is empty");
            stream.done = true;
        }

        Ok(stream)
    }

    /// Format in use for this pass; `None` for a file with no content.
    pub fn format_spec(&self) -> Option<&FormatSpec> {
        self.spec.as_ref()
    }

    /// Lines dropped so far because they did not fit the format.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        if self.max_lines.is_some_and(|max| self.lines_read >= max) {
            return Ok(None);
        }

        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        self.lines_read += 1;

        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

impl<R: BufRead> Iterator for RecordStream<R> {
    type Item = Result<LogRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.pending.take() {
                Some(line) => line,
                None => match self.read_line() {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!(
                            "Stream finished: {} lines read, {} skipped",
                            self.lines_read, self.skipped
                        );
                        self.done = true;
                        return None;
                    }
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e.into()));
                    }
                },
            };

            let spec = self.spec.as_ref()?;
            let Some(fields) = self.parser.parse_line(&line, spec) else {
                if !line.trim().is_empty() {
                    trace!("Skipping line that does not fit {:?}: {:?}", spec.delimiter, line);
                    self.skipped += 1;
                }
                continue;
            };

            return Some(Ok(LogRecord {
                timestamp: normalize(fields.timestamp),
                raw_timestamp: fields.timestamp.to_string(),
                level: fields.level.to_string(),
                message: fields.message.to_string(),
            }));
        }
    }
}
