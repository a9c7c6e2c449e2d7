//! File framing for PMTM files.
//!
//! A file opens with a fixed header row and, from 0.2.7 onwards, closes with
//! an `End of File` row. Everything in between goes through the dispatcher.

use crate::core::{FormatError, ImportError};
use crate::format::dispatch::RecordBuilder;
use crate::format::tokenizer::{is_blank, split_row};
use crate::format::version::FormatVersion;
use crate::model::PmtmRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

pub const FILE_HEADER: &str = "Performance Modelling Timing File";
pub const FILE_TRAILER: &str = "End of File";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    AwaitingHeader,
    Streaming,
    Done,
}

/// Feeds rows through the dispatcher while tracking where in the file we are.
#[derive(Debug)]
pub struct FormatReader {
    state: ReaderState,
    builder: RecordBuilder,
}

impl Default for FormatReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatReader {
    pub fn new() -> Self {
        Self {
            state: ReaderState::AwaitingHeader,
            builder: RecordBuilder::new(),
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Consume one tokenized row. Rows after the trailer are ignored.
    pub fn feed_row(&mut self, fields: &[String]) -> Result<(), FormatError> {
        match self.state {
            ReaderState::AwaitingHeader => {
                if !is_single(fields, FILE_HEADER) {
                    return Err(FormatError::InvalidHeader);
                }
                self.state = ReaderState::Streaming;
            }
            ReaderState::Streaming => {
                if is_single(fields, FILE_TRAILER) {
                    self.state = ReaderState::Done;
                } else if !is_blank(fields) {
                    self.builder.dispatch(fields)?;
                }
            }
            ReaderState::Done => {}
        }
        Ok(())
    }

    /// Close the stream and produce the record.
    pub fn finish(self) -> Result<PmtmRecord, FormatError> {
        match self.state {
            ReaderState::AwaitingHeader => return Err(FormatError::InvalidHeader),
            ReaderState::Streaming => {
                let version = self.builder.version().ok_or(FormatError::MissingVersion)?;
                if version > FormatVersion::V0_2_6 {
                    return Err(FormatError::IncompleteFile);
                }
                debug!("No end of file marker, accepted for PMTM {}", version);
            }
            ReaderState::Done => {}
        }
        self.builder.finish()
    }

    /// Read a whole file from any buffered source.
    pub fn read<R: BufRead>(source: R) -> Result<PmtmRecord, ImportError> {
        let mut reader = Self::new();
        for (index, bytes) in source.split(b'\n').enumerate() {
            let line = String::from_utf8(bytes?)
                .map_err(|_| FormatError::InvalidEncoding(index + 1))?;
            let line = line.strip_suffix('\r').unwrap_or(&line);
            reader.feed_row(&split_row(line))?;
            if reader.state == ReaderState::Done {
                break;
            }
        }
        Ok(reader.finish()?)
    }

    pub fn read_path<P: AsRef<Path>>(path: P) -> Result<PmtmRecord, ImportError> {
        let file = File::open(path.as_ref())?;
        Self::read(BufReader::new(file))
    }
}

fn is_single(fields: &[String], marker: &str) -> bool {
    matches!(fields, [only] if only.trim() == marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorCategory;

    fn read(text: &str) -> Result<PmtmRecord, ImportError> {
        FormatReader::read(text.as_bytes())
    }

    fn format_error(text: &str) -> FormatError {
        match read(text) {
            Err(ImportError::Format(err)) => err,
            other => panic!("expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn test_minimal_file() {
        let record = read(
            "Performance Modelling Timing File\nPMTM Version,,2.1.1\nRun ID,,abc\nEnd of File\n",
        )
        .unwrap();
        assert_eq!(record.version, FormatVersion::V2_1_1);
        assert_eq!(record.run_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_bad_header() {
        assert_eq!(format_error("PMTM File\nPMTM Version,,2.1.1\n"), FormatError::InvalidHeader);
        assert_eq!(format_error(""), FormatError::InvalidHeader);
        assert_eq!(
            format_error("\nPerformance Modelling Timing File\n"),
            FormatError::InvalidHeader
        );
    }

    #[test]
    fn test_blank_rows_skipped() {
        let record = read(
            "Performance Modelling Timing File\r\n\r\nPMTM Version,,2.0.0\r\n , \r\nTag,,x\r\nEnd of File\r\n",
        )
        .unwrap();
        assert_eq!(record.tag.as_deref(), Some("x"));
    }

    #[test]
    fn test_trailer_stops_consumption() {
        let record = read(
            "Performance Modelling Timing File\nPMTM Version,,2.0.0\nEnd of File\nBogus,,line\n",
        )
        .unwrap();
        assert!(record.parameters.is_empty());
    }

    #[test]
    fn test_missing_trailer_tolerated_for_old_versions() {
        assert!(read("Performance Modelling Timing File\nPMTM Version,,0.2.6\n").is_ok());
        assert!(read("Performance Modelling Timing File\nPMTM Version,,0.2\n").is_ok());
        assert_eq!(
            format_error("Performance Modelling Timing File\nPMTM Version,,0.2.7\n"),
            FormatError::IncompleteFile
        );
    }

    #[test]
    fn test_missing_version() {
        assert_eq!(
            format_error("Performance Modelling Timing File\nEnd of File\n"),
            FormatError::MissingVersion
        );
        assert_eq!(
            format_error("Performance Modelling Timing File\n"),
            FormatError::MissingVersion
        );
    }

    #[test]
    fn test_invalid_utf8_is_a_format_error() {
        let bytes = b"Performance Modelling Timing File\nPMTM Version,,2.3.1\nEnviron,,X=\xE9\nEnd of File\n";
        let err = FormatReader::read(&bytes[..]).unwrap_err();
        assert!(matches!(err, ImportError::Format(FormatError::InvalidEncoding(3))));
        assert_eq!(err.category(), ErrorCategory::Format);
    }

    #[test]
    fn test_state_transitions() {
        let mut reader = FormatReader::new();
        assert_eq!(reader.state(), ReaderState::AwaitingHeader);
        reader.feed_row(&split_row(FILE_HEADER)).unwrap();
        assert_eq!(reader.state(), ReaderState::Streaming);
        reader.feed_row(&split_row("PMTM Version,,2.3.1")).unwrap();
        reader.feed_row(&split_row(FILE_TRAILER)).unwrap();
        assert_eq!(reader.state(), ReaderState::Done);
    }
}
