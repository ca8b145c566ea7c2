//! Error types for the conversion core

use std::path::PathBuf;
use thiserror::Error;

/// The xccov report could not be decoded
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Input is not valid JSON for the report schema
    #[error("invalid xccov report: {0}")]
    Json(#[from] serde_json::Error),

    /// Report file could not be read
    #[error("failed to read xccov report {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Covered line count is larger than the executable line count
    #[error("{element} reports {covered} covered lines out of {executable} executable lines")]
    Invariant {
        element: String,
        covered: u64,
        executable: u64,
    },

    /// Function's line range does not fit in a line number
    #[error("{element} starts at line {line_number} and spans {executable_lines} lines, past the last representable line")]
    LineRange {
        element: String,
        line_number: u64,
        executable_lines: u64,
    },

    /// Function has more executable lines than its file
    #[error("{element} reports {executable} executable lines but its file only has {file_executable}")]
    FunctionExceedsFile {
        element: String,
        executable: u64,
        file_executable: u64,
    },
}

/// The Cobertura document could not be written
#[derive(Debug, Error)]
pub enum EncodeError {
    /// XML writer failed
    #[error("failed to write Cobertura XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Output sink failed
    #[error("failed to write Cobertura XML: {0}")]
    Io(#[from] std::io::Error),

    /// Rendered output is not UTF-8
    #[error("Cobertura XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
