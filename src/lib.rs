//! xccov-cobertura - Xcode coverage to Cobertura XML
//!
//! A library for converting `xcrun xccov view --report --json` output into
//! the Cobertura 4.0 XML format read by CI dashboards:
//! - Parsing of the xccov target/file/function report
//! - Per-line entries synthesized from per-function counts
//! - XML output with the fixed Cobertura DOCTYPE
//! - Injectable export command, step outputs and configuration

pub mod cobertura;
pub mod config;
pub mod error;
pub mod export;
pub mod outputs;
pub mod pipeline;
pub mod xccov;

pub use cobertura::{build_document, build_document_at, write_document, Document};
pub use error::{DecodeError, EncodeError};
pub use pipeline::{convert, run, Conversion, RunResult};
pub use xccov::{parse_report, parse_report_file, CoverageReport};
