//! Cobertura module
//!
//! Provides:
//! - The Cobertura 4.0 document model
//! - Transformation from an xccov report
//! - XML serialization with the fixed DOCTYPE

mod transform;
mod writer;

pub use transform::*;
pub use writer::*;

/// Value of the `version` attribute on `<coverage>`
pub const CONVERTER_VERSION: &str = "xccov-cobertura 1.0";

/// Branch data is not present in xccov reports
pub const BRANCH_RATE: &str = "1.0";
pub const BRANCHES_VALID: &str = "1.0";
pub const BRANCHES_COVERED: &str = "1.0";

/// Complexity is not present in xccov reports
pub const COMPLEXITY: &str = "0.0";

/// Root `<coverage>` element
///
/// Every attribute is kept as its rendered text so the output is stable.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub line_rate: String,
    pub branch_rate: String,
    pub lines_covered: String,
    pub lines_valid: String,
    pub timestamp: String,
    pub version: String,
    pub complexity: String,
    pub branches_valid: String,
    pub branches_covered: String,
    pub sources: Vec<String>,
    pub packages: Vec<Package>,
}

/// A `<package>`, one per xccov target
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub line_rate: String,
    pub branch_rate: String,
    pub complexity: String,
    pub classes: Vec<Class>,
}

/// A `<class>`, one per source file
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub filename: String,
    pub line_rate: String,
    pub branch_rate: String,
    pub complexity: String,
    pub lines: Vec<Line>,
}

/// A single `<line>`
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: String,
    pub hits: String,
    pub branch: String,
}

impl Document {
    pub fn class_count(&self) -> usize {
        self.packages.iter().map(|p| p.classes.len()).sum()
    }

    pub fn line_count(&self) -> usize {
        self.packages
            .iter()
            .flat_map(|p| &p.classes)
            .map(|c| c.lines.len())
            .sum()
    }
}
