//! Coverage export command

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Produces the raw xccov JSON report for an `.xcresult` bundle
pub trait CoverageExporter {
    fn export(&self, xcresult: &Path) -> Result<Vec<u8>>;
}

/// Runs `xcrun xccov view --report --json <xcresult>`
#[derive(Debug, Clone)]
pub struct XccovExporter {
    program: String,
}

impl Default for XccovExporter {
    fn default() -> Self {
        Self {
            program: "xcrun".to_string(),
        }
    }
}

impl XccovExporter {
    /// Use a different launcher instead of `xcrun`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl CoverageExporter for XccovExporter {
    fn export(&self, xcresult: &Path) -> Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(["xccov", "view", "--report", "--json"])
            .arg(xcresult)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Failed to execute {} xccov", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "xccov export of {} failed ({}): {}",
                xcresult.display(),
                output.status,
                stderr.trim()
            );
        }

        Ok(output.stdout)
    }
}

/// Reads a report that was already exported to disk
#[derive(Debug, Clone)]
pub struct FileExporter {
    path: PathBuf,
}

impl FileExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CoverageExporter for FileExporter {
    fn export(&self, _xcresult: &Path) -> Result<Vec<u8>> {
        fs::read(&self.path)
            .with_context(|| format!("Failed to read coverage report: {}", self.path.display()))
    }
}
