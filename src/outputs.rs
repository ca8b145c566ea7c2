//! CI step outputs
//!
//! Exposes the generated report paths to later CI steps.

use anyhow::{Context, Result};
use std::process::Command;

use crate::config::ENVMAN_PROGRAM_KEY;

pub const XML_RESULT_KEY: &str = "COVERAGE_XML_TEST_RESULT_PATH";
pub const JSON_RESULT_KEY: &str = "COVERAGE_JSON_TEST_RESULT_PATH";

/// Sink for key/value step outputs
pub trait StepOutputs {
    fn publish(&self, key: &str, value: &str) -> Result<()>;
}

/// Publishes through `envman add --key K --value V`
#[derive(Debug, Clone)]
pub struct EnvmanOutputs {
    program: String,
}

impl Default for EnvmanOutputs {
    fn default() -> Self {
        Self {
            program: "envman".to_string(),
        }
    }
}

impl EnvmanOutputs {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl StepOutputs for EnvmanOutputs {
    fn publish(&self, key: &str, value: &str) -> Result<()> {
        let output = Command::new(&self.program)
            .args(["add", "--key", key, "--value", value])
            .output()
            .with_context(|| {
                format!(
                    "Failed to execute {} for {} (set {} to use a different launcher)",
                    self.program, key, ENVMAN_PROGRAM_KEY
                )
            })?;

        if !output.status.success() {
            anyhow::bail!(
                "{} add --key {} failed ({}): {}{}",
                self.program,
                key,
                output.status,
                String::from_utf8_lossy(&output.stdout).trim(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }
}

/// Prints `KEY=value` lines
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutOutputs;

impl StepOutputs for StdoutOutputs {
    fn publish(&self, key: &str, value: &str) -> Result<()> {
        println!("{}={}", key, value);
        Ok(())
    }
}

/// Discards outputs
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOutputs;

impl StepOutputs for NoOutputs {
    fn publish(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envman_missing_program() {
        let outputs = EnvmanOutputs::with_program("xccov-cobertura-no-such-envman");
        let err = outputs.publish(XML_RESULT_KEY, "/tmp/cobertura.xml").unwrap_err();
        assert!(err.to_string().contains(XML_RESULT_KEY));
        assert!(err.to_string().contains(ENVMAN_PROGRAM_KEY));
    }

    #[test]
    fn test_no_outputs() {
        assert!(NoOutputs.publish(JSON_RESULT_KEY, "x").is_ok());
    }
}
