use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::outputs::{EnvmanOutputs, NoOutputs, StdoutOutputs, StepOutputs};

pub const XCRESULT_KEY: &str = "path_to_xcresult";
pub const OUTPUT_DIR_KEY: &str = "xml_output_dir";
pub const SOURCE_DIR_KEY: &str = "path_to_source_dir";
pub const STEP_OUTPUTS_KEY: &str = "step_outputs";
pub const ENVMAN_PROGRAM_KEY: &str = "envman_program";

/// Set by Bitrise for every step; step outputs go through envman there
pub const BITRISE_MARKER_KEY: &str = "BITRISE_IO";

/// A key/value configuration source
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Flat string table from a TOML file
#[derive(Debug, Clone, Default)]
pub struct TomlSource {
    values: HashMap<String, String>,
}

impl TomlSource {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let values: HashMap<String, String> = toml::from_str(content)?;
        Ok(Self { values })
    }
}

impl ConfigSource for TomlSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Sources queried in order; the first one holding a key wins
#[derive(Default)]
pub struct Layered {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl Layered {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl ConfigSource for Layered {
    fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|s| s.get(key))
    }
}

/// Where step outputs are published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    Envman,
    Stdout,
    #[default]
    None,
}

impl FromStr for OutputMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "envman" => Ok(OutputMode::Envman),
            "stdout" => Ok(OutputMode::Stdout),
            "none" | "" => Ok(OutputMode::None),
            _ => anyhow::bail!(
                "Unknown {}: {}. Supported: envman, stdout, none",
                STEP_OUTPUTS_KEY,
                s
            ),
        }
    }
}

/// Settings for a full conversion run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub xcresult_path: PathBuf,
    pub output_dir: PathBuf,
    pub source_dir: String,
    pub step_outputs: OutputMode,
    pub envman_program: String,
}

impl Settings {
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let xcresult_path = PathBuf::from(required(source, XCRESULT_KEY)?);
        let source_dir = required(source, SOURCE_DIR_KEY)?;

        let output_dir = match optional(source, OUTPUT_DIR_KEY)? {
            Some(dir) => PathBuf::from(dir),
            None => PathBuf::from("."),
        };

        let step_outputs = match optional(source, STEP_OUTPUTS_KEY)? {
            Some(mode) => mode.parse()?,
            None if source.get(BITRISE_MARKER_KEY).is_some() => OutputMode::Envman,
            None => OutputMode::default(),
        };

        let envman_program =
            optional(source, ENVMAN_PROGRAM_KEY)?.unwrap_or_else(|| "envman".to_string());

        Ok(Settings {
            xcresult_path,
            output_dir,
            source_dir,
            step_outputs,
            envman_program,
        })
    }

    pub fn publisher(&self) -> Box<dyn StepOutputs> {
        match self.step_outputs {
            OutputMode::Envman => Box::new(EnvmanOutputs::with_program(&self.envman_program)),
            OutputMode::Stdout => Box::new(StdoutOutputs),
            OutputMode::None => Box::new(NoOutputs),
        }
    }
}

fn required(source: &dyn ConfigSource, key: &str) -> Result<String> {
    optional(source, key)?.with_context(|| format!("Missing required setting '{}'", key))
}

fn optional(source: &dyn ConfigSource, key: &str) -> Result<Option<String>> {
    source
        .get(key)
        .map(|value| {
            shellexpand::full(&value)
                .map(|expanded| expanded.into_owned())
                .with_context(|| format!("Failed to expand setting '{}'", key))
        })
        .transpose()
}
