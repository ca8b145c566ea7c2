//! End-to-end conversion: export → parse → transform → serialize → publish

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cobertura::{build_document, write_document, Document};
use crate::config::Settings;
use crate::export::CoverageExporter;
use crate::outputs::{StepOutputs, JSON_RESULT_KEY, XML_RESULT_KEY};
use crate::xccov::{parse_report, CoverageReport};

pub const JSON_FILE_NAME: &str = "coverage.json";
pub const XML_FILE_NAME: &str = "cobertura.xml";

/// A converted report and its rendered XML
#[derive(Debug, Clone)]
pub struct Conversion {
    pub report: CoverageReport,
    pub document: Document,
    pub xml: String,
}

/// Files produced by a full run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub json_path: PathBuf,
    pub xml_path: PathBuf,
    pub conversion: Conversion,
}

/// Convert raw xccov JSON into Cobertura XML text
pub fn convert(content: &[u8], source_root: &str) -> Result<Conversion> {
    let report = parse_report(content).context("Failed to decode xccov coverage report")?;
    let document = build_document(&report, source_root);
    let xml = write_document(&document).context("Failed to serialize Cobertura XML")?;

    Ok(Conversion {
        report,
        document,
        xml,
    })
}

/// Run the whole conversion for an `.xcresult` bundle
pub fn run(
    settings: &Settings,
    exporter: &dyn CoverageExporter,
    outputs: &dyn StepOutputs,
) -> Result<RunResult> {
    fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            settings.output_dir.display()
        )
    })?;

    let json_path = settings.output_dir.join(JSON_FILE_NAME);
    let xml_path = settings.output_dir.join(XML_FILE_NAME);

    println!(
        "{} Generating json from {}",
        "→".blue(),
        settings.xcresult_path.display()
    );

    let json = exporter
        .export(&settings.xcresult_path)
        .context("Failed to generate coverage json")?;
    write_file(&json_path, &json).context("Failed to save coverage json")?;

    println!("{} Generating xml from {}", "→".blue(), json_path.display());

    let conversion = convert(&json, &settings.source_dir)?;
    write_file(&xml_path, conversion.xml.as_bytes()).context("Failed to write xml")?;

    publish(outputs, XML_RESULT_KEY, &xml_path)?;
    publish(outputs, JSON_RESULT_KEY, &json_path)?;

    Ok(RunResult {
        json_path,
        xml_path,
        conversion,
    })
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))
}

fn publish(outputs: &dyn StepOutputs, key: &str, path: &Path) -> Result<()> {
    outputs
        .publish(key, &path.display().to_string())
        .with_context(|| format!("Failed to expose output {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputMode;
    use crate::error::DecodeError;
    use crate::export::FileExporter;
    use std::cell::RefCell;

    const REPORT: &str = r#"{
        "coveredLines": 3, "executableLines": 5, "lineCoverage": 0.6,
        "targets": [{
            "name": "App.app", "coveredLines": 3, "executableLines": 5, "lineCoverage": 0.6,
            "files": [{
                "name": "Foo.m", "path": "/repo/src/App/Foo.m", "coveredLines": 3,
                "executableLines": 5, "lineCoverage": 0.6,
                "functions": [{
                    "name": "-[Foo bar]", "lineNumber": 10, "executableLines": 5,
                    "coveredLines": 3, "executionCount": 7
                }]
            }]
        }]
    }"#;

    #[derive(Default)]
    struct RecordingOutputs {
        published: RefCell<Vec<(String, String)>>,
    }

    impl StepOutputs for RecordingOutputs {
        fn publish(&self, key: &str, value: &str) -> Result<()> {
            self.published
                .borrow_mut()
                .push((key.to_string(), value.to_string()));
            Ok(())
        }
    }

    struct FailingExporter;

    impl CoverageExporter for FailingExporter {
        fn export(&self, _xcresult: &Path) -> Result<Vec<u8>> {
            anyhow::bail!("xccov exited with status 1")
        }
    }

    struct StaticExporter(&'static [u8]);

    impl CoverageExporter for StaticExporter {
        fn export(&self, _xcresult: &Path) -> Result<Vec<u8>> {
            Ok(self.0.to_vec())
        }
    }

    fn settings(output_dir: &Path) -> Settings {
        Settings {
            xcresult_path: PathBuf::from("Test.xcresult"),
            output_dir: output_dir.to_path_buf(),
            source_dir: "/repo/src".to_string(),
            step_outputs: OutputMode::None,
            envman_program: "envman".to_string(),
        }
    }

    #[test]
    fn test_convert() {
        let conversion = convert(REPORT.as_bytes(), "/repo/src").unwrap();

        assert_eq!(conversion.document.packages.len(), 1);
        assert!(conversion.xml.contains("filename=\"App/Foo.m\""));
        assert!(conversion.xml.contains("<line number=\"14\" hits=\"0\" branch=\"false\"/>"));
    }

    #[test]
    fn test_convert_decode_failure() {
        let err = convert(b"{\"targets\": ", "/repo").unwrap_err();

        assert!(err.to_string().contains("Failed to decode"));
        assert!(err.downcast_ref::<DecodeError>().is_some());
    }

    #[test]
    fn test_run_writes_files_and_publishes() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("reports");
        let input = dir.path().join("export.json");
        fs::write(&input, REPORT).unwrap();

        let outputs = RecordingOutputs::default();
        let result = run(&settings(&out_dir), &FileExporter::new(&input), &outputs).unwrap();

        assert_eq!(result.json_path, out_dir.join(JSON_FILE_NAME));
        assert_eq!(result.xml_path, out_dir.join(XML_FILE_NAME));
        assert_eq!(fs::read_to_string(&result.json_path).unwrap(), REPORT);
        assert_eq!(fs::read_to_string(&result.xml_path).unwrap(), result.conversion.xml);

        let published = outputs.published.borrow();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, XML_RESULT_KEY);
        assert_eq!(published[0].1, result.xml_path.display().to_string());
        assert_eq!(published[1].0, JSON_RESULT_KEY);
    }

    #[test]
    fn test_run_export_failure() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = RecordingOutputs::default();

        let err = run(&settings(dir.path()), &FailingExporter, &outputs).unwrap_err();

        assert!(format!("{:#}", err).contains("xccov exited with status 1"));
        assert!(!dir.path().join(JSON_FILE_NAME).exists());
        assert!(!dir.path().join(XML_FILE_NAME).exists());
        assert!(outputs.published.borrow().is_empty());
    }

    #[test]
    fn test_run_decode_failure_writes_no_xml() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = RecordingOutputs::default();

        let result = run(&settings(dir.path()), &StaticExporter(b"<html>"), &outputs);

        assert!(result.is_err());
        assert!(dir.path().join(JSON_FILE_NAME).exists());
        assert!(!dir.path().join(XML_FILE_NAME).exists());
        assert!(outputs.published.borrow().is_empty());
    }
}
