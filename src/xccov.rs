//! xccov JSON report model and parser
//!
//! Decodes the output of `xcrun xccov view --report --json`:
//! targets → files → functions, each level carrying aggregate line counts.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::DecodeError;

/// Top-level coverage report
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageReport {
    pub executable_lines: u64,
    pub covered_lines: u64,
    pub line_coverage: f64,
    pub targets: Vec<Target>,
}

/// A build target (app, framework, test bundle)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    #[serde(default)]
    pub build_product_path: String,
    pub executable_lines: u64,
    pub covered_lines: u64,
    pub line_coverage: f64,
    pub files: Vec<File>,
}

/// A source file inside a target
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub name: String,
    pub path: String,
    pub executable_lines: u64,
    pub covered_lines: u64,
    pub line_coverage: f64,
    pub functions: Vec<Function>,
}

/// A function inside a file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub name: String,
    /// 1-based line where the function starts
    pub line_number: u64,
    pub executable_lines: u64,
    pub covered_lines: u64,
    /// Number of times the function was invoked
    pub execution_count: u64,
    #[serde(default)]
    pub line_coverage: f64,
}

/// Parse an xccov JSON report file
pub fn parse_report_file(path: &Path) -> Result<CoverageReport, DecodeError> {
    let content = fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_report(&content)
}

/// Parse xccov JSON report content
pub fn parse_report(content: &[u8]) -> Result<CoverageReport, DecodeError> {
    let report: CoverageReport = serde_json::from_slice(content)?;
    report.validate()?;
    Ok(report)
}

impl CoverageReport {
    /// Total number of functions across all targets
    pub fn function_count(&self) -> usize {
        self.targets
            .iter()
            .flat_map(|t| &t.files)
            .map(|f| f.functions.len())
            .sum()
    }

    fn validate(&self) -> Result<(), DecodeError> {
        check_counts("report", self.covered_lines, self.executable_lines)?;

        for target in &self.targets {
            check_counts(
                &format!("target '{}'", target.name),
                target.covered_lines,
                target.executable_lines,
            )?;

            for file in &target.files {
                check_counts(
                    &format!("file '{}'", file.path),
                    file.covered_lines,
                    file.executable_lines,
                )?;

                for function in &file.functions {
                    let element = format!("function '{}' in {}", function.name, file.path);
                    check_counts(&element, function.covered_lines, function.executable_lines)?;

                    if function.executable_lines > file.executable_lines {
                        return Err(DecodeError::FunctionExceedsFile {
                            element,
                            executable: function.executable_lines,
                            file_executable: file.executable_lines,
                        });
                    }

                    if function
                        .line_number
                        .checked_add(function.executable_lines)
                        .is_none()
                    {
                        return Err(DecodeError::LineRange {
                            element,
                            line_number: function.line_number,
                            executable_lines: function.executable_lines,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn check_counts(element: &str, covered: u64, executable: u64) -> Result<(), DecodeError> {
    if covered > executable {
        return Err(DecodeError::Invariant {
            element: element.to_string(),
            covered,
            executable,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"{
  "coveredLines": 8,
  "executableLines": 12,
  "lineCoverage": 0.6666666666666666,
  "targets": [
    {
      "buildProductPath": "/DerivedData/Build/Products/Debug-iphonesimulator/App.app/App",
      "coveredLines": 8,
      "executableLines": 12,
      "lineCoverage": 0.6666666666666666,
      "name": "App.app",
      "files": [
        {
          "coveredLines": 8,
          "executableLines": 12,
          "lineCoverage": 0.6666666666666666,
          "name": "User.swift",
          "path": "/repo/App/Models/User.swift",
          "functions": [
            {
              "coveredLines": 3,
              "executableLines": 5,
              "executionCount": 7,
              "lineCoverage": 0.6,
              "lineNumber": 10,
              "name": "User.init(name:)"
            },
            {
              "coveredLines": 5,
              "executableLines": 7,
              "executionCount": 2,
              "lineCoverage": 0.7142857142857143,
              "lineNumber": 20,
              "name": "User.displayName.getter"
            }
          ]
        }
      ]
    }
  ]
}"#;

    #[test]
    fn test_parse_report() {
        let report = parse_report(REPORT.as_bytes()).unwrap();

        assert_eq!(report.covered_lines, 8);
        assert_eq!(report.executable_lines, 12);
        assert_eq!(report.targets.len(), 1);

        let target = &report.targets[0];
        assert_eq!(target.name, "App.app");
        assert!(target.build_product_path.ends_with("App.app/App"));

        let file = &target.files[0];
        assert_eq!(file.name, "User.swift");
        assert_eq!(file.functions.len(), 2);
        assert_eq!(file.functions[0].line_number, 10);
        assert_eq!(file.functions[0].execution_count, 7);
        assert_eq!(report.function_count(), 2);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{
            "coveredLines": 0, "executableLines": 0, "lineCoverage": 0,
            "targets": [], "schemaVersion": 3, "extra": {"nested": true}
        }"#;

        let report = parse_report(json.as_bytes()).unwrap();
        assert!(report.targets.is_empty());
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{
            "coveredLines": 1, "executableLines": 1, "lineCoverage": 1.0,
            "targets": [{
                "name": "Lib", "coveredLines": 1, "executableLines": 1, "lineCoverage": 1.0,
                "files": [{
                    "name": "a.m", "path": "a.m", "coveredLines": 1, "executableLines": 1,
                    "lineCoverage": 1.0,
                    "functions": [{
                        "name": "f", "lineNumber": 1, "executableLines": 1,
                        "coveredLines": 1, "executionCount": 4
                    }]
                }]
            }]
        }"#;

        let report = parse_report(json.as_bytes()).unwrap();
        assert_eq!(report.targets[0].build_product_path, "");
        assert_eq!(report.targets[0].files[0].functions[0].line_coverage, 0.0);
    }

    #[test]
    fn test_malformed_input() {
        let err = parse_report(b"not json at all").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));

        let err = parse_report(b"").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_schema_mismatch() {
        // targets must be an array
        let json = r#"{"coveredLines": 1, "executableLines": 2, "lineCoverage": 0.5, "targets": {}}"#;
        assert!(matches!(parse_report(json.as_bytes()), Err(DecodeError::Json(_))));

        // missing required field
        let json = r#"{"coveredLines": 1, "lineCoverage": 0.5, "targets": []}"#;
        assert!(matches!(parse_report(json.as_bytes()), Err(DecodeError::Json(_))));

        // negative counts are not representable
        let json = r#"{"coveredLines": -1, "executableLines": 2, "lineCoverage": 0.5, "targets": []}"#;
        assert!(matches!(parse_report(json.as_bytes()), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_covered_exceeds_executable() {
        let json = REPORT.replacen("\"coveredLines\": 3", "\"coveredLines\": 9", 1);

        match parse_report(json.as_bytes()) {
            Err(DecodeError::Invariant { element, covered, executable }) => {
                assert!(element.contains("User.init(name:)"));
                assert_eq!(covered, 9);
                assert_eq!(executable, 5);
            }
            other => panic!("expected invariant error, got {:?}", other),
        }
    }

    #[test]
    fn test_line_range_overflow() {
        let json = r#"{
            "coveredLines": 1, "executableLines": 2, "lineCoverage": 0.5,
            "targets": [{
                "name": "App", "coveredLines": 1, "executableLines": 2, "lineCoverage": 0.5,
                "files": [{
                    "name": "a.m", "path": "App/a.m", "coveredLines": 1, "executableLines": 2,
                    "lineCoverage": 0.5,
                    "functions": [{
                        "name": "tail()", "lineNumber": 18446744073709551615, "executableLines": 2,
                        "coveredLines": 1, "executionCount": 1
                    }]
                }]
            }]
        }"#;

        match parse_report(json.as_bytes()) {
            Err(DecodeError::LineRange { element, line_number, executable_lines }) => {
                assert!(element.contains("tail()"));
                assert_eq!(line_number, u64::MAX);
                assert_eq!(executable_lines, 2);
            }
            other => panic!("expected line range error, got {:?}", other),
        }
    }

    #[test]
    fn test_function_larger_than_file() {
        let json = REPORT.replacen("\"executableLines\": 5", "\"executableLines\": 10000000000", 1);

        match parse_report(json.as_bytes()) {
            Err(DecodeError::FunctionExceedsFile { element, executable, file_executable }) => {
                assert!(element.contains("User.init(name:)"));
                assert_eq!(executable, 10_000_000_000);
                assert_eq!(file_executable, 12);
            }
            other => panic!("expected function size error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage.json");
        fs::write(&path, REPORT).unwrap();

        let report = parse_report_file(&path).unwrap();
        assert_eq!(report.targets[0].files[0].path, "/repo/App/Models/User.swift");

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            parse_report_file(&missing),
            Err(DecodeError::Io { .. })
        ));
    }
}
