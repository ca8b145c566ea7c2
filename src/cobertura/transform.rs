//! xccov report → Cobertura document

use chrono::Utc;

use super::{
    Class, Document, Line, Package, BRANCHES_COVERED, BRANCHES_VALID, BRANCH_RATE, COMPLEXITY,
    CONVERTER_VERSION,
};
use crate::xccov::{CoverageReport, File, Function, Target};

/// Build a Cobertura document stamped with the current time
pub fn build_document(report: &CoverageReport, source_root: &str) -> Document {
    build_document_at(report, source_root, Utc::now().timestamp())
}

/// Build a Cobertura document with an explicit Unix timestamp
pub fn build_document_at(report: &CoverageReport, source_root: &str, timestamp: i64) -> Document {
    Document {
        line_rate: format_rate(report.line_coverage),
        branch_rate: BRANCH_RATE.to_string(),
        lines_covered: report.covered_lines.to_string(),
        lines_valid: report.executable_lines.to_string(),
        timestamp: timestamp.to_string(),
        version: CONVERTER_VERSION.to_string(),
        complexity: COMPLEXITY.to_string(),
        branches_valid: BRANCHES_VALID.to_string(),
        branches_covered: BRANCHES_COVERED.to_string(),
        sources: vec![source_root.to_string()],
        packages: report
            .targets
            .iter()
            .filter_map(|target| build_package(target, source_root))
            .collect(),
    }
}

/// Targets without files have no package
fn build_package(target: &Target, source_root: &str) -> Option<Package> {
    let first = target.files.first()?;
    let name = package_name(&first.path);

    let classes = target
        .files
        .iter()
        .map(|file| build_class(file, &name, source_root))
        .collect();

    Some(Package {
        line_rate: format_rate(target.line_coverage),
        branch_rate: BRANCH_RATE.to_string(),
        complexity: COMPLEXITY.to_string(),
        name,
        classes,
    })
}

fn build_class(file: &File, package: &str, source_root: &str) -> Class {
    Class {
        name: format!("{}{}", package, strip_extension(&file.name)),
        filename: relative_filename(&file.path, source_root).to_string(),
        line_rate: format_rate(file.line_coverage),
        branch_rate: BRANCH_RATE.to_string(),
        complexity: COMPLEXITY.to_string(),
        lines: file.functions.iter().flat_map(synthesize_lines).collect(),
    }
}

/// Expand a function's aggregate counts into per-line entries.
///
/// xccov only reports covered/executable totals per function, so the first
/// `covered_lines` lines get the execution count and the rest get zero. Which
/// lines actually ran is not known. Lines past `u64::MAX` are dropped.
pub fn synthesize_lines(function: &Function) -> impl Iterator<Item = Line> + '_ {
    (0..function.executable_lines).map_while(move |idx| {
        let number = function.line_number.checked_add(idx)?;
        let hits = if idx < function.covered_lines {
            function.execution_count
        } else {
            0
        };

        Some(Line {
            number: number.to_string(),
            hits: hits.to_string(),
            branch: "false".to_string(),
        })
    })
}

/// Dotted package name from the directory part of a file path
///
/// `App/Models/User.swift` → `App.Models`; a file at the root gives `""`.
pub fn package_name(path: &str) -> String {
    let dir = match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "",
    };

    dir.replace('/', ".").trim_matches('.').to_string()
}

/// File path relative to the source root, or unchanged if outside it
pub fn relative_filename<'a>(path: &'a str, source_root: &str) -> &'a str {
    if source_root.is_empty() {
        return path;
    }

    let prefix = if source_root.ends_with('/') {
        source_root.to_string()
    } else {
        format!("{}/", source_root)
    };

    path.strip_prefix(prefix.as_str()).unwrap_or(path)
}

/// File name without its final extension
fn strip_extension(name: &str) -> &str {
    let base_start = name.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    match name[base_start..].rfind('.') {
        Some(dot) => &name[..base_start + dot],
        None => name,
    }
}

/// Rates use six fractional digits
pub fn format_rate(rate: f64) -> String {
    format!("{:.6}", rate)
}
