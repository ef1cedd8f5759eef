//! Run reports for batch conversions.
//!
//! A [`RunReport`] records the outcome of every template processed in one
//! run. It is written as pretty JSON, and a flattened per-file view can be
//! written as CSV.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::error::Diagnostic;
use crate::Conversion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Converted,
    #[serde(rename = "failed_conversion")]
    ConversionFailed,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Converted => "converted",
            FileStatus::ConversionFailed => "failed_conversion",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_zero(v: &usize) -> bool {
    *v == 0
}

/// Report view of one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticItem {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub line: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub column: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snippet: String,
}

impl From<&Diagnostic> for DiagnosticItem {
    fn from(diag: &Diagnostic) -> Self {
        Self {
            code: diag.code.as_str().to_string(),
            message: diag.message.clone(),
            file: diag.file.clone(),
            line: diag.line,
            column: diag.column,
            snippet: diag.snippet.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileItem {
    pub file: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<DiagnosticItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features_detected: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub helpers_required: Vec<String>,
}

impl FileItem {
    pub fn converted(file: impl Into<String>, conversion: &Conversion) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::Converted,
            diagnostics: Vec::new(),
            features_detected: conversion.features.clone(),
            helpers_required: conversion.helpers.clone(),
        }
    }

    pub fn failed(file: impl Into<String>, diagnostic: DiagnosticItem) -> Self {
        Self {
            file: file.into(),
            status: FileStatus::ConversionFailed,
            diagnostics: vec![diagnostic],
            features_detected: Vec::new(),
            helpers_required: Vec::new(),
        }
    }
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub discovered: usize,
    pub converted: usize,
    pub conversion_failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub helpers_needed: Vec<String>,
}

impl Summary {
    pub fn from_files(files: &[FileItem]) -> Self {
        let converted = files
            .iter()
            .filter(|f| f.status == FileStatus::Converted)
            .count();
        let helpers: BTreeSet<&str> = files
            .iter()
            .flat_map(|f| f.helpers_required.iter().map(String::as_str))
            .collect();
        Self {
            discovered: files.len(),
            converted,
            conversion_failed: files.len() - converted,
            helpers_needed: helpers.into_iter().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// RFC 3339 UTC timestamp.
    pub generated_at: String,
    pub summary: Summary,
    pub files: Vec<FileItem>,
}

impl RunReport {
    pub fn new(files: Vec<FileItem>) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            summary: Summary::from_files(&files),
            files,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.conversion_failed > 0
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        create_parent(path)?;
        let mut raw = serde_json::to_string_pretty(self)?;
        raw.push('\n');
        fs::write(path, raw)?;
        Ok(())
    }

    /// Write one CSV row per file, sorted by file name.
    pub fn write_csv(&self, path: &Path) -> Result<(), ReportError> {
        create_parent(path)?;
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "file",
            "status",
            "diagnostics_count",
            "helpers_count",
            "features_count",
        ])?;

        let mut files: Vec<&FileItem> = self.files.iter().collect();
        files.sort_by(|a, b| a.file.cmp(&b.file));
        for item in files {
            writer.write_record([
                item.file.clone(),
                item.status.to_string(),
                item.diagnostics.len().to_string(),
                item.helpers_required.len().to_string(),
                item.features_detected.len().to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn create_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir),
        _ => Ok(()),
    }
}

/// Failure to persist a report.
#[derive(Debug)]
pub enum ReportError {
    Io(io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "report I/O error: {}", e),
            ReportError::Json(e) => write!(f, "report JSON error: {}", e),
            ReportError::Csv(e) => write!(f, "report CSV error: {}", e),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Io(e) => Some(e),
            ReportError::Json(e) => Some(e),
            ReportError::Csv(e) => Some(e),
        }
    }
}

impl From<io::Error> for ReportError {
    fn from(e: io::Error) -> Self {
        ReportError::Io(e)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        ReportError::Json(e)
    }
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Csv(e)
    }
}
