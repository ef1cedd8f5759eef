//! Batch conversion driver used by the CLI.
//!
//! Converts every configured input, writes outputs and reports, and returns
//! the run report. Conversion failures are recorded per file; only
//! configuration and I/O problems abort the run with an error.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use log::{info, warn};

use crate::utils::config::{ConfigError, RunConfig};
use crate::utils::report::{DiagnosticItem, FileItem, ReportError, RunReport};
use crate::Converter;

/// Run `config`. When no output directory is set, the converted text of the
/// single input is written to `stdout`.
pub fn run_batch<W: Write>(config: &RunConfig, stdout: &mut W) -> Result<RunReport, BatchError> {
    config.validate()?;

    let converter = Converter::new();
    let mut files = Vec::with_capacity(config.inputs.len());

    for input in &config.inputs {
        let display = input.display().to_string();
        let source = fs::read_to_string(input).map_err(|e| BatchError::Read(input.clone(), e))?;

        match converter.convert(&display, &source) {
            Ok(conversion) => {
                match config.output_path(input) {
                    Some(out) => {
                        if let Some(parent) = out.parent() {
                            fs::create_dir_all(parent)
                                .map_err(|e| BatchError::Write(out.clone(), e))?;
                        }
                        fs::write(&out, &conversion.output)
                            .map_err(|e| BatchError::Write(out.clone(), e))?;
                        info!("converted {} -> {}", display, out.display());
                    }
                    None => {
                        stdout
                            .write_all(conversion.output.as_bytes())
                            .map_err(|e| BatchError::Write(PathBuf::from("<stdout>"), e))?;
                    }
                }
                files.push(FileItem::converted(display, &conversion));
            }
            Err(diag) => {
                warn!("conversion failed: {}", diag);
                files.push(FileItem::failed(display, DiagnosticItem::from(&diag)));
                if config.strict {
                    break;
                }
            }
        }
    }

    let report = RunReport::new(files);
    info!(
        "conversion summary: discovered={} converted={} conversion_failed={}",
        report.summary.discovered, report.summary.converted, report.summary.conversion_failed
    );
    if !report.summary.helpers_needed.is_empty() {
        info!("helpers needed: {}", report.summary.helpers_needed.join(", "));
    }

    if let Some(path) = &config.report_json {
        report.write_json(path)?;
        info!("JSON report written to {}", path.display());
    }
    if let Some(path) = &config.report_csv {
        report.write_csv(path)?;
        info!("CSV report written to {}", path.display());
    }

    Ok(report)
}

/// Errors that abort a batch run.
#[derive(Debug)]
pub enum BatchError {
    Config(ConfigError),
    Read(PathBuf, io::Error),
    Write(PathBuf, io::Error),
    Report(ReportError),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Config(e) => write!(f, "invalid configuration: {}", e),
            BatchError::Read(path, e) => write!(f, "read {}: {}", path.display(), e),
            BatchError::Write(path, e) => write!(f, "write {}: {}", path.display(), e),
            BatchError::Report(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Config(e) => Some(e),
            BatchError::Read(_, e) | BatchError::Write(_, e) => Some(e),
            BatchError::Report(e) => Some(e),
        }
    }
}

impl From<ConfigError> for BatchError {
    fn from(e: ConfigError) -> Self {
        BatchError::Config(e)
    }
}

impl From<ReportError> for BatchError {
    fn from(e: ReportError) -> Self {
        BatchError::Report(e)
    }
}
