//! Batch run configuration.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default extension for converted files.
pub const DEFAULT_OUTPUT_EXT: &str = ".gotmpl";

/// Options for converting a batch of template files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Template files to convert, in order.
    pub inputs: Vec<PathBuf>,

    /// Directory receiving `<stem><ext>` for every converted input.
    /// When unset, the single input's output goes to stdout.
    pub out_dir: Option<PathBuf>,

    /// Output file extension, including the leading dot.
    /// Default: `.gotmpl`
    pub ext: String,

    /// Write a JSON run report here.
    pub report_json: Option<PathBuf>,

    /// Write a CSV run report here.
    pub report_csv: Option<PathBuf>,

    /// Stop at the first file that fails to convert.
    /// Default: false
    pub strict: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            out_dir: None,
            ext: DEFAULT_OUTPUT_EXT.to_string(),
            report_json: None,
            report_csv: None,
            strict: false,
        }
    }
}

impl RunConfig {
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }

    /// Config that stops at the first failure.
    pub fn strict(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            strict: true,
            ..Self::default()
        }
    }

    /// Check the configuration before any file is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inputs.is_empty() {
            return Err(ConfigError::NoInputs);
        }
        if !self.ext.starts_with('.') {
            return Err(ConfigError::InvalidExtension(self.ext.clone()));
        }
        if self.out_dir.is_none() && self.inputs.len() > 1 {
            return Err(ConfigError::OutDirRequired(self.inputs.len()));
        }
        let mut outputs = HashSet::new();
        for input in &self.inputs {
            if let Some(out) = self.output_path(input) {
                if !outputs.insert(out.clone()) {
                    return Err(ConfigError::DuplicateOutput(out));
                }
            }
        }
        if let Some(missing) = self.inputs.iter().find(|p| !p.is_file()) {
            return Err(ConfigError::MissingInput(missing.clone()));
        }
        Ok(())
    }

    /// Check the options of a stdin conversion, which has no input paths
    /// and writes only to stdout.
    pub fn validate_stdin(&self) -> Result<(), ConfigError> {
        let flag = if self.out_dir.is_some() {
            "--out"
        } else if self.report_json.is_some() {
            "--report-json"
        } else if self.report_csv.is_some() {
            "--report-csv"
        } else if self.strict {
            "--strict"
        } else {
            return Ok(());
        };
        Err(ConfigError::StdinUnsupported(flag))
    }

    /// Where the converted form of `input` is written.
    pub fn output_path(&self, input: &Path) -> Option<PathBuf> {
        let dir = self.out_dir.as_ref()?;
        let stem = input.file_stem()?.to_string_lossy();
        Some(dir.join(format!("{}{}", stem, self.ext)))
    }
}

/// Invalid run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NoInputs,
    InvalidExtension(String),
    OutDirRequired(usize),
    DuplicateOutput(PathBuf),
    MissingInput(PathBuf),
    StdinUnsupported(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoInputs => write!(f, "no input templates given"),
            ConfigError::InvalidExtension(ext) => {
                write!(f, "--ext must start with '.', got {:?}", ext)
            }
            ConfigError::OutDirRequired(n) => {
                write!(f, "--out is required when converting {} files", n)
            }
            ConfigError::DuplicateOutput(path) => {
                write!(f, "more than one input converts to {:?}", path)
            }
            ConfigError::MissingInput(path) => {
                write!(f, "input path {:?} is not a readable file", path)
            }
            ConfigError::StdinUnsupported(flag) => {
                write!(f, "{} requires input paths; stdin output goes to stdout", flag)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
