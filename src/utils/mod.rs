//! Utility modules
//!
//! - Diagnostics and result types shared by every stage
//! - Batch run configuration
//! - Run reports (JSON and CSV) for batch conversions

pub mod config;
pub mod error;
pub mod report;

pub use config::{ConfigError, RunConfig, DEFAULT_OUTPUT_EXT};
pub use error::{ConvertResult, Diagnostic, ErrorCode, ExprError, ExprResult};
pub use report::{DiagnosticItem, FileItem, FileStatus, ReportError, RunReport, Summary};
