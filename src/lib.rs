//! # ftl2gotpl
//!
//! FreeMarker to Go `html/template` source converter.
//!
//! A conversion runs four stages over one document: the scanner produces
//! tokens, the parser builds a directive tree, and the emitter writes Go
//! template actions while the expression mapper rewrites every embedded
//! FreeMarker expression into prefix-call form. The first problem found
//! aborts the conversion with a positioned [`Diagnostic`].
//!
//! ## Example
//!
//! ```rust
//! use ftl2gotpl::convert_template;
//!
//! let conversion = convert_template("hello.ftl", "Hello ${user.name!'guest'}").unwrap();
//! assert_eq!(conversion.output, r#"Hello {{default "guest" .user.name}}"#);
//! assert_eq!(conversion.helpers, vec!["default"]);
//! ```

pub mod batch;
pub mod core;
pub mod utils;

pub use ftl2gotpl_ast as ast;

pub use crate::core::ftl::{parse, scan, Token, TokenKind};
pub use crate::core::gotpl::{detect_features, ExpressionMapper, Helper};
pub use crate::utils::error::{ConvertResult, Diagnostic, ErrorCode, ExprError};

use log::debug;

/// Successful conversion of one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Go template source.
    pub output: String,
    /// Helper functions the output calls, sorted.
    pub helpers: Vec<String>,
    /// Feature tags found in the source, sorted.
    pub features: Vec<String>,
}

/// Stateless FreeMarker to Go template converter.
///
/// Every call allocates its own scope stack and helper set, so one converter
/// can be shared across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Converter;

impl Converter {
    pub fn new() -> Self {
        Self
    }

    /// Scan, parse and emit `source`. `name` only appears in diagnostics.
    pub fn convert(&self, name: &str, source: &str) -> ConvertResult<Conversion> {
        let tokens = scan(name, source)?;
        let doc = parse(name, &tokens)?;
        let emission = crate::core::gotpl::emit(name, &doc)?;
        let features = detect_features(&doc, &emission.helpers);
        debug!(
            "{}: converted ({} helper(s), {} feature(s))",
            name,
            emission.helpers.len(),
            features.len()
        );
        Ok(Conversion {
            output: emission.output,
            helpers: emission
                .helpers
                .iter()
                .map(|h| h.name().to_string())
                .collect(),
            features,
        })
    }
}

/// Convert one FreeMarker template to Go template source.
pub fn convert_template(name: &str, source: &str) -> ConvertResult<Conversion> {
    Converter::new().convert(name, source)
}
