//! Conversion core
//!
//! - `ftl`: FreeMarker scanner and parser
//! - `gotpl`: expression rewriting and Go template emission

pub mod ftl;
pub mod gotpl;
pub mod quote;
