//! Go `html/template` back end.

pub mod emitter;
pub mod expr;
pub mod features;
pub mod helpers;
pub mod scope;

pub use emitter::{emit, Emission, Emitter};
pub use expr::ExpressionMapper;
pub use features::detect_features;
pub use helpers::Helper;
pub use scope::{Binding, Scope, Scopes};
