//! Runtime helper functions referenced by converted templates.
//!
//! The converter only names these; the template execution environment must
//! register a function of the same name for every helper a conversion
//! reports.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Helper {
    And,
    Contains,
    Default,
    Exists,
    FormatPrice,
    HasContent,
    IndexOf,
    Not,
    NumberToDatetime,
    Or,
    SafeHtml,
    Substring,
    ToNumber,
    ToString,
    Trim,
}

impl Helper {
    /// Every helper, in name order.
    pub const ALL: [Helper; 15] = [
        Helper::And,
        Helper::Contains,
        Helper::Default,
        Helper::Exists,
        Helper::FormatPrice,
        Helper::HasContent,
        Helper::IndexOf,
        Helper::Not,
        Helper::NumberToDatetime,
        Helper::Or,
        Helper::SafeHtml,
        Helper::Substring,
        Helper::ToNumber,
        Helper::ToString,
        Helper::Trim,
    ];

    /// Function name as it appears in converted output.
    pub fn name(self) -> &'static str {
        match self {
            Helper::And => "and",
            Helper::Contains => "contains",
            Helper::Default => "default",
            Helper::Exists => "exists",
            Helper::FormatPrice => "formatPrice",
            Helper::HasContent => "hasContent",
            Helper::IndexOf => "indexOf",
            Helper::Not => "not",
            Helper::NumberToDatetime => "numberToDatetime",
            Helper::Or => "or",
            Helper::SafeHtml => "safeHTML",
            Helper::Substring => "substring",
            Helper::ToNumber => "toNumber",
            Helper::ToString => "toString",
            Helper::Trim => "trim",
        }
    }

    /// One-line contract the runtime implementation has to honour.
    pub fn description(self) -> &'static str {
        match self {
            Helper::And => "logical and over all arguments",
            Helper::Contains => "substring or element membership test",
            Helper::Default => "fallback (first argument) when the value is missing or nil",
            Helper::Exists => "true when the value is present and not nil",
            Helper::FormatPrice => "price range formatter, sides split on '-'",
            Helper::HasContent => "true when the value is non-nil and not blank or empty",
            Helper::IndexOf => "rune index of a needle, optional start offset",
            Helper::Not => "logical negation",
            Helper::NumberToDatetime => "epoch milliseconds to timestamp",
            Helper::Or => "logical or over all arguments",
            Helper::SafeHtml => "marks a string as trusted HTML",
            Helper::Substring => "rune-safe substring with clamped bounds",
            Helper::ToNumber => "numeric coercion of strings, booleans and numbers",
            Helper::ToString => "string conversion with optional format arguments",
            Helper::Trim => "strip surrounding whitespace",
        }
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
