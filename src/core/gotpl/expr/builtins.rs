//! FreeMarker builtin chains: `base?name` and `base?name(args)`, repeated.

use super::split::{first_top_level_question, split_args};
use super::{wrap, ExpressionMapper};
use crate::core::gotpl::helpers::Helper;
use crate::core::gotpl::scope::Binding;
use crate::core::quote::{find_matching, ident_len};
use crate::utils::error::{ExprError, ExprResult};

/// One `?name(args)` suffix. `name` is lowercased; `args` is the raw text
/// between the parentheses, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinCall<'e> {
    pub name: String,
    pub args: &'e str,
}

/// Split `expr` into its base expression and builtin suffixes.
///
/// Returns `None` when `expr` is not a well-formed chain: no top-level `?`,
/// an empty base, a `?` without a name, an unbalanced argument list, or
/// trailing text after the last call.
pub fn parse_builtin_chain(expr: &str) -> Option<(&str, Vec<BuiltinCall<'_>>)> {
    let start = first_top_level_question(expr)?;
    let base = expr[..start].trim();
    if base.is_empty() {
        return None;
    }

    let mut calls = Vec::new();
    let mut i = start;
    while i < expr.len() {
        let rest = &expr[i..];
        let Some(after_mark) = rest.strip_prefix('?') else {
            if rest.trim().is_empty() {
                break;
            }
            return None;
        };
        i += 1;

        let name_len = ident_len(after_mark);
        if name_len == 0 {
            return None;
        }
        let name = after_mark[..name_len].to_lowercase();
        i += name_len;

        let mut args = "";
        if expr[i..].starts_with('(') {
            let end = find_matching(expr, i, '(', ')')?;
            args = expr[i + 1..end].trim();
            i = end + 1;
        }
        calls.push(BuiltinCall { name, args });
    }
    Some((base, calls))
}

impl ExpressionMapper {
    /// Fold one builtin call onto the already rewritten `current` operand.
    pub(super) fn apply_builtin(
        &mut self,
        current: String,
        call: &BuiltinCall<'_>,
    ) -> ExprResult<String> {
        let args = split_args(call.args)
            .into_iter()
            .map(|arg| self.map_expr(arg))
            .collect::<ExprResult<Vec<_>>>()?;

        let mapped = match call.name.as_str() {
            "size" => format!("len {}", wrap(&current)),
            "has_content" => self.call(Helper::HasContent, &current, &[]),
            "contains" => {
                if args.len() != 1 {
                    return Err(ExprError::new("?contains expects one argument"));
                }
                self.call(Helper::Contains, &current, &args)
            }
            "substring" => {
                if !(1..=2).contains(&args.len()) {
                    return Err(ExprError::new("?substring expects one or two arguments"));
                }
                self.call(Helper::Substring, &current, &args)
            }
            "index_of" => {
                if !(1..=2).contains(&args.len()) {
                    return Err(ExprError::new("?index_of expects one or two arguments"));
                }
                self.call(Helper::IndexOf, &current, &args)
            }
            "trim" => self.call(Helper::Trim, &current, &[]),
            "index" => {
                if !args.is_empty() {
                    return Err(ExprError::new("?index expects no arguments"));
                }
                self.loop_index_of(&current)?
            }
            "number" => self.call(Helper::ToNumber, &current, &[]),
            "number_to_datetime" => self.call(Helper::NumberToDatetime, &current, &[]),
            "string" => self.call(Helper::ToString, &current, &args),
            "no_esc" => self.call(Helper::SafeHtml, &current, &[]),
            other => return Err(ExprError::new(format!("unsupported builtin ?{}", other))),
        };
        Ok(mapped)
    }

    /// `$item?index` becomes `$item_index`, but only for a bare `<#list>`
    /// item whose paired index variable is in scope.
    fn loop_index_of(&self, current: &str) -> ExprResult<String> {
        let not_loop_item = || ExprError::new("?index is only supported on loop item variables");
        let item = current.strip_prefix('$').ok_or_else(not_loop_item)?;
        if item.contains(['.', '[']) {
            return Err(not_loop_item());
        }
        let index_var = format!("{}_index", item);
        if self.binding(item) != Some(Binding::LoopItem)
            || self.binding(&index_var) != Some(Binding::LoopIndex)
        {
            return Err(not_loop_item());
        }
        Ok(format!("${}", index_var))
    }
}
