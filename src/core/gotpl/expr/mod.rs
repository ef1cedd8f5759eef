//! FreeMarker expression rewriting.
//!
//! [`ExpressionMapper`] turns one FreeMarker expression into the prefix-call
//! form used inside Go template actions. Rules are tried in a fixed order
//! and the first rule that matches at the top level recurses into its
//! operands:
//!
//! 1. unary `!x` → `not x`
//! 2. default `a!b` → `default b a`
//! 3. existence `x??` → `exists x`
//! 4. `||` and `&&` → `or ...` / `and ...`
//! 5. comparisons → `eq`, `ne`, `gt`, `lt`, `ge`, `le`
//! 6. parenthesized groups
//! 7. builtin chains `x?name(args)`
//! 8. function calls (only `formatPrice`)
//! 9. literals
//! 10. arithmetic (always rejected)
//! 11. identifier paths `a.b[c]`
//!
//! Every helper the output references is recorded so that callers can tell
//! the template runtime which functions to provide.

pub mod builtins;
pub mod literal;
pub mod split;

use std::collections::{BTreeSet, HashMap};

use log::trace;

use self::builtins::parse_builtin_chain;
use self::literal::map_literal;
use self::split::{
    has_top_level_arithmetic, split_args, split_top_level, split_top_level_compare,
    split_top_level_default, strip_outer_paren,
};
use crate::core::gotpl::helpers::Helper;
use crate::core::gotpl::scope::Binding;
use crate::core::quote::{find_matching, ident_len};
use crate::utils::error::{ExprError, ExprResult};

/// Rewrites FreeMarker expressions against a fixed set of local bindings.
///
/// A mapper is cheap to build. The emitter creates one per expression with a
/// snapshot of the names currently in scope, then merges [`helpers`] into
/// the document-wide set.
///
/// [`helpers`]: ExpressionMapper::helpers
#[derive(Debug, Clone, Default)]
pub struct ExpressionMapper {
    locals: HashMap<String, Binding>,
    helpers: BTreeSet<Helper>,
}

impl ExpressionMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mapper that resolves the given names as `$name` locals
    /// bound by `<#assign>`.
    pub fn with_locals<I, S>(locals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_bindings(locals.into_iter().map(|name| (name, Binding::Assigned)))
    }

    /// Create a mapper over named bindings, such as a [`Scopes`] snapshot.
    ///
    /// [`Scopes`]: crate::core::gotpl::Scopes
    pub fn with_bindings<I, S>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (S, Binding)>,
        S: Into<String>,
    {
        Self {
            locals: bindings
                .into_iter()
                .map(|(name, binding)| (name.into(), binding))
                .collect(),
            helpers: BTreeSet::new(),
        }
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.locals.contains_key(name)
    }

    pub fn binding(&self, name: &str) -> Option<Binding> {
        self.locals.get(name).copied()
    }

    /// Helpers required by everything mapped so far, ordered by name.
    pub fn helpers(&self) -> impl Iterator<Item = Helper> + '_ {
        self.helpers.iter().copied()
    }

    /// Rewrite one expression.
    pub fn map_expr(&mut self, expr: &str) -> ExprResult<String> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(ExprError::new("empty expression"));
        }
        let mapped = self.map_trimmed(expr)?;
        trace!("mapped {:?} -> {:?}", expr, mapped);
        Ok(mapped)
    }

    fn map_trimmed(&mut self, expr: &str) -> ExprResult<String> {
        if let Some(inner) = expr.strip_prefix('!') {
            if !inner.starts_with('=') {
                let operand = self.map_expr(inner)?;
                return Ok(self.call(Helper::Not, &operand, &[]));
            }
        }

        if let Some((left, right)) = split_top_level_default(expr) {
            let value = self.map_expr(left)?;
            let fallback = if right.is_empty() {
                "\"\"".to_string()
            } else {
                self.map_expr(right)?
            };
            return Ok(self.call(Helper::Default, &fallback, &[value]));
        }

        if let Some(base) = expr.strip_suffix("??") {
            let operand = self.map_expr(base)?;
            return Ok(self.call(Helper::Exists, &operand, &[]));
        }

        for (sep, helper) in [("||", Helper::Or), ("&&", Helper::And)] {
            let parts = split_top_level(expr, sep);
            if parts.len() >= 2 {
                let mapped = parts
                    .into_iter()
                    .map(|part| self.map_expr(part))
                    .collect::<ExprResult<Vec<_>>>()?;
                self.helpers.insert(helper);
                return Ok(prefix_call(helper.name(), &mapped));
            }
        }

        if let Some((left, right, op)) = split_top_level_compare(expr) {
            let left = self.map_expr(left)?;
            let right = self.map_expr(right)?;
            return Ok(prefix_call(comparison_function(op), &[left, right]));
        }

        if let Some(inner) = strip_outer_paren(expr) {
            return Ok(format!("({})", self.map_expr(inner)?));
        }

        if let Some((base, calls)) = parse_builtin_chain(expr) {
            let mut current = self.map_expr(base)?;
            for call in &calls {
                current = self.apply_builtin(current, call)?;
            }
            return Ok(current);
        }

        if let Some((name, args)) = parse_function_call(expr) {
            return self.map_function_call(name, &args);
        }

        if let Some(literal) = map_literal(expr)? {
            return Ok(literal);
        }

        if has_top_level_arithmetic(expr) {
            return Err(ExprError::new(format!(
                "unsupported arithmetic expression {:?}",
                expr
            )));
        }

        self.resolve_identifier(expr)
    }

    fn map_function_call(&mut self, name: &str, args: &[&str]) -> ExprResult<String> {
        let args = args
            .iter()
            .map(|arg| self.map_expr(arg))
            .collect::<ExprResult<Vec<_>>>()?;
        match name {
            "formatPrice" => {
                let [arg] = args.as_slice() else {
                    return Err(ExprError::new("formatPrice expects one argument"));
                };
                Ok(self.call(Helper::FormatPrice, arg, &[]))
            }
            other => Err(ExprError::new(format!(
                "unsupported function call {:?}",
                other
            ))),
        }
    }

    /// Resolve `a`, `a.b`, `a[k]` and mixed paths. Locals become `$a`,
    /// everything else is a field of the root context `.a`.
    fn resolve_identifier(&mut self, expr: &str) -> ExprResult<String> {
        if expr == "." {
            return Ok(".".to_string());
        }
        if expr.starts_with('$') {
            return Ok(expr.to_string());
        }

        let head_len = name_len(expr);
        if head_len == 0 {
            return Err(ExprError::unsupported_identifier(expr));
        }
        let head = &expr[..head_len];
        let mut current = if self.is_local(head) {
            format!("${}", head)
        } else {
            format!(".{}", head)
        };

        let mut rest = &expr[head_len..];
        while !rest.is_empty() {
            if let Some(after_dot) = rest.strip_prefix('.') {
                let field_len = name_len(after_dot);
                if field_len == 0 {
                    return Err(ExprError::unsupported_identifier(expr));
                }
                current = format!("{}.{}", wrap(&current), &after_dot[..field_len]);
                rest = &after_dot[field_len..];
            } else if rest.starts_with('[') {
                let end = find_matching(rest, 0, '[', ']')
                    .ok_or_else(|| ExprError::unsupported_identifier(expr))?;
                let key = rest[1..end].trim();
                if key.is_empty() {
                    return Err(ExprError::unsupported_identifier(expr));
                }
                let key = self.map_expr(key)?;
                current = prefix_call("index", &[current, key]);
                rest = &rest[end + 1..];
            } else {
                return Err(ExprError::unsupported_identifier(expr));
            }
        }
        Ok(current)
    }

    /// Record `helper` and build `helper <first> <rest...>`.
    fn call(&mut self, helper: Helper, first: &str, rest: &[String]) -> String {
        self.helpers.insert(helper);
        let mut out = format!("{} {}", helper.name(), wrap(first));
        for arg in rest {
            out.push(' ');
            out.push_str(&wrap(arg));
        }
        out
    }
}

/// Parenthesize an operand that would otherwise split into several pipeline
/// arguments. Operands already enclosed in one pair of parens are kept.
pub fn wrap(expr: &str) -> String {
    let expr = expr.trim();
    if expr.contains([' ', '\t', '\n']) && strip_outer_paren(expr).is_none() {
        format!("({})", expr)
    } else {
        expr.to_string()
    }
}

fn prefix_call(function: &str, args: &[String]) -> String {
    let mut out = function.to_string();
    for arg in args {
        out.push(' ');
        out.push_str(&wrap(arg));
    }
    out
}

/// Length of the identifier at the start of `s`; 0 when it starts with a
/// digit, since `.1e3` would read as a number in Go.
fn name_len(s: &str) -> usize {
    if s.starts_with(|c: char| c.is_numeric()) {
        return 0;
    }
    ident_len(s)
}

fn comparison_function(op: &str) -> &'static str {
    match op {
        "==" | "=" => "eq",
        "!=" => "ne",
        ">" => "gt",
        "<" => "lt",
        ">=" => "ge",
        _ => "le",
    }
}

/// `name(args)` where `name` is a bare identifier and the closing paren ends
/// the expression.
fn parse_function_call(expr: &str) -> Option<(&str, Vec<&str>)> {
    let name_len = ident_len(expr);
    if name_len == 0 {
        return None;
    }
    let rest = &expr[name_len..];
    if !rest.starts_with('(') {
        return None;
    }
    let end = find_matching(rest, 0, '(', ')')?;
    if end != rest.len() - 1 {
        return None;
    }
    Some((&expr[..name_len], split_args(&rest[1..end])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(expr: &str) -> String {
        ExpressionMapper::new().map_expr(expr).unwrap()
    }

    fn map_err(expr: &str) -> String {
        ExpressionMapper::new().map_expr(expr).unwrap_err().message
    }

    fn helper_names(m: &ExpressionMapper) -> Vec<&'static str> {
        m.helpers().map(Helper::name).collect()
    }

    #[test]
    fn test_simple_paths() {
        assert_eq!(map("name"), ".name");
        assert_eq!(map("user.name"), ".user.name");
        assert_eq!(map("."), ".");
        assert_eq!(map("$x.y"), "$x.y");
        assert_eq!(map("  user  "), ".user");
    }

    #[test]
    fn test_default_operator() {
        let mut m = ExpressionMapper::new();
        assert_eq!(m.map_expr("ad.price!''").unwrap(), r#"default "" .ad.price"#);
        assert_eq!(helper_names(&m), vec!["default"]);
        assert_eq!(map("a!"), r#"default "" .a"#);
        assert_eq!(map("a!b!c"), "default (default .c .b) .a");
    }

    #[test]
    fn test_format_price_with_default() {
        let mut m = ExpressionMapper::new();
        assert_eq!(
            m.map_expr("formatPrice(ad.price!'')").unwrap(),
            r#"formatPrice (default "" .ad.price)"#
        );
        assert_eq!(helper_names(&m), vec!["default", "formatPrice"]);
    }

    #[test]
    fn test_negation_and_existence() {
        let mut m = ExpressionMapper::new();
        assert_eq!(m.map_expr("!user.active").unwrap(), "not .user.active");
        assert_eq!(m.map_expr("user??").unwrap(), "exists .user");
        assert_eq!(helper_names(&m), vec!["exists", "not"]);
        assert_eq!(map("a && !b"), "and .a (not .b)");
    }

    #[test]
    fn test_logic_and_comparisons() {
        assert_eq!(map("a || b || c"), "or .a .b .c");
        assert_eq!(map("a && b == 1"), "and .a (eq .b 1)");
        assert_eq!(map(r#"client_id="mim""#), r#"eq .client_id "mim""#);
        assert_eq!(map("count >= 2"), "ge .count 2");
        assert_eq!(map("count <= 2"), "le .count 2");
        assert_eq!(map("count > 2"), "gt .count 2");
        assert_eq!(map("count < 2"), "lt .count 2");
        assert_eq!(map("a != b"), "ne .a .b");
    }

    #[test]
    fn test_operators_inside_literals_are_opaque() {
        assert_eq!(map(r#"x == "a || b""#), r#"eq .x ("a || b")"#);
        assert_eq!(map(r#"x == "a && b""#), r#"eq .x ("a && b")"#);
        assert_eq!(map(r#"x == "1+2""#), r#"eq .x "1+2""#);
        assert_eq!(map(r#"x == 'a >= b'"#), r#"eq .x ("a >= b")"#);
    }

    #[test]
    fn test_parens() {
        assert_eq!(map("(a || b) && c"), "and (or .a .b) .c");
        assert_eq!(map("(a)"), "(.a)");
    }

    #[test]
    fn test_builtins() {
        let mut m = ExpressionMapper::new();
        assert_eq!(m.map_expr("items?size").unwrap(), "len .items");
        assert_eq!(m.map_expr(r#"p?index_of("-", 2)"#).unwrap(), r#"indexOf .p "-" 2"#);
        assert_eq!(m.map_expr("name?trim?has_content").unwrap(), "hasContent (trim .name)");
        assert_eq!(m.map_expr("s?substring(0, 3)").unwrap(), "substring .s 0 3");
        assert_eq!(m.map_expr("s?contains('x')").unwrap(), r#"contains .s "x""#);
        assert_eq!(m.map_expr("n?number").unwrap(), "toNumber .n");
        assert_eq!(m.map_expr("n?number_to_datetime").unwrap(), "numberToDatetime .n");
        assert_eq!(m.map_expr("n?string").unwrap(), "toString .n");
        assert_eq!(m.map_expr(r#"n?string("0.00")"#).unwrap(), r#"toString .n "0.00""#);
        assert_eq!(m.map_expr("html?no_esc").unwrap(), "safeHTML .html");
        assert_eq!(
            helper_names(&m),
            vec![
                "contains",
                "hasContent",
                "indexOf",
                "numberToDatetime",
                "safeHTML",
                "substring",
                "toNumber",
                "toString",
                "trim"
            ]
        );
    }

    #[test]
    fn test_builtin_arity_errors() {
        assert_eq!(map_err("s?contains"), "?contains expects one argument");
        assert_eq!(map_err("s?substring"), "?substring expects one or two arguments");
        assert_eq!(map_err("s?index_of(1, 2, 3)"), "?index_of expects one or two arguments");
        assert_eq!(map_err("s?upper_case"), "unsupported builtin ?upper_case");
    }

    #[test]
    fn test_index_builtin_requires_loop_item() {
        let mut m = ExpressionMapper::with_bindings([
            ("user", Binding::LoopItem),
            ("user_index", Binding::LoopIndex),
        ]);
        assert_eq!(m.map_expr("user?index").unwrap(), "$user_index");
        assert_eq!(
            m.map_expr("user.name?index").unwrap_err().message,
            "?index is only supported on loop item variables"
        );
        assert_eq!(
            m.map_expr("user?index(1)").unwrap_err().message,
            "?index expects no arguments"
        );

        let mut plain = ExpressionMapper::with_locals(["total"]);
        assert_eq!(
            plain.map_expr("total?index").unwrap_err().message,
            "?index is only supported on loop item variables"
        );
        assert_eq!(
            map_err("user?index"),
            "?index is only supported on loop item variables"
        );

        let mut assigned = ExpressionMapper::with_locals(["user", "user_index"]);
        assert_eq!(
            assigned.map_expr("user?index").unwrap_err().message,
            "?index is only supported on loop item variables"
        );
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(map_err("formatPrice(a, b)"), "formatPrice expects one argument");
        assert_eq!(map_err("formatPrice()"), "formatPrice expects one argument");
        assert_eq!(map_err("myFunc(a)"), r#"unsupported function call "myFunc""#);
    }

    #[test]
    fn test_literals() {
        assert_eq!(map("'l\\'abc'"), r#""l'abc""#);
        assert_eq!(map(r#""plain""#), r#""plain""#);
        assert_eq!(map("42"), "42");
        assert_eq!(map("-3.5"), "-3.5");
        assert_eq!(map("null"), "null");
    }

    #[test]
    fn test_arithmetic_rejected() {
        assert_eq!(map_err("a + 1"), r#"unsupported arithmetic expression "a + 1""#);
        assert_eq!(map_err("total-1"), r#"unsupported arithmetic expression "total-1""#);
        assert_eq!(map_err(r#""a" + "b""#), r#"unsupported arithmetic expression "\"a\" + \"b\"""#);
    }

    #[test]
    fn test_bracket_access() {
        let mut m = ExpressionMapper::with_locals(["user_index"]);
        assert_eq!(
            m.map_expr("users[user_index].name").unwrap(),
            "(index .users $user_index).name"
        );
        assert_eq!(
            map(r#"user.metadata.attributes["userType"]"#),
            r#"index .user.metadata.attributes "userType""#
        );
        assert_eq!(map("m[a][b]"), "index (index .m .a) .b");
        assert_eq!(map("m['k']"), r#"index .m "k""#);
    }

    #[test]
    fn test_identifier_errors() {
        assert_eq!(map_err(""), "empty expression");
        assert_eq!(map_err("   "), "empty expression");
        assert_eq!(map_err("a."), r#"unsupported identifier expression "a.""#);
        assert_eq!(map_err("a[]"), r#"unsupported identifier expression "a[]""#);
        assert_eq!(map_err("a[0"), r#"unsupported identifier expression "a[0""#);
        assert_eq!(map_err("@x"), r#"unsupported identifier expression "@x""#);
        assert_eq!(map_err("a - b"), r#"unsupported identifier expression "a - b""#);
        assert_eq!(map_err("1e3"), r#"unsupported identifier expression "1e3""#);
        assert_eq!(map_err("2x"), r#"unsupported identifier expression "2x""#);
        assert_eq!(map_err("a.0"), r#"unsupported identifier expression "a.0""#);
        assert_eq!(map_err("a.b.7c"), r#"unsupported identifier expression "a.b.7c""#);
        assert_eq!(map("a1.b_2"), ".a1.b_2");
    }

    #[test]
    fn test_locals_resolve_to_variables() {
        let mut m = ExpressionMapper::with_locals(["user"]);
        assert_eq!(m.map_expr("user.name").unwrap(), "$user.name");
        assert_eq!(m.map_expr("other.name").unwrap(), ".other.name");
    }

    #[test]
    fn test_deterministic() {
        let first = map("a!b && c?size > 1");
        for _ in 0..3 {
            assert_eq!(map("a!b && c?size > 1"), first);
        }
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap(".a"), ".a");
        assert_eq!(wrap(" len .a "), "(len .a)");
        assert_eq!(wrap("(or .a .b)"), "(or .a .b)");
        assert_eq!(wrap("(len .a) .b"), "((len .a) .b)");
    }
}
