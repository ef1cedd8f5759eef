//! Integration tests for full template conversion

use ftl2gotpl::{convert_template, Converter, ErrorCode};
use pretty_assertions::assert_eq;

fn output(src: &str) -> String {
    match convert_template("t.ftl", src) {
        Ok(conversion) => conversion.output,
        Err(diag) => panic!("conversion of {:?} failed: {}", src, diag),
    }
}

// ============================================================================
// Documented conversions
// ============================================================================

mod documented {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_interpolation() {
        let conversion = convert_template("t.ftl", "Hello ${name}").unwrap();
        assert_eq!(conversion.output, "Hello {{.name}}");
        assert!(conversion.helpers.is_empty());
    }

    #[test]
    fn test_if_else_with_bare_equals() {
        assert_eq!(
            output(r#"<#if client_id="mim">Hi ${user.name}<#else>Bye</#if>"#),
            r#"{{if eq .client_id "mim"}}Hi {{.user.name}}{{else}}Bye{{end}}"#
        );
    }

    #[test]
    fn test_list_binds_index_and_item() {
        assert_eq!(
            output("<#list users as user>${user.name}</#list>"),
            "{{range $user_index, $user := .users}}{{$user.name}}{{end}}"
        );
    }

    #[test]
    fn test_default_operator() {
        let conversion = convert_template("t.ftl", "${ad.price!''}").unwrap();
        assert_eq!(conversion.output, r#"{{default "" .ad.price}}"#);
        assert_eq!(conversion.helpers, vec!["default"]);
    }

    #[test]
    fn test_function_definition_is_rejected() {
        let err = convert_template("t.ftl", r#"<#function f x><#return x></#function>${f("a")}"#)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmitUnsupportedFunction);
        assert_eq!((err.line, err.column), (1, 1));
        assert_eq!(
            err.to_string(),
            r#"t.ftl:1:1 [EMIT_UNSUPPORTED_FUNCTION]: unsupported FreeMarker function definition "f""#
        );
    }

    #[test]
    fn test_bracket_key_access() {
        assert_eq!(
            output(r#"${user.metadata.attributes["userType"]}"#),
            r#"{{index .user.metadata.attributes "userType"}}"#
        );
    }
}

// ============================================================================
// Scope discipline
// ============================================================================

mod scopes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_branch_local_not_visible_in_sibling_or_after() {
        assert_eq!(
            output("<#if a><#assign x = 1>${x}<#else>${x}</#if>${x}"),
            "{{if .a}}{{$x := 1}}{{$x}}{{else}}{{.x}}{{end}}{{.x}}"
        );
    }

    #[test]
    fn test_outer_local_is_reassigned_inside_block() {
        assert_eq!(
            output("<#assign x = 1><#if a><#assign x = 2></#if>${x}"),
            "{{$x := 1}}{{if .a}}{{$x = 2}}{{end}}{{$x}}"
        );
    }

    #[test]
    fn test_local_and_assign_emit_alike() {
        assert_eq!(
            output("<#local n = 1><#assign n = n>"),
            "{{$n := 1}}{{$n = $n}}"
        );
    }

    #[test]
    fn test_elseif_branches_get_own_scope() {
        assert_eq!(
            output("<#if a><#assign v = 1><#elseif b>${v}<#assign v = 2><#else>${v}</#if>"),
            "{{if .a}}{{$v := 1}}{{else if .b}}{{.v}}{{$v := 2}}{{else}}{{.v}}{{end}}"
        );
    }

    #[test]
    fn test_loop_variables_end_with_loop() {
        assert_eq!(
            output("<#list xs as x>${x}</#list>${x}"),
            "{{range $x_index, $x := .xs}}{{$x}}{{end}}{{.x}}"
        );
    }

    #[test]
    fn test_nested_loops_see_outer_item() {
        assert_eq!(
            output("<#list rows as row><#list row.cells as cell>${row?index}:${cell}</#list></#list>"),
            "{{range $row_index, $row := .rows}}{{range $cell_index, $cell := $row.cells}}{{$row_index}}:{{$cell}}{{end}}{{end}}"
        );
    }
}

// ============================================================================
// Loop index builtin
// ============================================================================

mod loop_index {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_on_item() {
        assert_eq!(
            output("<#list items as item>${item?index}: ${item.label}</#list>"),
            "{{range $item_index, $item := .items}}{{$item_index}}: {{$item.label}}{{end}}"
        );
    }

    #[test]
    fn test_index_on_derived_value_fails() {
        let err = convert_template("t.ftl", "<#list items as item>${item.label?index}</#list>")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmitExpressionMap);
        assert_eq!(err.message, "?index is only supported on loop item variables");
        assert_eq!(err.snippet, "item.label?index");
        assert_eq!((err.line, err.column), (1, 22));
    }

    #[test]
    fn test_index_outside_loop_fails() {
        let err = convert_template("t.ftl", "<#assign item = 1>${item?index}").unwrap_err();
        assert_eq!(err.code, ErrorCode::EmitExpressionMap);
    }

    #[test]
    fn test_index_on_assigned_lookalike_fails() {
        let err = convert_template(
            "t.ftl",
            "<#assign user_index = 0><#assign user = 1>${user?index}",
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmitExpressionMap);
        assert_eq!(err.message, "?index is only supported on loop item variables");
    }

    #[test]
    fn test_index_lookup_inside_loop() {
        assert_eq!(
            output("<#list users as user>${users[user?index].name}</#list>"),
            "{{range $user_index, $user := .users}}{{(index .users $user_index).name}}{{end}}"
        );
    }
}

// ============================================================================
// Quoting safety
// ============================================================================

mod quoting {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operators_in_literal_do_not_split() {
        assert_eq!(
            output(r#"<#if note == "a || b && c > d">x</#if>"#),
            r#"{{if eq .note ("a || b && c > d")}}x{{end}}"#
        );
    }

    #[test]
    fn test_arithmetic_in_literal_is_not_arithmetic() {
        assert_eq!(output(r#"${x == "1+2"}"#), r#"{{eq .x "1+2"}}"#);
    }

    #[test]
    fn test_single_quotes_are_requoted() {
        assert_eq!(output(r"${label!'l\'abc'}"), r#"{{default "l'abc" .label}}"#);
    }

    #[test]
    fn test_braces_in_literal_inside_interpolation() {
        assert_eq!(output(r#"${x!"}{"}"#), r#"{{default "}{" .x}}"#);
    }
}

// ============================================================================
// Pass-through and settings
// ============================================================================

mod passthrough {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_without_markers_is_unchanged() {
        let src = "plain <b>html</b> with $ and # and {braces}\n<a href=\"#\">x</a>";
        assert_eq!(output(src), src);
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(output("a<#-- ${ignored} <#if> -->b"), "ab");
    }

    #[test]
    fn test_settings_become_comments() {
        assert_eq!(
            output(r#"<#ftl encoding="UTF-8"><#setting locale="fr_FR">Hi"#),
            r#"{{/* ftl setting ignored: ftl encoding="UTF-8" */}}{{/* ftl setting ignored: locale="fr_FR" */}}Hi"#
        );
    }

    #[test]
    fn test_alt_interpolation_and_break() {
        assert_eq!(
            output("<#list xs as x>#{x}<#break></#list>"),
            "{{range $x_index, $x := .xs}}{{$x}}{{break}}{{end}}"
        );
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

mod diagnostics {
    use super::*;
    use pretty_assertions::assert_eq;

    fn code(src: &str) -> ErrorCode {
        convert_template("t.ftl", src).unwrap_err().code
    }

    #[test]
    fn test_lexical_errors() {
        assert_eq!(code("a <#-- never closed"), ErrorCode::LexUnclosedComment);
        assert_eq!(code("${user.name"), ErrorCode::LexUnclosedInterpolation);
        assert_eq!(code("<#if x"), ErrorCode::LexUnclosedTag);
    }

    #[test]
    fn test_structural_errors() {
        assert_eq!(code("<#macro m></#macro>"), ErrorCode::ParseUnsupportedDirective);
        assert_eq!(code("<#list items>x</#list>"), ErrorCode::ParseInvalidList);
        assert_eq!(code("<#assign x>"), ErrorCode::ParseInvalidAssign);
        assert_eq!(code("x</#list>"), ErrorCode::ParseUnexpectedClosing);
        assert_eq!(code("<#else>"), ErrorCode::ParseUnexpectedDirective);
    }

    #[test]
    fn test_unclosed_block_points_at_opening_tag() {
        let err = convert_template("t.ftl", "line1\n  <#if x>body").unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseUnclosedIf);
        assert_eq!((err.line, err.column), (2, 3));
        assert_eq!(err.snippet, "<#if x>");
    }

    #[test]
    fn test_emission_errors() {
        let err = convert_template("t.ftl", r#"<@greet name="x"/>"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmitUnsupportedMacroCall);
        assert_eq!(err.message, "unsupported FreeMarker macro call <greet>");

        assert_eq!(code("<#return>"), ErrorCode::EmitUnsupportedReturn);

        let err = convert_template("t.ftl", "ok\n${a + b}").unwrap_err();
        assert_eq!(err.code, ErrorCode::EmitExpressionMap);
        assert_eq!((err.line, err.column), (2, 1));
        assert_eq!(err.snippet, "a + b");
        assert_eq!(err.message, r#"unsupported arithmetic expression "a + b""#);
    }

    #[test]
    fn test_digit_leading_path_is_not_a_field() {
        let err = convert_template("t.ftl", "${1e3}").unwrap_err();
        assert_eq!(err.code, ErrorCode::EmitExpressionMap);
        assert_eq!(err.message, r#"unsupported identifier expression "1e3""#);
        assert_eq!(code("${items.0}"), ErrorCode::EmitExpressionMap);
    }

    #[test]
    fn test_unknown_function_call() {
        let err = convert_template("t.ftl", "${upper(name)}").unwrap_err();
        assert_eq!(err.message, r#"unsupported function call "upper""#);
    }
}

// ============================================================================
// Helpers and features
// ============================================================================

mod reporting {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_helpers_are_sorted_and_deduplicated() {
        let conversion = Converter::new()
            .convert(
                "t.ftl",
                "<#if !a?has_content || b??>${c!'x'}${d!'y'}${formatPrice(p)}</#if>",
            )
            .unwrap();
        assert_eq!(
            conversion.helpers,
            vec!["default", "exists", "formatPrice", "hasContent", "not", "or"]
        );
    }

    #[test]
    fn test_features_include_helpers() {
        let conversion = convert_template(
            "t.ftl",
            "<#list xs as x><#if x.on>${x.name?trim}<#else>-</#if></#list>",
        )
        .unwrap();
        assert_eq!(
            conversion.features,
            vec![
                "directive:else",
                "directive:if",
                "directive:list",
                "helper:trim",
                "node:interpolation",
                "node:text",
            ]
        );
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let src = "<#if a && b?has_content>${c!d}</#if>";
        let first = convert_template("t.ftl", src);
        assert_eq!(
            first.as_ref().map(|c| c.output.as_str()),
            Ok("{{if and .a (hasContent .b)}}{{default .d .c}}{{end}}")
        );
        for _ in 0..5 {
            assert_eq!(convert_template("t.ftl", src), first);
        }
    }
}
