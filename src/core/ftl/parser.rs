//! Recursive-descent parser from FreeMarker tokens to the syntax tree.
//!
//! A single forward index walks the token slice. Block directives collect
//! their bodies with [`Parser::parse_nodes`], which returns as soon as it
//! meets a directive whose key is in the caller's stopper set. The block
//! parser then checks that the stopping token is the terminator it expects.

use ftl2gotpl_ast::{
    AssignNode, BareDirective, BareDirectiveNode, Document, ElseIf, FunctionNode, IfNode,
    InterpolationNode, ListNode, MacroCallNode, Node, SettingNode, TextNode,
};
use lazy_static::lazy_static;
use regex::Regex;

use super::token::{Token, TokenKind};
use crate::utils::error::{ConvertResult, Diagnostic, ErrorCode};

lazy_static! {
    static ref LIST_DIRECTIVE: Regex =
        Regex::new(r"(?is)^(.*?)\s+as\s+([A-Za-z_][A-Za-z0-9_]*)$").unwrap();
    static ref ASSIGN_DIRECTIVE: Regex =
        Regex::new(r"(?is)^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+)$").unwrap();
}

const TOP_LEVEL: &[&str] = &["dir:elseif", "dir:else"];
const IF_BRANCH: &[&str] = &["dir:elseif", "dir:else", "close:if"];
const ELSE_BRANCH: &[&str] = &["close:if"];
const LIST_BODY: &[&str] = &["close:list"];
const FUNCTION_BODY: &[&str] = &["close:function"];

/// Parser progress over a token slice.
pub struct Parser<'t> {
    file: &'t str,
    tokens: &'t [Token],
    index: usize,
}

impl<'t> Parser<'t> {
    pub fn new(file: &'t str, tokens: &'t [Token]) -> Self {
        Self {
            file,
            tokens,
            index: 0,
        }
    }

    /// Parse the whole token sequence into a document.
    pub fn parse_document(mut self) -> ConvertResult<Document> {
        let (nodes, stop) = self.parse_nodes(TOP_LEVEL)?;
        if let Some(tok) = stop {
            return Err(self.unexpected_branch(tok));
        }
        Ok(Document::new(nodes))
    }

    /// `<#else>` / `<#elseif>` outside the `<#if>` body that owns them.
    fn unexpected_branch(&self, tok: &Token) -> Diagnostic {
        self.error(
            ErrorCode::ParseUnexpectedDirective,
            tok,
            format!("unexpected directive {:?}", tok.directive_name().unwrap_or("")),
        )
    }

    fn error(&self, code: ErrorCode, tok: &Token, message: impl Into<String>) -> Diagnostic {
        Diagnostic::at(code, self.file, tok.pos, message).with_snippet(tok.raw.clone())
    }

    /// Collect nodes until EOF or a stopper directive.
    ///
    /// Returns the collected nodes and the token that stopped collection,
    /// or `None` when the input ran out.
    fn parse_nodes(
        &mut self,
        stoppers: &[&str],
    ) -> ConvertResult<(Vec<Node>, Option<&'t Token>)> {
        let tokens = self.tokens;
        let mut nodes = Vec::new();
        while let Some(tok) = tokens.get(self.index) {
            self.index += 1;
            match &tok.kind {
                TokenKind::Text(content) => nodes.push(Node::Text(TextNode {
                    pos: tok.pos,
                    content: content.clone(),
                })),
                TokenKind::Interpolation { expr, alt_style } => {
                    nodes.push(Node::Interpolation(InterpolationNode {
                        pos: tok.pos,
                        expr: expr.trim().to_string(),
                        alt_style: *alt_style,
                    }))
                }
                TokenKind::MacroCall { name, args } => nodes.push(Node::MacroCall(MacroCallNode {
                    pos: tok.pos,
                    name: name.clone(),
                    args: args.clone(),
                })),
                TokenKind::Directive { name, closing, .. } => {
                    if let Some(key) = tok.directive_key() {
                        if stoppers.contains(&key.as_str()) {
                            return Ok((nodes, Some(tok)));
                        }
                    }
                    if *closing {
                        return Err(self.error(
                            ErrorCode::ParseUnexpectedClosing,
                            tok,
                            format!("unexpected closing directive </#{}>", name),
                        ));
                    }
                    nodes.push(self.parse_directive(tok)?);
                }
            }
        }
        Ok((nodes, None))
    }

    /// Dispatch one opening directive to its sub-parser.
    fn parse_directive(&mut self, tok: &'t Token) -> ConvertResult<Node> {
        let name = tok.directive_name().unwrap_or_default();
        let args = tok.args().trim();
        match name {
            "if" => self.parse_if(tok),
            "list" => self.parse_list(tok),
            "assign" => self.parse_assign(tok, false),
            "local" => self.parse_assign(tok, true),
            "setting" => Ok(Node::Setting(SettingNode {
                pos: tok.pos,
                raw: args.to_string(),
            })),
            "ftl" => Ok(Node::Setting(SettingNode {
                pos: tok.pos,
                raw: format!("ftl {}", args),
            })),
            "function" => self.parse_function(tok),
            "else" | "elseif" => Err(self.unexpected_branch(tok)),
            "return" | "break" => Ok(Node::BareDirective(BareDirectiveNode {
                pos: tok.pos,
                name: BareDirective::from_name(name).unwrap_or(BareDirective::Break),
                args: args.to_string(),
            })),
            other => Err(self.error(
                ErrorCode::ParseUnsupportedDirective,
                tok,
                format!("unsupported directive <{}>", other),
            )),
        }
    }

    /// `<#if>` with chained `<#elseif>` branches and a trailing `<#else>`.
    fn parse_if(&mut self, tok: &'t Token) -> ConvertResult<Node> {
        let cond = tok.args().trim();
        if cond.is_empty() {
            return Err(self.error(
                ErrorCode::ParseInvalidIf,
                tok,
                "if directive requires a condition",
            ));
        }

        let (then_body, mut stop) = self.parse_nodes(IF_BRANCH)?;
        let mut node = IfNode {
            pos: tok.pos,
            cond: cond.to_string(),
            then_body,
            else_ifs: Vec::new(),
            else_body: Vec::new(),
        };

        while let Some(branch) = stop.filter(|t| t.is_opening("elseif")) {
            let branch_cond = branch.args().trim();
            if branch_cond.is_empty() {
                return Err(self.error(
                    ErrorCode::ParseInvalidElseif,
                    branch,
                    "elseif requires a condition",
                ));
            }
            let (body, next) = self.parse_nodes(IF_BRANCH)?;
            node.else_ifs.push(ElseIf {
                pos: branch.pos,
                cond: branch_cond.to_string(),
                body,
            });
            stop = next;
        }

        if stop.is_some_and(|t| t.is_opening("else")) {
            let (body, next) = self.parse_nodes(ELSE_BRANCH)?;
            node.else_body = body;
            stop = next;
        }

        if !stop.is_some_and(|t| t.is_closing("if")) {
            return Err(self.error(ErrorCode::ParseUnclosedIf, tok, "if directive not closed"));
        }
        Ok(Node::If(node))
    }

    /// `<#list seq as item>`.
    fn parse_list(&mut self, tok: &'t Token) -> ConvertResult<Node> {
        let args = tok.args().trim();
        let (seq_expr, item_var) = match LIST_DIRECTIVE.captures(args) {
            Some(caps) => (caps[1].trim().to_string(), caps[2].trim().to_string()),
            None => {
                return Err(self.error(
                    ErrorCode::ParseInvalidList,
                    tok,
                    "list directive must be '<#list expr as item>'",
                ))
            }
        };
        if seq_expr.is_empty() || item_var.is_empty() {
            return Err(self.error(ErrorCode::ParseInvalidList, tok, "invalid list directive"));
        }

        let (body, stop) = self.parse_nodes(LIST_BODY)?;
        if !stop.is_some_and(|t| t.is_closing("list")) {
            return Err(self.error(
                ErrorCode::ParseUnclosedList,
                tok,
                "list directive not closed",
            ));
        }

        Ok(Node::List(ListNode {
            pos: tok.pos,
            seq_expr,
            item_var,
            body,
        }))
    }

    /// `<#assign x = expr>` / `<#local x = expr>`.
    fn parse_assign(&self, tok: &'t Token, local: bool) -> ConvertResult<Node> {
        let caps = ASSIGN_DIRECTIVE.captures(tok.args().trim()).ok_or_else(|| {
            self.error(
                ErrorCode::ParseInvalidAssign,
                tok,
                "assign/local must be '<#assign x = expr>'",
            )
        })?;
        Ok(Node::Assign(AssignNode {
            pos: tok.pos,
            name: caps[1].trim().to_string(),
            expr: caps[2].trim().to_string(),
            local,
        }))
    }

    /// `<#function name params...>`; rejected later, at emission.
    fn parse_function(&mut self, tok: &'t Token) -> ConvertResult<Node> {
        let mut parts = tok.args().split_whitespace();
        let name = match parts.next() {
            Some(name) => name.to_string(),
            None => {
                return Err(self.error(
                    ErrorCode::ParseInvalidFunction,
                    tok,
                    "function directive requires a name",
                ))
            }
        };
        let params = parts.map(str::to_string).collect();

        let (body, stop) = self.parse_nodes(FUNCTION_BODY)?;
        if !stop.is_some_and(|t| t.is_closing("function")) {
            return Err(self.error(
                ErrorCode::ParseUnclosedFunction,
                tok,
                "function directive not closed",
            ));
        }

        Ok(Node::Function(FunctionNode {
            pos: tok.pos,
            name,
            params,
            body,
        }))
    }
}

/// Build a document from a token sequence.
pub fn parse(file: &str, tokens: &[Token]) -> ConvertResult<Document> {
    let doc = Parser::new(file, tokens).parse_document()?;
    log::debug!("{}: parsed {} top-level nodes", file, doc.nodes.len());
    Ok(doc)
}
