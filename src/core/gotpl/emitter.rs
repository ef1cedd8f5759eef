//! Go template emission.
//!
//! Walks a parsed [`Document`] in source order, writing text verbatim and
//! turning every directive and interpolation into `{{...}}` actions. Local
//! variable visibility is tracked with a [`Scopes`] stack so that the first
//! assignment of a name declares it (`:=`) and later ones reassign it (`=`).

use std::collections::BTreeSet;

use ftl2gotpl_ast::{
    AssignNode, BareDirective, BareDirectiveNode, Document, IfNode, ListNode, Node, Position,
};
use log::{debug, trace};

use super::expr::ExpressionMapper;
use super::helpers::Helper;
use super::scope::{Binding, Scopes};
use crate::utils::error::{ConvertResult, Diagnostic, ErrorCode};

/// Result of emitting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub output: String,
    /// Required helpers, ordered by name.
    pub helpers: Vec<Helper>,
}

/// Emit `doc` as Go template text.
pub fn emit(file: &str, doc: &Document) -> ConvertResult<Emission> {
    let mut emitter = Emitter::new(file);
    emitter.emit_document(doc)?;
    Ok(emitter.finish())
}

/// Single-document emitter. Owns the output buffer, the helper set and the
/// scope stack of one conversion.
pub struct Emitter<'f> {
    file: &'f str,
    output: String,
    helpers: BTreeSet<Helper>,
    scopes: Scopes,
}

impl<'f> Emitter<'f> {
    pub fn new(file: &'f str) -> Self {
        Self {
            file,
            output: String::new(),
            helpers: BTreeSet::new(),
            scopes: Scopes::new(),
        }
    }

    pub fn emit_document(&mut self, doc: &Document) -> ConvertResult<()> {
        self.emit_nodes(&doc.nodes)?;
        debug!(
            "{}: emitted {} bytes, {} helper(s)",
            self.file,
            self.output.len(),
            self.helpers.len()
        );
        Ok(())
    }

    pub fn finish(self) -> Emission {
        Emission {
            output: self.output,
            helpers: self.helpers.into_iter().collect(),
        }
    }

    fn emit_nodes(&mut self, nodes: &[Node]) -> ConvertResult<()> {
        for node in nodes {
            self.emit_node(node)?;
        }
        Ok(())
    }

    fn emit_node(&mut self, node: &Node) -> ConvertResult<()> {
        trace!("{}:{}: emit {}", self.file, node.pos(), node.kind());
        match node {
            Node::Text(text) => {
                self.output.push_str(&text.content);
                Ok(())
            }
            Node::Interpolation(interp) => {
                let expr = self.map_expr_at(&interp.expr, interp.pos)?;
                self.write_action(&expr);
                Ok(())
            }
            Node::If(node) => self.emit_if(node),
            Node::List(node) => self.emit_list(node),
            Node::Assign(node) => self.emit_assign(node),
            Node::Setting(setting) => {
                self.write_comment(&format!("ftl setting ignored: {}", setting.raw));
                Ok(())
            }
            Node::Function(function) => Err(Diagnostic::at(
                ErrorCode::EmitUnsupportedFunction,
                self.file,
                function.pos,
                format!("unsupported FreeMarker function definition {:?}", function.name),
            )),
            Node::MacroCall(call) => Err(Diagnostic::at(
                ErrorCode::EmitUnsupportedMacroCall,
                self.file,
                call.pos,
                format!("unsupported FreeMarker macro call <{}>", call.name),
            )
            .with_snippet(call.args.clone())),
            Node::BareDirective(node) => self.emit_bare_directive(node),
        }
    }

    fn emit_if(&mut self, node: &IfNode) -> ConvertResult<()> {
        let cond = self.map_expr_at(&node.cond, node.pos)?;
        self.write_action(&format!("if {}", cond));
        self.emit_scoped(&node.then_body)?;

        for branch in &node.else_ifs {
            let cond = self.map_expr_at(&branch.cond, branch.pos)?;
            self.write_action(&format!("else if {}", cond));
            self.emit_scoped(&branch.body)?;
        }

        if !node.else_body.is_empty() {
            self.write_action("else");
            self.emit_scoped(&node.else_body)?;
        }

        self.write_action("end");
        Ok(())
    }

    fn emit_list(&mut self, node: &ListNode) -> ConvertResult<()> {
        let seq = self.map_expr_at(&node.seq_expr, node.pos)?;
        let index_var = node.index_var();
        self.write_action(&format!(
            "range ${}, ${} := {}",
            index_var, node.item_var, seq
        ));

        self.scopes.enter();
        self.scopes.define(index_var, Binding::LoopIndex);
        self.scopes.define(node.item_var.as_str(), Binding::LoopItem);
        let result = self.emit_nodes(&node.body);
        self.scopes.exit();
        result?;

        self.write_action("end");
        Ok(())
    }

    fn emit_assign(&mut self, node: &AssignNode) -> ConvertResult<()> {
        let expr = self.map_expr_at(&node.expr, node.pos)?;
        if self.scopes.is_local(&node.name) {
            self.write_action(&format!("${} = {}", node.name, expr));
        } else {
            self.write_action(&format!("${} := {}", node.name, expr));
            self.scopes.define(node.name.as_str(), Binding::Assigned);
        }
        Ok(())
    }

    fn emit_bare_directive(&mut self, node: &BareDirectiveNode) -> ConvertResult<()> {
        match node.name {
            BareDirective::Break => {
                self.write_action("break");
                Ok(())
            }
            BareDirective::Return => Err(Diagnostic::at(
                ErrorCode::EmitUnsupportedReturn,
                self.file,
                node.pos,
                "unsupported <#return> outside converted function semantics",
            )
            .with_snippet(node.args.clone())),
        }
    }

    /// Emit `body` inside a fresh scope frame. The frame is popped even when
    /// emission fails.
    fn emit_scoped(&mut self, body: &[Node]) -> ConvertResult<()> {
        self.scopes.enter();
        let result = self.emit_nodes(body);
        self.scopes.exit();
        result
    }

    /// Rewrite `expr` against the names currently in scope, positioning any
    /// failure at `pos`.
    fn map_expr_at(&mut self, expr: &str, pos: Position) -> ConvertResult<String> {
        let mut mapper = ExpressionMapper::with_bindings(self.scopes.snapshot());
        let mapped = mapper.map_expr(expr).map_err(|err| {
            Diagnostic::at(ErrorCode::EmitExpressionMap, self.file, pos, err.message)
                .with_snippet(expr)
        })?;
        self.helpers.extend(mapper.helpers());
        Ok(mapped)
    }

    fn write_action(&mut self, action: &str) {
        self.output.push_str("{{");
        self.output.push_str(action);
        self.output.push_str("}}");
    }

    /// Write a template comment; `*/` inside the text would end it early.
    fn write_comment(&mut self, text: &str) {
        self.output.push_str("{{/* ");
        self.output.push_str(&text.replace("*/", "* /"));
        self.output.push_str(" */}}");
    }
}
