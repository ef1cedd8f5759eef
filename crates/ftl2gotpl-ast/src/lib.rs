//! Syntax tree for FreeMarker templates.
//!
//! The tree is a closed set of node shapes. Container nodes own their child
//! sequences exclusively; there is no sharing between nodes.

use std::fmt;

/// 1-based source position within a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Parser output root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(TextNode),
    Interpolation(InterpolationNode),
    If(IfNode),
    List(ListNode),
    Assign(AssignNode),
    Setting(SettingNode),
    Function(FunctionNode),
    BareDirective(BareDirectiveNode),
    MacroCall(MacroCallNode),
}

impl Node {
    pub fn pos(&self) -> Position {
        match self {
            Node::Text(n) => n.pos,
            Node::Interpolation(n) => n.pos,
            Node::If(n) => n.pos,
            Node::List(n) => n.pos,
            Node::Assign(n) => n.pos,
            Node::Setting(n) => n.pos,
            Node::Function(n) => n.pos,
            Node::BareDirective(n) => n.pos,
            Node::MacroCall(n) => n.pos,
        }
    }

    /// Short kind label, used in debug logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Text(_) => "text",
            Node::Interpolation(_) => "interpolation",
            Node::If(_) => "if",
            Node::List(_) => "list",
            Node::Assign(_) => "assign",
            Node::Setting(_) => "setting",
            Node::Function(_) => "function",
            Node::BareDirective(n) => n.name.as_str(),
            Node::MacroCall(_) => "macro-call",
        }
    }

    pub fn text(pos: Position, content: impl Into<String>) -> Self {
        Node::Text(TextNode {
            pos,
            content: content.into(),
        })
    }
}

/// Literal template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub pos: Position,
    pub content: String,
}

/// A `${...}` or `#{...}` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolationNode {
    pub pos: Position,
    pub expr: String,
    /// Set when the `#{` opener was used.
    pub alt_style: bool,
}

/// `<#if>` with optional `<#elseif>` branches and `<#else>` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfNode {
    pub pos: Position,
    pub cond: String,
    pub then_body: Vec<Node>,
    pub else_ifs: Vec<ElseIf>,
    pub else_body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElseIf {
    pub pos: Position,
    pub cond: String,
    pub body: Vec<Node>,
}

/// `<#list seq as item>...</#list>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNode {
    pub pos: Position,
    pub seq_expr: String,
    pub item_var: String,
    pub body: Vec<Node>,
}

impl ListNode {
    /// Name of the loop counter bound next to the item variable.
    pub fn index_var(&self) -> String {
        format!("{}_index", self.item_var)
    }
}

/// `<#assign name = expr>` or `<#local name = expr>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignNode {
    pub pos: Position,
    pub name: String,
    pub expr: String,
    pub local: bool,
}

/// `<#setting ...>` / `<#ftl ...>`, carried through as a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingNode {
    pub pos: Position,
    pub raw: String,
}

/// `<#function name params...>...</#function>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionNode {
    pub pos: Position,
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BareDirective {
    Break,
    Return,
}

impl BareDirective {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "break" => Some(BareDirective::Break),
            "return" => Some(BareDirective::Return),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BareDirective::Break => "break",
            BareDirective::Return => "return",
        }
    }
}

impl fmt::Display for BareDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body-less directive such as `<#break>` or `<#return x>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BareDirectiveNode {
    pub pos: Position,
    pub name: BareDirective,
    pub args: String,
}

/// `<@name args>` user macro invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCallNode {
    pub pos: Position,
    pub name: String,
    pub args: String,
}
