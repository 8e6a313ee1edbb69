//! Defines the abstract syntax tree produced by the parser.
//!
//! Statements are chains of nodes linked through [`AstNode::next`]. Operators hold their
//! operands in [`AstNode::param1`] and [`AstNode::param2`].

use std::fmt::Write as _;

use crate::{
    arena::{Idx, NodeArena},
    lexer::{Token, TokenKind},
};

/// A handle to an [`AstNode`].
pub type NodeId = Idx<AstNode>;

/// The different kinds of AST nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstKind {
    /// A name of a type, variable or member.
    Name,
    /// An integer literal.
    Integer,
    /// A parenthesized expression stored in `param1`.
    ParenthesisExpr,
    /// Indexing `param1` with the expression in `param2`.
    ArrayAccess,
    /// A `{ ... }` block whose statements start at `param1`.
    Block,
    /// A `struct` declaration whose name is in `param1`.
    StructDecl,
    /// Accessing member `param2` of `param1`.
    StructAccess,
    /// Assigning `param2` to `param1`.
    OpAssign,
    /// Comparing `param1` and `param2` for equality.
    OpCompare,
    /// An arithmetic operation; the operator is the token of the node.
    OpMath,
    /// The `if` keyword.
    If,
    /// The `else` keyword.
    Else,
    /// The `while` keyword.
    While,
    /// Marks the end of the script.
    ScriptEnd,
}

/// A single node of the AST.
#[derive(Debug, Clone)]
pub struct AstNode {
    /// The token the node was created from.
    pub token: Token,
    /// The kind of the node.
    pub kind: AstKind,
    /// The next sibling in the chain.
    pub next: Option<NodeId>,
    /// The first operand.
    pub param1: Option<NodeId>,
    /// The second operand.
    pub param2: Option<NodeId>,
}

impl AstNode {
    /// Creates a node without links.
    pub fn new(token: Token, kind: AstKind) -> AstNode {
        AstNode {
            token,
            kind,
            next: None,
            param1: None,
            param2: None,
        }
    }

    /// Returns `true` once the node has received its first operand.
    pub fn is_folded(&self) -> bool {
        self.param1.is_some()
    }

    /// The binding strength of the node if it is an operator that still needs folding.
    ///
    /// Higher values bind tighter.
    pub fn precedence(&self) -> Option<u8> {
        match self.kind {
            AstKind::StructAccess => Some(6),
            AstKind::ArrayAccess => Some(5),
            AstKind::OpAssign => Some(4),
            AstKind::OpCompare => Some(3),
            AstKind::OpMath => match self.token.kind {
                TokenKind::Star | TokenKind::Slash => Some(2),
                _ => Some(1),
            },
            AstKind::Name
            | AstKind::Integer
            | AstKind::ParenthesisExpr
            | AstKind::Block
            | AstKind::StructDecl
            | AstKind::If
            | AstKind::Else
            | AstKind::While
            | AstKind::ScriptEnd => None,
        }
    }
}

/// Iterates over a chain of siblings starting at `head`.
pub fn siblings(
    nodes: &NodeArena<AstNode>,
    head: Option<NodeId>,
) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(head, |&id| nodes[id].next)
}

/// Renders a chain of nodes as nested prefix expressions, for diagnostics and tests.
pub fn render_chain(nodes: &NodeArena<AstNode>, src: &str, head: Option<NodeId>) -> String {
    let mut out = String::new();
    for (i, id) in siblings(nodes, head).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        render_node(nodes, src, id, &mut out);
    }

    out
}

/// Renders a single node and its operands into `out`.
fn render_node(nodes: &NodeArena<AstNode>, src: &str, id: NodeId, out: &mut String) {
    let node = &nodes[id];
    let operand = |param: Option<NodeId>, out: &mut String| {
        out.push(' ');
        match param {
            Some(param) => render_node(nodes, src, param, out),
            None => out.push('_'),
        }
    };

    match node.kind {
        AstKind::Name | AstKind::Integer => out.push_str(node.token.span.text(src)),
        AstKind::If | AstKind::Else | AstKind::While => {
            out.push_str(node.token.span.text(src))
        }
        AstKind::ScriptEnd => out.push_str("<end>"),
        AstKind::ParenthesisExpr => {
            out.push_str("(paren ");
            out.push_str(&render_chain(nodes, src, node.param1));
            out.push(')');
        }
        AstKind::Block => {
            out.push_str("{ ");
            out.push_str(&render_chain(nodes, src, node.param1));
            out.push_str(" }");
        }
        AstKind::StructDecl => {
            out.push_str("(struct");
            operand(node.param1, out);
            out.push(')');
        }
        AstKind::ArrayAccess => {
            out.push_str("([]");
            operand(node.param1, out);
            out.push(' ');
            out.push_str(&render_chain(nodes, src, node.param2));
            out.push(')');
        }
        AstKind::StructAccess | AstKind::OpAssign | AstKind::OpCompare | AstKind::OpMath => {
            let op = match node.kind {
                AstKind::StructAccess => ".",
                AstKind::OpAssign => "=",
                AstKind::OpCompare => "==",
                _ => node.token.span.text(src),
            };
            let _ = write!(out, "({op}");
            operand(node.param1, out);
            operand(node.param2, out);
            out.push(')');
        }
    }
}
