//! Implements the primitives that are used in the parser implementation.

use crate::{
    arena::NodeArena,
    ast::{AstKind, AstNode, NodeId, siblings},
    compile::CompileError,
    lexer::{Lexer, Token, TokenKind},
};

use super::{MAX_NESTING_DEPTH, ParseError, ParseErrorKind};

/// Contains the driving state for the parser.
pub(crate) struct Parser<'src, 'nodes> {
    /// Produces the tokens of the source.
    lexer: Lexer<'src>,
    /// A token that was peeked but not yet consumed.
    peeked: Option<Token>,
    /// The arena receiving the parsed nodes.
    nodes: &'nodes mut NodeArena<AstNode>,
    /// The currently open delimiters, innermost last.
    open: Vec<Token>,
    /// The line of the most recently consumed token.
    line: u32,
}

impl<'src, 'nodes> Parser<'src, 'nodes> {
    /// Creates a new parser for the given source.
    pub(crate) fn new(src: &'src str, nodes: &'nodes mut NodeArena<AstNode>) -> Self {
        Parser {
            lexer: Lexer::new(src),
            peeked: None,
            nodes,
            open: Vec::new(),
            line: 1,
        }
    }

    /// Consumes the next token.
    pub(crate) fn bump(&mut self) -> Result<Token, CompileError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token()?,
        };
        self.line = token.line;

        Ok(token)
    }

    /// Returns the next token without consuming it.
    pub(crate) fn peek(&mut self) -> Result<Token, CompileError> {
        match self.peeked {
            Some(token) => Ok(token),
            None => {
                let token = self.lexer.next_token()?;
                self.peeked = Some(token);
                Ok(token)
            }
        }
    }

    /// Creates an error of the given kind at the current line.
    pub(crate) fn error(&self, kind: ParseErrorKind) -> CompileError {
        CompileError::Parse(ParseError {
            line: self.line,
            kind,
        })
    }

    /// Records that the given delimiter was opened.
    pub(crate) fn enter(&mut self, delimiter: Token) -> Result<(), CompileError> {
        if self.open.len() >= MAX_NESTING_DEPTH {
            return Err(self.error(ParseErrorKind::NestingTooDeep));
        }
        self.open.push(delimiter);

        Ok(())
    }

    /// Records that the innermost delimiter was closed.
    pub(crate) fn leave(&mut self) {
        self.open.pop();
    }

    /// Returns `true` if the parser is inside parentheses, brackets or a block.
    pub(crate) fn is_nested(&self) -> bool {
        !self.open.is_empty()
    }

    /// The error for an input that ends inside the innermost open delimiter.
    pub(crate) fn unclosed_error(&self) -> CompileError {
        let kind = match self.open.last() {
            Some(open) if open.kind == TokenKind::LBrace => ParseErrorKind::UnterminatedBlock {
                opened_line: open.line,
            },
            Some(open) => ParseErrorKind::Unclosed {
                delimiter: open.kind,
                opened_line: open.line,
            },
            None => ParseErrorKind::UnexpectedToken(TokenKind::EndOfFile),
        };

        self.error(kind)
    }

    /// Allocates a node of the given kind for the given token.
    pub(crate) fn alloc(&mut self, token: Token, kind: AstKind) -> NodeId {
        self.nodes.alloc(AstNode::new(token, kind))
    }

    /// Returns the nodes parsed so far.
    pub(crate) fn nodes(&self) -> &NodeArena<AstNode> {
        &*self.nodes
    }

    /// Returns the nodes parsed so far mutably.
    pub(crate) fn nodes_mut(&mut self) -> &mut NodeArena<AstNode> {
        &mut *self.nodes
    }

    /// Returns the last node of the chain starting at `head`.
    pub(crate) fn chain_tail(&self, head: NodeId) -> NodeId {
        siblings(&*self.nodes, Some(head)).last().unwrap_or(head)
    }

    /// Returns `true` if the chain starting at `head` contains the script end marker.
    pub(crate) fn chain_reaches_end(&self, head: NodeId) -> bool {
        siblings(&*self.nodes, Some(head)).any(|id| self.nodes[id].kind == AstKind::ScriptEnd)
    }
}

/// Builds a chain of sibling nodes by appending at the tail.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ChainBuilder {
    /// The first node of the chain.
    pub(crate) head: Option<NodeId>,
    /// The last node of the chain.
    tail: Option<NodeId>,
}

impl ChainBuilder {
    /// Appends the chain starting at `node` to this chain.
    pub(crate) fn push(&mut self, p: &mut Parser<'_, '_>, node: NodeId) {
        match self.tail {
            Some(tail) => p.nodes_mut()[tail].next = Some(node),
            None => self.head = Some(node),
        }
        self.tail = Some(p.chain_tail(node));
    }
}
