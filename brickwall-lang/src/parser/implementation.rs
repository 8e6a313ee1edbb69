//! Contains the flat statement and expression reader.

use tracing::trace;

use crate::{
    ast::{AstKind, NodeId},
    compile::CompileError,
    lexer::{Token, TokenKind},
    span::Span,
};

use super::{
    ParseErrorKind, fold,
    infrastructure::{ChainBuilder, Parser},
};

/// Reads tokens up to `terminator` into a flat chain and folds it.
///
/// Returns the head of the folded chain. A block ends the current statement when the
/// terminator is `;`, swallowing a directly following `;`.
pub(super) fn expression(
    p: &mut Parser<'_, '_>,
    terminator: TokenKind,
) -> Result<NodeId, CompileError> {
    let mut chain = ChainBuilder::default();

    loop {
        let token = p.bump()?;

        if token.kind == terminator {
            let Some(head) = chain.head else {
                return Err(p.error(ParseErrorKind::EmptyExpression(terminator)));
            };
            return fold::fold(p, head);
        }

        let node = match token.kind {
            TokenKind::EndOfFile => {
                if p.is_nested() {
                    return Err(p.unclosed_error());
                }

                let end = p.alloc(token, AstKind::ScriptEnd);
                chain.push(p, end);
                let head = chain.head.unwrap_or(end);

                return fold::fold(p, head);
            }
            TokenKind::LParen => {
                p.enter(token)?;
                let inner = expression(p, TokenKind::RParen)?;
                p.leave();

                let node = p.alloc(token, AstKind::ParenthesisExpr);
                p.nodes_mut()[node].param1 = Some(inner);
                node
            }
            TokenKind::LBracket => {
                p.enter(token)?;
                let inner = expression(p, TokenKind::RBracket)?;
                p.leave();

                let node = p.alloc(token, AstKind::ArrayAccess);
                p.nodes_mut()[node].param2 = Some(inner);
                node
            }
            TokenKind::LBrace => {
                let block = block(p, token)?;

                if terminator == TokenKind::Semicolon {
                    chain.push(p, block);
                    if p.peek()?.kind == TokenKind::Semicolon {
                        p.bump()?;
                    }

                    let head = chain.head.unwrap_or(block);
                    return fold::fold(p, head);
                }

                block
            }
            TokenKind::StructKw => {
                let name = p.bump()?;
                if name.kind != TokenKind::Name {
                    return Err(p.error(ParseErrorKind::MissingStructName(name.kind)));
                }

                let name = p.alloc(name, AstKind::Name);
                let node = p.alloc(token, AstKind::StructDecl);
                p.nodes_mut()[node].param1 = Some(name);
                node
            }
            TokenKind::Equals => {
                let next = p.peek()?;
                if next.kind == TokenKind::Equals && next.span.start == token.span.end {
                    p.bump()?;

                    let merged = Token {
                        span: Span {
                            start: token.span.start,
                            end: next.span.end,
                        },
                        ..token
                    };
                    p.alloc(merged, AstKind::OpCompare)
                } else {
                    p.alloc(token, AstKind::OpAssign)
                }
            }
            TokenKind::Name => p.alloc(token, AstKind::Name),
            TokenKind::Integer => p.alloc(token, AstKind::Integer),
            TokenKind::Dot => p.alloc(token, AstKind::StructAccess),
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash => {
                p.alloc(token, AstKind::OpMath)
            }
            TokenKind::IfKw => p.alloc(token, AstKind::If),
            TokenKind::ElseKw => p.alloc(token, AstKind::Else),
            TokenKind::WhileKw => p.alloc(token, AstKind::While),
            kind @ (TokenKind::Semicolon
            | TokenKind::RBrace
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::Comma
            | TokenKind::LAngle
            | TokenKind::RAngle
            | TokenKind::String
            | TokenKind::LineComment
            | TokenKind::Whitespace) => {
                return Err(p.error(ParseErrorKind::UnexpectedToken(kind)));
            }
        };

        chain.push(p, node);
    }
}

/// Parses the statements of a block after its opening `{`.
///
/// The statements are concatenated into a single chain stored as the first operand of the
/// returned [`AstKind::Block`] node.
fn block(p: &mut Parser<'_, '_>, open: Token) -> Result<NodeId, CompileError> {
    p.enter(open)?;

    let mut statements = ChainBuilder::default();
    let first = expression(p, TokenKind::Semicolon)?;
    statements.push(p, first);

    loop {
        match p.peek()?.kind {
            TokenKind::RBrace => {
                p.bump()?;
                break;
            }
            TokenKind::EndOfFile => {
                p.bump()?;
                return Err(p.unclosed_error());
            }
            _ => {
                let statement = expression(p, TokenKind::Semicolon)?;
                statements.push(p, statement);
            }
        }
    }

    p.leave();
    trace!(line = open.line, "parsed block");

    let node = p.alloc(open, AstKind::Block);
    p.nodes_mut()[node].param1 = statements.head;

    Ok(node)
}
