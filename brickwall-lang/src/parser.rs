//! Implements the parser for the template language.
//!
//! Every statement is first read into a flat chain of nodes which is then folded into a tree
//! by repeatedly promoting the operator with the highest precedence.

use crate::{
    arena::NodeArena,
    ast::{AstNode, NodeId},
    compile::CompileError,
    lexer::TokenKind,
};

pub(crate) use infrastructure::Parser;

mod fold;
mod implementation;
mod infrastructure;

/// The maximum nesting depth of parentheses, brackets and blocks.
pub const MAX_NESTING_DEPTH: usize = 128;

/// A parsing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// The line at which parsing failed.
    pub line: u32,
    /// The kind of error.
    pub kind: ParseErrorKind,
}

/// The different kinds of parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// The terminator of an expression was found before any content.
    #[error("expected an expression before {0}")]
    EmptyExpression(TokenKind),
    /// A token that is not valid at this position.
    #[error("unexpected {0}")]
    UnexpectedToken(TokenKind),
    /// The input ended inside a block.
    #[error("unterminated block opened on line {opened_line}")]
    UnterminatedBlock {
        /// The line of the opening `{`.
        opened_line: u32,
    },
    /// The input ended inside parentheses or brackets.
    #[error("{delimiter} opened on line {opened_line} is never closed")]
    Unclosed {
        /// The opening delimiter.
        delimiter: TokenKind,
        /// The line of the opening delimiter.
        opened_line: u32,
    },
    /// `struct` was not followed by a name.
    #[error("expected a name after `struct`, found {0}")]
    MissingStructName(TokenKind),
    /// An operator lacks a neighbour to use as its operand.
    #[error("{0} is missing an operand")]
    MissingOperand(TokenKind),
    /// The input nests too deeply.
    #[error("nesting exceeds {max} levels", max = MAX_NESTING_DEPTH)]
    NestingTooDeep,
}

/// Parses the next statement of the parser's input into a folded chain.
///
/// The chain ends in an [`AstKind::ScriptEnd`](crate::ast::AstKind::ScriptEnd) node once the
/// input is exhausted.
pub(crate) fn parse_statement(p: &mut Parser<'_, '_>) -> Result<NodeId, CompileError> {
    implementation::expression(p, TokenKind::Semicolon)
}

/// Parses the whole source into a list of statement chains.
///
/// The last chain is terminated by the script end marker.
pub fn parse(src: &str, nodes: &mut NodeArena<AstNode>) -> Result<Vec<NodeId>, CompileError> {
    let mut p = Parser::new(src, nodes);
    let mut statements = Vec::new();

    loop {
        let statement = parse_statement(&mut p)?;
        statements.push(statement);

        if p.chain_reaches_end(statement) {
            return Ok(statements);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::render_chain;

    fn parse_to_string(src: &str) -> Result<Vec<String>, CompileError> {
        let mut nodes = NodeArena::new();
        let statements = parse(src, &mut nodes)?;

        Ok(statements
            .into_iter()
            .map(|head| render_chain(&nodes, src, Some(head)))
            .collect())
    }

    fn parse_err(src: &str) -> ParseError {
        match parse_to_string(src) {
            Err(CompileError::Parse(err)) => err,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter() {
        assert_eq!(parse_to_string("a + b * c;").unwrap(), ["(+ a (* b c))", "<end>"]);
        assert_eq!(parse_to_string("a * b + c;").unwrap(), ["(+ (* a b) c)", "<end>"]);
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        assert_eq!(
            parse_to_string("a - b + c - d;").unwrap(),
            ["(- (+ (- a b) c) d)", "<end>"]
        );
        assert_eq!(parse_to_string("a / b * c;").unwrap(), ["(* (/ a b) c)", "<end>"]);
    }

    #[test]
    fn member_access_binds_tighter_than_indexing() {
        assert_eq!(parse_to_string("a.b[1];").unwrap(), ["([] (. a b) 1)", "<end>"]);
        assert_eq!(
            parse_to_string("x[a.b + 1];").unwrap(),
            ["([] x (+ (. a b) 1))", "<end>"]
        );
    }

    #[test]
    fn parentheses_group() {
        assert_eq!(
            parse_to_string("(a + b) * c;").unwrap(),
            ["(* (paren (+ a b)) c)", "<end>"]
        );
    }

    #[test]
    fn assignment_and_comparison() {
        assert_eq!(parse_to_string("a = b;").unwrap(), ["(= a b)", "<end>"]);
        assert_eq!(parse_to_string("a == b;").unwrap(), ["(== a b)", "<end>"]);
        // separated by whitespace these are two assignments
        assert_eq!(
            parse_to_string("a = = b;").unwrap_err().to_string(),
            "line 1: `=` is missing an operand"
        );
        assert_eq!(parse_to_string("a == b + c;").unwrap(), ["(+ (== a b) c)", "<end>"]);
    }

    #[test]
    fn declarations_stay_flat() {
        assert_eq!(
            parse_to_string("int32 a; uint8[4] b;").unwrap(),
            ["int32 a", "([] uint8 4) b", "<end>"]
        );
    }

    #[test]
    fn struct_declarations_end_at_the_block() {
        assert_eq!(
            parse_to_string("struct Foo { int32 a; int32 b; } Foo f;").unwrap(),
            ["(struct Foo) { int32 a int32 b }", "Foo f", "<end>"]
        );
        assert_eq!(
            parse_to_string("struct Foo { int32 a; };").unwrap(),
            ["(struct Foo) { int32 a }", "<end>"]
        );
    }

    #[test]
    fn nested_blocks() {
        assert_eq!(
            parse_to_string("{ a b; { c d; } e f; }").unwrap(),
            ["{ a b { c d } e f }", "<end>"]
        );
    }

    #[test]
    fn missing_final_semicolon_ends_the_script() {
        assert_eq!(parse_to_string("int32 a; int32 b").unwrap(), ["int32 a", "int32 b <end>"]);
        assert_eq!(parse_to_string("").unwrap(), ["<end>"]);
        assert_eq!(parse_to_string("// nothing\n").unwrap(), ["<end>"]);
    }

    #[test]
    fn control_flow_keywords_are_parsed() {
        assert_eq!(
            parse_to_string("if (a == 1) { b c; } else { d e; }").unwrap(),
            ["if (paren (== a 1)) { b c }", "else { d e }", "<end>"]
        );
        assert_eq!(
            parse_to_string("while (a) { b c; }").unwrap(),
            ["while (paren a) { b c }", "<end>"]
        );
    }

    #[test]
    fn empty_expressions_are_rejected() {
        assert_eq!(
            parse_err("a b;\n;"),
            ParseError {
                line: 2,
                kind: ParseErrorKind::EmptyExpression(TokenKind::Semicolon),
            }
        );
        assert_eq!(
            parse_err("x[];").kind,
            ParseErrorKind::EmptyExpression(TokenKind::RBracket)
        );
        assert_eq!(
            parse_err("struct S {}").kind,
            ParseErrorKind::UnexpectedToken(TokenKind::RBrace)
        );
    }

    #[test]
    fn unterminated_constructs() {
        assert_eq!(
            parse_err("struct S {\n int32 a;\n"),
            ParseError {
                line: 3,
                kind: ParseErrorKind::UnterminatedBlock { opened_line: 1 },
            }
        );
        assert_eq!(
            parse_err("{ a b").kind,
            ParseErrorKind::UnterminatedBlock { opened_line: 1 }
        );
        assert_eq!(
            parse_err("(a + b").kind,
            ParseErrorKind::Unclosed {
                delimiter: TokenKind::LParen,
                opened_line: 1,
            }
        );
    }

    #[test]
    fn struct_needs_a_name() {
        assert_eq!(
            parse_err("struct { int32 a; }").kind,
            ParseErrorKind::MissingStructName(TokenKind::LBrace)
        );
    }

    #[test]
    fn unexpected_tokens() {
        assert_eq!(
            parse_err("a ) b;").kind,
            ParseErrorKind::UnexpectedToken(TokenKind::RParen)
        );
        assert_eq!(
            parse_err("a < b;").kind,
            ParseErrorKind::UnexpectedToken(TokenKind::LAngle)
        );
        assert_eq!(
            parse_err("a \"s\";").kind,
            ParseErrorKind::UnexpectedToken(TokenKind::String)
        );
    }

    #[test]
    fn operators_need_operands() {
        assert_eq!(
            parse_err("+ a;").kind,
            ParseErrorKind::MissingOperand(TokenKind::Plus)
        );
        assert_eq!(
            parse_err("a *;").kind,
            ParseErrorKind::MissingOperand(TokenKind::Star)
        );
        assert_eq!(
            parse_err("[1] a;").kind,
            ParseErrorKind::MissingOperand(TokenKind::LBracket)
        );
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!(
            "{}a{};",
            "(".repeat(MAX_NESTING_DEPTH + 1),
            ")".repeat(MAX_NESTING_DEPTH + 1)
        );
        assert_eq!(parse_err(&deep).kind, ParseErrorKind::NestingTooDeep);

        let fine = format!(
            "{}a{};",
            "(".repeat(MAX_NESTING_DEPTH),
            ")".repeat(MAX_NESTING_DEPTH)
        );
        assert!(parse_to_string(&fine).is_ok());
    }

    #[test]
    fn lex_errors_are_forwarded() {
        assert!(matches!(parse_to_string("a # b;"), Err(CompileError::Lex(_))));
    }
}
