//! Implements the lexer.

use std::fmt;

use tracing::trace;

use crate::span::Span;

/// Describes all kinds of possible tokens.
#[derive(logos::Logos, Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    // Trivia
    /// A comment on a single line.
    #[regex("//[^\n]*")]
    LineComment,
    /// Arbitrary amounts of white space.
    #[regex("[ \t\r\n\x0C]+")]
    Whitespace,

    // Expression contents
    /// A decimal integer literal.
    #[regex("[0-9]+")]
    Integer,
    /// A string literal.
    ///
    /// Reserved; the grammar does not accept it anywhere yet.
    #[regex("\"(?:[^\\\\\"]|\\\\.)*\"")]
    String,
    /// An identifier naming a type, variable or member.
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*")]
    Name,

    // Symbols
    /// The left parenthesis: `(`.
    #[token("(")]
    LParen,
    /// The right parenthesis: `)`.
    #[token(")")]
    RParen,
    /// The left bracket: `[`.
    #[token("[")]
    LBracket,
    /// The right bracket: `]`.
    #[token("]")]
    RBracket,
    /// The left brace: `{`.
    #[token("{")]
    LBrace,
    /// The right brace: `}`.
    #[token("}")]
    RBrace,
    /// The semicolon symbol: `;`.
    #[token(";")]
    Semicolon,
    /// The comma symbol: `,`.
    #[token(",")]
    Comma,
    /// The dot symbol: `.`.
    #[token(".")]
    Dot,
    /// The equals symbol: `=`.
    #[token("=")]
    Equals,
    /// The plus symbol: `+`.
    #[token("+")]
    Plus,
    /// The minus symbol: `-`.
    #[token("-")]
    Minus,
    /// The star symbol: `*`.
    #[token("*")]
    Star,
    /// The slash symbol: `/`.
    #[token("/")]
    Slash,
    /// The left angle symbol: `<`.
    #[token("<")]
    LAngle,
    /// The right angle symbol: `>`.
    #[token(">")]
    RAngle,

    // Keywords
    /// The `struct` keyword.
    #[token("struct")]
    StructKw,
    /// The `if` keyword.
    #[token("if")]
    IfKw,
    /// The `else` keyword.
    #[token("else")]
    ElseKw,
    /// The `while` keyword.
    #[token("while")]
    WhileKw,

    /// The end of the input.
    ///
    /// Never produced by the `logos` lexer itself.
    EndOfFile,
}

impl TokenKind {
    /// The human-readable name of this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::LineComment => "line comment",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Integer => "integer",
            TokenKind::String => "string literal",
            TokenKind::Name => "name",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Equals => "`=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::LAngle => "`<`",
            TokenKind::RAngle => "`>`",
            TokenKind::StructKw => "`struct`",
            TokenKind::IfKw => "`if`",
            TokenKind::ElseKw => "`else`",
            TokenKind::WhileKw => "`while`",
            TokenKind::EndOfFile => "end of input",
        }
    }

    /// Returns `true` if the `TokenKind` is trivia.
    ///
    /// A token is trivia if it carries no semantic value other than as a possible separator for
    /// other tokens.
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::Whitespace)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents a single token produced by the lexer.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of the token.
    pub kind: TokenKind,
    /// The span of the token.
    pub span: Span,
    /// The line the token starts on, starting at 1.
    pub line: u32,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:?} (line {})", self.kind, self.span, self.line)
    }
}

/// An unrecognized character in the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: unrecognized character {character:?}")]
pub struct LexError {
    /// The line the character was found on.
    pub line: u32,
    /// The offending character.
    pub character: char,
}

/// Produces tokens one at a time, skipping trivia.
pub struct Lexer<'src> {
    /// The underlying `logos` lexer.
    inner: logos::Lexer<'src, TokenKind>,
    /// The line of the current position.
    line: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer at the start of the given source.
    pub fn new(src: &'src str) -> Lexer<'src> {
        Lexer {
            inner: logos::Lexer::new(src),
            line: 1,
        }
    }

    /// Returns the source that is being lexed.
    pub fn source(&self) -> &'src str {
        self.inner.source()
    }

    /// Returns the next non-trivia token.
    ///
    /// Once the input is exhausted, every call returns an [`TokenKind::EndOfFile`] token.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            let Some(result) = self.inner.next() else {
                let len = self.source().len();
                return Ok(Token {
                    kind: TokenKind::EndOfFile,
                    span: Span {
                        start: len,
                        end: len,
                    },
                    line: self.line,
                });
            };

            let slice = self.inner.slice();
            let kind = match result {
                Ok(kind) => kind,
                Err(()) => {
                    return Err(LexError {
                        line: self.line,
                        character: slice.chars().next().unwrap_or('\0'),
                    });
                }
            };

            if kind.is_trivia() {
                self.line += u32::try_from(slice.matches('\n').count()).unwrap_or(u32::MAX);
                continue;
            }

            let token = Token {
                kind,
                span: Span::from(self.inner.span()),
                line: self.line,
            };
            trace!(?token, "lexed");

            return Ok(token);
        }
    }
}

/// Lexes the whole input, including the final [`TokenKind::EndOfFile`] token.
pub fn lex(src: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        tokens.push(token);

        if token.kind == TokenKind::EndOfFile {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds_and_texts(src: &str) -> Vec<(TokenKind, &str)> {
        lex(src)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.span.text(src)))
            .collect()
    }

    #[test]
    fn comments_are_elided() {
        let src = "ab; cd // comment\nef";
        let tokens = lex(src).unwrap();

        assert_eq!(
            kinds_and_texts(src),
            vec![
                (TokenKind::Name, "ab"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::Name, "cd"),
                (TokenKind::Name, "ef"),
                (TokenKind::EndOfFile, ""),
            ]
        );
        assert_eq!(
            tokens.iter().map(|t| t.line).collect::<Vec<_>>(),
            vec![1, 1, 1, 2, 2]
        );
    }

    #[test]
    fn comment_followed_by_whitespace_and_comment() {
        let src = "// one\n   // two\n\n  x";
        let tokens = lex(src).unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Name);
        assert_eq!(tokens[0].line, 4);
    }

    #[test]
    fn keywords_need_a_full_match() {
        assert_eq!(
            kinds_and_texts("struct structure if iffy else elsewhere while _while"),
            vec![
                (TokenKind::StructKw, "struct"),
                (TokenKind::Name, "structure"),
                (TokenKind::IfKw, "if"),
                (TokenKind::Name, "iffy"),
                (TokenKind::ElseKw, "else"),
                (TokenKind::Name, "elsewhere"),
                (TokenKind::WhileKw, "while"),
                (TokenKind::Name, "_while"),
                (TokenKind::EndOfFile, ""),
            ]
        );
    }

    #[test]
    fn integers_and_punctuation() {
        assert_eq!(
            kinds_and_texts("uint8[12]x=a.b==3/4"),
            vec![
                (TokenKind::Name, "uint8"),
                (TokenKind::LBracket, "["),
                (TokenKind::Integer, "12"),
                (TokenKind::RBracket, "]"),
                (TokenKind::Name, "x"),
                (TokenKind::Equals, "="),
                (TokenKind::Name, "a"),
                (TokenKind::Dot, "."),
                (TokenKind::Name, "b"),
                (TokenKind::Equals, "="),
                (TokenKind::Equals, "="),
                (TokenKind::Integer, "3"),
                (TokenKind::Slash, "/"),
                (TokenKind::Integer, "4"),
                (TokenKind::EndOfFile, ""),
            ]
        );
    }

    #[test]
    fn unknown_characters_are_fatal() {
        assert_eq!(
            lex("a;\n  b @ c").unwrap_err(),
            LexError {
                line: 2,
                character: '@',
            }
        );
    }

    #[test]
    fn end_of_file_repeats() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Name);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfFile);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfFile);
    }
}
