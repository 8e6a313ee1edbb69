//! Implements the pipeline from template source text to executable templates.

use tracing::debug;

use crate::{
    arena::NodeArena,
    ast::AstNode,
    ir::{CompiledTemplate, LoweringCtx, SemanticError},
    lexer::LexError,
    parser::{self, ParseError},
};

/// An error that stops compilation.
///
/// Compilation stops at the first error, no partial template is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The source contains a character that starts no token.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// The tokens do not form valid statements.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The statements are well formed but meaningless.
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl CompileError {
    /// The line at which compilation failed.
    pub fn line(&self) -> u32 {
        match self {
            CompileError::Lex(err) => err.line,
            CompileError::Parse(err) => err.line,
            CompileError::Semantic(err) => err.line,
        }
    }
}

/// Compiles template sources, reusing its AST storage between compilations.
#[derive(Debug, Default)]
pub struct Compiler {
    /// The AST of the most recent compilation.
    ast: NodeArena<AstNode>,
}

impl Compiler {
    /// Creates a new compiler.
    pub fn new() -> Compiler {
        Compiler::default()
    }

    /// Compiles `src` into an executable template.
    pub fn compile(&mut self, src: &str) -> Result<CompiledTemplate, CompileError> {
        self.ast.clear();

        let statements = parser::parse(src, &mut self.ast)?;

        let mut ctx = LoweringCtx::new(src, &self.ast);
        for &statement in &statements {
            ctx.lower_statement(statement)?;
        }
        let template = ctx.finish();

        debug!(
            statements = statements.len(),
            ast_nodes = self.ast.len(),
            exec_nodes = template.nodes.len(),
            "compiled template"
        );

        Ok(template)
    }
}

/// Compiles `src` into an executable template.
pub fn compile(src: &str) -> Result<CompiledTemplate, CompileError> {
    Compiler::new().compile(src)
}
