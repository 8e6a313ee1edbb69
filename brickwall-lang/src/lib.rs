//! Implements the brickwall template language.
//!
//! Templates describe binary layouts. They are lexed, parsed into chains of AST nodes, lowered
//! into executable nodes and finally executed against input bytes, placing bricks into a
//! [`BrickWall`](brickwall_common::BrickWall).

pub mod arena;
pub mod ast;
mod compile;
mod eval;
pub mod ir;
pub mod lexer;
pub mod parser;
mod span;

pub use {
    compile::{CompileError, Compiler, compile},
    eval::{
        ExecError, ExecErrorKind, ExecOptions, ExecReport, Value, View, execute, execute_with,
    },
    ir::CompiledTemplate,
    span::Span,
};
