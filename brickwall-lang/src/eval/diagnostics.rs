//! Implements errors and reports of template execution.

use std::io;

use brickwall_common::InsertError;
use smol_str::SmolStr;

/// An error that aborted the execution of a template.
///
/// The brick wall is left unchanged when execution fails.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ExecError {
    /// The line of the node that failed.
    pub line: u32,
    /// The kind of error.
    pub kind: ExecErrorKind,
}

/// The different kinds of execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ExecErrorKind {
    /// A type name that does not resolve.
    #[error("unknown type `{0}`")]
    UnknownType(SmolStr),
    /// A variable that was never placed.
    #[error("unknown variable `{0}`")]
    UnknownVariable(SmolStr),
    /// A member that is not part of the `struct`.
    #[error("`{ty}` has no member `{member}`")]
    UnknownMember {
        /// The name of the `struct`.
        ty: SmolStr,
        /// The name of the member.
        member: SmolStr,
    },
    /// A field read as a number that holds an array or a `struct`.
    #[error("`{0}` does not hold a single number")]
    NotAScalar(SmolStr),
    /// A node that does not produce a value was evaluated.
    #[error("expected an expression")]
    NotAnExpression,
    /// A float where an integer is required.
    #[error("expected an integer, found {0}")]
    NotAnInteger(f64),
    /// An array count below zero.
    #[error("array count {0} is negative")]
    NegativeCount(i64),
    /// A `struct` array count that does not fit the brick wall.
    #[error("array count {0} is too large")]
    CountTooLarge(u64),
    /// The size or end of a field does not fit into 64 bits.
    #[error("the size of `{0}` overflows")]
    SizeOverflow(SmolStr),
    /// A field or read that extends outside the input.
    #[error("`{name}` covers bytes {start}..{end}, but the input has {len} bytes")]
    OutOfBounds {
        /// The name of the field.
        name: SmolStr,
        /// The first covered offset.
        start: i64,
        /// The offset after the last covered byte.
        end: i64,
        /// The length of the input.
        len: u64,
    },
    /// An array index outside of the array.
    #[error("index {index} is out of range for `{name}` with {count} elements")]
    IndexOutOfRange {
        /// The name of the array.
        name: SmolStr,
        /// The evaluated index.
        index: i64,
        /// The number of elements of the array.
        count: u64,
    },
    /// An integer division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// An integer operation overflowed.
    #[error("arithmetic overflow")]
    Overflow,
    /// An unsigned value that does not fit into a signed 64 bit integer.
    #[error("value {0} does not fit into a signed 64 bit integer")]
    ValueOutOfRange(u64),
    /// The brick wall refused a `struct` member.
    #[error("struct `{0}` could not be defined")]
    InvalidStruct(SmolStr),
    /// Reading the input failed.
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Summarizes a successful execution.
#[derive(Debug, Default)]
pub struct ExecReport {
    /// The number of top level bricks placed.
    pub placed: usize,
    /// The bricks the wall refused, in execution order.
    pub rejected: Vec<InsertError>,
    /// The number of `struct`s the template defined.
    pub structs_defined: usize,
    /// The offset after the last declared field.
    pub end_offset: i64,
}
