//! Implements the executable representation of templates.

use std::fmt;

use brickwall_common::PrimitiveType;

use crate::arena::{Idx, NodeArena};

pub(crate) use lowering::LoweringCtx;
pub use lowering::{SemanticError, SemanticErrorKind};
pub use strings::{ExecData, StrRef};

mod lowering;
mod strings;

/// A handle to an [`ExecNode`].
pub type ExecId = Idx<ExecNode>;

/// The type of the value an executable node declares or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// The node produces no value.
    Void,
    /// A primitive value.
    Primitive(PrimitiveType),
    /// An instance of the `struct` with the given name.
    Struct(StrRef),
}

impl ValueType {
    /// Returns `true` for integer primitives.
    pub fn is_integer(self) -> bool {
        matches!(self, ValueType::Primitive(ty) if ty.is_integer())
    }

    /// Returns `true` for floating point primitives.
    pub fn is_float(self) -> bool {
        matches!(self, ValueType::Primitive(ty) if ty.is_float())
    }

    /// Returns `true` for values that can take part in arithmetic.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }
}

/// An arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    /// The addition operator: `+`.
    Add,
    /// The subtraction operator: `-`.
    Sub,
    /// The multiplication operator: `*`.
    Mul,
    /// The division operator: `/`.
    Div,
}

impl ArithOp {
    /// The symbol of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

/// The different kinds of executable nodes and their payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecKind {
    /// Defines a `struct` from a chain of [`ExecKind::VarDecl`] members.
    StructDecl {
        /// The name of the `struct`.
        name: StrRef,
        /// The first member.
        members: ExecId,
    },
    /// Places a field at the current offset.
    VarDecl {
        /// The name of the type of the field.
        type_name: StrRef,
        /// The number of elements if the field is an array.
        count: Option<ExecId>,
        /// The name of the field.
        var_name: StrRef,
    },
    /// A sequence of statements.
    Block {
        /// The first statement.
        first: ExecId,
    },
    /// Reads a member of a `struct` variable.
    MemberAccess {
        /// The name of the `struct` variable.
        var: StrRef,
        /// The name of the member.
        member: StrRef,
    },
    /// Reads a variable.
    VarRef {
        /// The name of the variable.
        name: StrRef,
    },
    /// Reads a single element of an array.
    ElementAccess {
        /// The array, either a [`ExecKind::VarRef`] or a [`ExecKind::MemberAccess`].
        base: ExecId,
        /// The index of the element.
        index: ExecId,
    },
    /// Combines two numbers.
    Arithmetic {
        /// The operator.
        op: ArithOp,
        /// The left hand side.
        lhs: ExecId,
        /// The right hand side.
        rhs: ExecId,
    },
    /// An integer literal.
    IntLiteral(i64),
    /// Marks the end of the script.
    ScriptEnd,
}

/// A single executable node.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecNode {
    /// The kind and payload of the node.
    pub kind: ExecKind,
    /// The declared type of a declaration or the type of the produced value.
    pub ty: ValueType,
    /// The next statement in the same chain.
    pub next: Option<ExecId>,
    /// The source line the node was lowered from.
    pub line: u32,
}

/// A compiled template, ready to be executed against a brick wall.
#[derive(Debug, Default)]
pub struct CompiledTemplate {
    /// The executable nodes.
    pub(crate) nodes: NodeArena<ExecNode>,
    /// The interned names.
    pub(crate) data: ExecData,
    /// The first top level statement.
    pub(crate) first: Option<ExecId>,
}

impl CompiledTemplate {
    /// The first top level statement.
    ///
    /// The chain of top level statements always ends in [`ExecKind::ScriptEnd`].
    pub fn first(&self) -> Option<ExecId> {
        self.first
    }

    /// Returns the node for the given handle.
    pub fn node(&self, id: ExecId) -> &ExecNode {
        &self.nodes[id]
    }

    /// Resolves an interned string.
    pub fn str(&self, string: StrRef) -> &str {
        self.data.resolve(string)
    }

    /// Iterates over the chain of nodes starting at `head`.
    pub fn chain(&self, head: Option<ExecId>) -> impl Iterator<Item = ExecId> + '_ {
        std::iter::successors(head, |&id| self.nodes[id].next)
    }

    /// Iterates over the top level statements.
    pub fn statements(&self) -> impl Iterator<Item = ExecId> + '_ {
        self.chain(self.first)
    }

    /// Renders a single node.
    fn fmt_node(&self, id: ExecId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.nodes[id];
        match &node.kind {
            ExecKind::StructDecl { name, members } => {
                write!(f, "struct {} {{", self.str(*name))?;
                for member in self.chain(Some(*members)) {
                    f.write_str(" ")?;
                    self.fmt_node(member, f)?;
                    f.write_str(";")?;
                }
                f.write_str(" }")
            }
            ExecKind::VarDecl {
                type_name,
                count,
                var_name,
            } => {
                f.write_str(self.str(*type_name))?;
                if let Some(count) = count {
                    f.write_str("[")?;
                    self.fmt_node(*count, f)?;
                    f.write_str("]")?;
                }
                write!(f, " {}", self.str(*var_name))
            }
            ExecKind::Block { first } => {
                f.write_str("{")?;
                for statement in self.chain(Some(*first)) {
                    f.write_str(" ")?;
                    self.fmt_node(statement, f)?;
                    f.write_str(";")?;
                }
                f.write_str(" }")
            }
            ExecKind::MemberAccess { var, member } => {
                write!(f, "{}.{}", self.str(*var), self.str(*member))
            }
            ExecKind::VarRef { name } => f.write_str(self.str(*name)),
            ExecKind::ElementAccess { base, index } => {
                self.fmt_node(*base, f)?;
                f.write_str("[")?;
                self.fmt_node(*index, f)?;
                f.write_str("]")
            }
            ExecKind::Arithmetic { op, lhs, rhs } => {
                f.write_str("(")?;
                self.fmt_node(*lhs, f)?;
                write!(f, " {} ", op.symbol())?;
                self.fmt_node(*rhs, f)?;
                f.write_str(")")
            }
            ExecKind::IntLiteral(value) => write!(f, "{value}"),
            ExecKind::ScriptEnd => f.write_str("<end>"),
        }
    }
}

impl fmt::Display for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            self.fmt_node(statement, f)?;
        }

        Ok(())
    }
}
