//! Implements lowering folded AST chains to executable nodes.

use brickwall_common::PrimitiveType;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::{
    arena::NodeArena,
    ast::{AstKind, AstNode, NodeId},
    lexer::TokenKind,
};

use super::{ArithOp, CompiledTemplate, ExecData, ExecId, ExecKind, ExecNode, StrRef, ValueType};

/// An error found while lowering a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct SemanticError {
    /// The line of the offending construct.
    pub line: u32,
    /// The kind of error.
    pub kind: SemanticErrorKind,
}

/// The different kinds of semantic errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SemanticErrorKind {
    /// A type name that is neither a primitive nor a previously declared `struct`.
    #[error("unknown type `{0}`")]
    UnknownType(SmolStr),
    /// A name that does not refer to a declared variable.
    #[error("unknown variable `{0}`")]
    UnknownVariable(SmolStr),
    /// A member name that is not part of the `struct`.
    #[error("`{ty}` has no member `{member}`")]
    UnknownMember {
        /// The name of the `struct`.
        ty: SmolStr,
        /// The name of the missing member.
        member: SmolStr,
    },
    /// A member access on a variable that is not a `struct`.
    #[error("`{0}` is not a struct")]
    NotAStruct(SmolStr),
    /// An array used where a single value is expected.
    #[error("`{0}` is an array and must be indexed")]
    ArrayAsValue(SmolStr),
    /// Indexing something that is not an array.
    #[error("`{0}` is not an array")]
    NotAnArray(SmolStr),
    /// A `struct` used where a number is expected.
    #[error("`{0}` does not hold a number")]
    NotANumber(SmolStr),
    /// An array count that is not an integer.
    #[error("array counts must be integers")]
    NonIntegerCount,
    /// An array index that is not an integer.
    #[error("array indices must be integers")]
    NonIntegerIndex,
    /// A `struct` member count that depends on data.
    #[error("struct member counts must be constant")]
    NonConstantCount,
    /// An arithmetic operand that is not a number.
    #[error("the operands of `{0}` must be numbers")]
    NonNumericOperand(&'static str),
    /// An integer literal that does not fit into 64 bits.
    #[error("integer literal `{0}` does not fit into 64 bits")]
    IntegerOutOfRange(SmolStr),
    /// A `struct` named like a primitive type.
    #[error("`{0}` is a primitive type")]
    ReservedTypeName(SmolStr),
    /// A `struct` declared twice.
    #[error("struct `{0}` is already declared")]
    DuplicateStruct(SmolStr),
    /// A member declared twice in the same `struct`.
    #[error("member `{0}` is already declared")]
    DuplicateMember(SmolStr),
    /// A statement inside a `struct` body that is not a field declaration.
    #[error("structs may only contain field declarations")]
    InvalidStructMember,
    /// A member access that is not of the form `variable.member`.
    #[error("member access needs a variable name and a member name")]
    InvalidMemberAccess,
    /// A `struct` declaration without a body.
    #[error("struct `{0}` needs a body")]
    MissingStructBody(SmolStr),
    /// A construct that parses but cannot be executed yet.
    #[error("`{0}` cannot be executed yet")]
    NotYetExecutable(&'static str),
    /// A construct that the executable form does not support.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
    /// A statement where an expression is required.
    #[error("expected an expression")]
    ExpectedExpression,
    /// More than one expression where a single one is required.
    #[error("expected a single expression")]
    ExpectedSingleExpression,
    /// The interned names exceed the addressable size.
    #[error("the template is too large")]
    TooLarge,
}

/// A declared variable or `struct` member.
#[derive(Debug, Clone)]
struct Binding {
    /// The name of the variable.
    name: SmolStr,
    /// The declared element type.
    ty: ValueType,
    /// Whether the declaration has a count.
    is_array: bool,
}

/// The members of a lowered `struct`.
#[derive(Debug)]
struct StructScope {
    /// The name of the `struct`.
    name: SmolStr,
    /// The members in declaration order.
    members: Vec<Binding>,
}

/// The nodes making up a variable declaration.
#[derive(Debug, Clone, Copy)]
struct VarDeclParts {
    /// The type name.
    ty: NodeId,
    /// The head of the count expression.
    count: Option<NodeId>,
    /// The variable name.
    name: NodeId,
    /// The remainder of the chain.
    rest: Option<NodeId>,
}

/// The context in which lowering is performed.
pub(crate) struct LoweringCtx<'a> {
    /// The source text the AST was parsed from.
    src: &'a str,
    /// The parsed nodes.
    ast: &'a NodeArena<AstNode>,
    /// The lowered nodes.
    nodes: NodeArena<ExecNode>,
    /// The interned names.
    data: ExecData,
    /// The `struct`s declared so far.
    structs: Vec<StructScope>,
    /// The top level variables declared so far.
    variables: Vec<Binding>,
    /// The members collected while lowering a `struct` body.
    members: Option<Vec<Binding>>,
    /// The first top level statement.
    first: Option<ExecId>,
    /// The last top level statement.
    last: Option<ExecId>,
}

impl<'a> LoweringCtx<'a> {
    /// Creates a new lowering context for the given AST.
    pub(crate) fn new(src: &'a str, ast: &'a NodeArena<AstNode>) -> LoweringCtx<'a> {
        LoweringCtx {
            src,
            ast,
            nodes: NodeArena::new(),
            data: ExecData::new(),
            structs: Vec::new(),
            variables: Vec::new(),
            members: None,
            first: None,
            last: None,
        }
    }

    /// Lowers a top level statement chain and appends it to the template.
    pub(crate) fn lower_statement(&mut self, head: NodeId) -> Result<(), SemanticError> {
        let (first, last) = self.lower_chain(head)?;

        match self.last {
            Some(tail) => self.nodes[tail].next = Some(first),
            None => self.first = Some(first),
        }
        self.last = Some(last);

        Ok(())
    }

    /// Finishes lowering and returns the compiled template.
    pub(crate) fn finish(mut self) -> CompiledTemplate {
        let ends = self
            .last
            .is_some_and(|last| self.nodes[last].kind == ExecKind::ScriptEnd);
        if !ends {
            let end = self.nodes.alloc(ExecNode {
                kind: ExecKind::ScriptEnd,
                ty: ValueType::Void,
                next: None,
                line: self.last.map_or(1, |last| self.nodes[last].line),
            });
            match self.last {
                Some(tail) => self.nodes[tail].next = Some(end),
                None => self.first = Some(end),
            }
        }

        CompiledTemplate {
            nodes: self.nodes,
            data: self.data,
            first: self.first,
        }
    }

    /// Creates an error of the given kind at the line of `at`.
    fn error(&self, at: NodeId, kind: SemanticErrorKind) -> SemanticError {
        SemanticError {
            line: self.ast[at].token.line,
            kind,
        }
    }

    /// The source text of the given node.
    fn text(&self, id: NodeId) -> &'a str {
        let ast = self.ast;
        ast[id].token.span.text(self.src)
    }

    /// Interns `string`.
    fn intern(&mut self, at: NodeId, string: &str) -> Result<StrRef, SemanticError> {
        self.data
            .intern(string)
            .ok_or_else(|| self.error(at, SemanticErrorKind::TooLarge))
    }

    /// Allocates an executable node lowered from `at`.
    fn alloc(&mut self, at: NodeId, kind: ExecKind, ty: ValueType) -> ExecId {
        self.nodes.alloc(ExecNode {
            kind,
            ty,
            next: None,
            line: self.ast[at].token.line,
        })
    }

    /// Lowers a chain of statements, returning the first and last lowered node.
    fn lower_chain(&mut self, head: NodeId) -> Result<(ExecId, ExecId), SemanticError> {
        let (first, mut rest) = self.lower_one(head)?;
        let mut last = first;

        while let Some(id) = rest {
            let (exec, next) = self.lower_one(id)?;
            self.nodes[last].next = Some(exec);
            last = exec;
            rest = next;
        }

        Ok((first, last))
    }

    /// Lowers the statement starting at `id`, returning the rest of the chain.
    fn lower_one(&mut self, id: NodeId) -> Result<(ExecId, Option<NodeId>), SemanticError> {
        if let Some(parts) = self.var_decl_parts(id) {
            let exec = self.lower_var_decl(parts)?;
            return Ok((exec, parts.rest));
        }

        if self.members.is_some() {
            return Err(self.error(id, SemanticErrorKind::InvalidStructMember));
        }

        let ast = self.ast;
        let node = &ast[id];
        match node.kind {
            AstKind::StructDecl => self.lower_struct_decl(id),
            AstKind::Block => Ok((self.lower_block(id)?, node.next)),
            AstKind::ScriptEnd => Ok((
                self.alloc(id, ExecKind::ScriptEnd, ValueType::Void),
                node.next,
            )),
            _ => Ok((self.lower_expr(id)?, node.next)),
        }
    }

    /// Recognizes `type name` and `type[count] name` at `id`.
    fn var_decl_parts(&self, id: NodeId) -> Option<VarDeclParts> {
        let node = &self.ast[id];
        let name = node.next?;
        if self.ast[name].kind != AstKind::Name {
            return None;
        }

        let (ty, count) = match node.kind {
            AstKind::Name => (id, None),
            AstKind::ArrayAccess => {
                let base = node.param1?;
                if self.ast[base].kind != AstKind::Name {
                    return None;
                }
                (base, node.param2)
            }
            _ => return None,
        };

        Some(VarDeclParts {
            ty,
            count,
            name,
            rest: self.ast[name].next,
        })
    }

    /// Lowers a variable declaration, or a member declaration inside a `struct` body.
    fn lower_var_decl(&mut self, parts: VarDeclParts) -> Result<ExecId, SemanticError> {
        let type_name = self.text(parts.ty);
        let primitive = self.resolve_type(parts.ty, type_name)?;

        let count = match parts.count {
            Some(head) => {
                let count = self.lower_sub_expr(head)?;
                if !self.nodes[count].ty.is_integer() {
                    return Err(self.error(head, SemanticErrorKind::NonIntegerCount));
                }
                if self.members.is_some() && !self.is_constant(count) {
                    return Err(self.error(head, SemanticErrorKind::NonConstantCount));
                }
                Some(count)
            }
            None => None,
        };

        let var_name = self.text(parts.name);
        let type_ref = self.intern(parts.ty, type_name)?;
        let var_ref = self.intern(parts.name, var_name)?;
        let ty = match primitive {
            Some(primitive) => ValueType::Primitive(primitive),
            None => ValueType::Struct(type_ref),
        };

        let binding = Binding {
            name: SmolStr::new(var_name),
            ty,
            is_array: count.is_some(),
        };
        if let Some(members) = &self.members
            && members.iter().any(|member| member.name == binding.name)
        {
            return Err(self.error(parts.name, SemanticErrorKind::DuplicateMember(binding.name)));
        }
        match &mut self.members {
            Some(members) => members.push(binding),
            None => self.variables.push(binding),
        }

        trace!(ty = type_name, name = var_name, "lowered declaration");

        Ok(self.alloc(
            parts.ty,
            ExecKind::VarDecl {
                type_name: type_ref,
                count,
                var_name: var_ref,
            },
            ty,
        ))
    }

    /// Resolves a type name, returning `None` for `struct` types.
    fn resolve_type(
        &self,
        at: NodeId,
        name: &str,
    ) -> Result<Option<PrimitiveType>, SemanticError> {
        if let Some(primitive) = PrimitiveType::from_name(name) {
            Ok(Some(primitive))
        } else if self.structs.iter().any(|scope| scope.name == name) {
            Ok(None)
        } else {
            Err(self.error(at, SemanticErrorKind::UnknownType(SmolStr::new(name))))
        }
    }

    /// Lowers a `struct` declaration followed by its body.
    fn lower_struct_decl(&mut self, id: NodeId) -> Result<(ExecId, Option<NodeId>), SemanticError> {
        let ast = self.ast;
        let decl = &ast[id];
        let Some(name_id) = decl.param1 else {
            return Err(self.error(id, SemanticErrorKind::InvalidStructMember));
        };
        let name = SmolStr::new(self.text(name_id));

        let body = decl.next.filter(|&body| ast[body].kind == AstKind::Block);
        let Some(first) = body.and_then(|body| ast[body].param1) else {
            return Err(self.error(id, SemanticErrorKind::MissingStructBody(name)));
        };

        if PrimitiveType::from_name(&name).is_some() {
            return Err(self.error(name_id, SemanticErrorKind::ReservedTypeName(name)));
        }
        if self.structs.iter().any(|scope| scope.name == name) {
            return Err(self.error(name_id, SemanticErrorKind::DuplicateStruct(name)));
        }

        let outer = self.members.replace(Vec::new());
        let lowered = self.lower_chain(first);
        let members = std::mem::replace(&mut self.members, outer).unwrap_or_default();
        let (first_member, _) = lowered?;

        let name_ref = self.intern(name_id, &name)?;
        let exec = self.alloc(
            id,
            ExecKind::StructDecl {
                name: name_ref,
                members: first_member,
            },
            ValueType::Void,
        );

        debug!(name = %name, members = members.len(), "lowered struct");
        self.structs.push(StructScope { name, members });

        Ok((exec, body.and_then(|body| ast[body].next)))
    }

    /// Lowers a block of statements.
    fn lower_block(&mut self, id: NodeId) -> Result<ExecId, SemanticError> {
        let Some(first) = self.ast[id].param1 else {
            return Err(self.error(id, SemanticErrorKind::ExpectedExpression));
        };
        let (first, _) = self.lower_chain(first)?;

        Ok(self.alloc(id, ExecKind::Block { first }, ValueType::Void))
    }

    /// Lowers a chain that must consist of a single expression.
    fn lower_sub_expr(&mut self, head: NodeId) -> Result<ExecId, SemanticError> {
        if self.ast[head].next.is_some() {
            return Err(self.error(head, SemanticErrorKind::ExpectedSingleExpression));
        }

        self.lower_expr(head)
    }

    /// Lowers the expression node `id`, ignoring its siblings.
    fn lower_expr(&mut self, id: NodeId) -> Result<ExecId, SemanticError> {
        let ast = self.ast;
        let node = &ast[id];
        match node.kind {
            AstKind::StructAccess => {
                let (exec, member) = self.lower_member_access(id)?;
                self.check_scalar(id, &member)?;
                Ok(exec)
            }
            AstKind::OpMath => self.lower_arithmetic(id),
            AstKind::Integer => {
                let text = self.text(id);
                let value = text.parse::<i64>().map_err(|_| {
                    self.error(id, SemanticErrorKind::IntegerOutOfRange(SmolStr::new(text)))
                })?;

                Ok(self.alloc(
                    id,
                    ExecKind::IntLiteral(value),
                    ValueType::Primitive(PrimitiveType::Int64),
                ))
            }
            AstKind::Name => {
                let (exec, binding) = self.lower_var_ref(id)?;
                self.check_scalar(id, &binding)?;
                Ok(exec)
            }
            AstKind::ParenthesisExpr => match node.param1 {
                Some(inner) => self.lower_sub_expr(inner),
                None => Err(self.error(id, SemanticErrorKind::ExpectedExpression)),
            },
            AstKind::ArrayAccess => self.lower_element_access(id),
            AstKind::OpAssign => Err(self.error(id, SemanticErrorKind::Unsupported("assignment"))),
            AstKind::OpCompare => Err(self.error(id, SemanticErrorKind::Unsupported("comparison"))),
            AstKind::If => Err(self.error(id, SemanticErrorKind::NotYetExecutable("if"))),
            AstKind::Else => Err(self.error(id, SemanticErrorKind::NotYetExecutable("else"))),
            AstKind::While => Err(self.error(id, SemanticErrorKind::NotYetExecutable("while"))),
            AstKind::Block | AstKind::StructDecl | AstKind::ScriptEnd => {
                Err(self.error(id, SemanticErrorKind::ExpectedExpression))
            }
        }
    }

    /// Checks that `binding` holds a single number.
    fn check_scalar(&self, at: NodeId, binding: &Binding) -> Result<(), SemanticError> {
        if binding.is_array {
            Err(self.error(at, SemanticErrorKind::ArrayAsValue(binding.name.clone())))
        } else if !binding.ty.is_numeric() {
            Err(self.error(at, SemanticErrorKind::NotANumber(binding.name.clone())))
        } else {
            Ok(())
        }
    }

    /// Finds the innermost declaration of the variable `name`.
    fn lookup_variable(&self, name: &str) -> Option<Binding> {
        self.members
            .iter()
            .flatten()
            .rev()
            .chain(self.variables.iter().rev())
            .find(|binding| binding.name == name)
            .cloned()
    }

    /// Lowers a reference to a variable.
    fn lower_var_ref(&mut self, id: NodeId) -> Result<(ExecId, Binding), SemanticError> {
        let name = self.text(id);
        let Some(binding) = self.lookup_variable(name) else {
            return Err(self.error(id, SemanticErrorKind::UnknownVariable(SmolStr::new(name))));
        };

        let name = self.intern(id, name)?;
        let exec = self.alloc(id, ExecKind::VarRef { name }, binding.ty);

        Ok((exec, binding))
    }

    /// Lowers `variable.member`, returning the lowered node and the member's declaration.
    fn lower_member_access(&mut self, id: NodeId) -> Result<(ExecId, Binding), SemanticError> {
        let ast = self.ast;
        let node = &ast[id];
        let (Some(var_id), Some(member_id)) = (node.param1, node.param2) else {
            return Err(self.error(id, SemanticErrorKind::InvalidMemberAccess));
        };
        if ast[var_id].kind != AstKind::Name || ast[member_id].kind != AstKind::Name {
            return Err(self.error(id, SemanticErrorKind::InvalidMemberAccess));
        }

        let var = self.text(var_id);
        let member = self.text(member_id);

        let Some(binding) = self.lookup_variable(var) else {
            return Err(self.error(var_id, SemanticErrorKind::UnknownVariable(SmolStr::new(var))));
        };
        if binding.is_array {
            return Err(self.error(var_id, SemanticErrorKind::ArrayAsValue(binding.name)));
        }
        let ValueType::Struct(struct_name) = binding.ty else {
            return Err(self.error(var_id, SemanticErrorKind::NotAStruct(binding.name)));
        };

        let struct_name = self.data.resolve(struct_name);
        let scope = self
            .structs
            .iter()
            .rev()
            .find(|scope| scope.name == struct_name);
        let Some(member_binding) = scope
            .and_then(|scope| scope.members.iter().find(|binding| binding.name == member))
            .cloned()
        else {
            return Err(self.error(
                member_id,
                SemanticErrorKind::UnknownMember {
                    ty: SmolStr::new(struct_name),
                    member: SmolStr::new(member),
                },
            ));
        };

        let var = self.intern(var_id, var)?;
        let member = self.intern(member_id, member)?;
        let exec = self.alloc(id, ExecKind::MemberAccess { var, member }, member_binding.ty);

        Ok((exec, member_binding))
    }

    /// Lowers indexing an array of numbers.
    fn lower_element_access(&mut self, id: NodeId) -> Result<ExecId, SemanticError> {
        let ast = self.ast;
        let node = &ast[id];
        let (Some(base_id), Some(index_head)) = (node.param1, node.param2) else {
            return Err(self.error(id, SemanticErrorKind::ExpectedExpression));
        };

        let (base, binding) = match ast[base_id].kind {
            AstKind::Name => self.lower_var_ref(base_id)?,
            AstKind::StructAccess => self.lower_member_access(base_id)?,
            _ => {
                let text = SmolStr::new(self.text(base_id));
                return Err(self.error(base_id, SemanticErrorKind::NotAnArray(text)));
            }
        };
        if !binding.is_array {
            return Err(self.error(base_id, SemanticErrorKind::NotAnArray(binding.name)));
        }
        if !binding.ty.is_numeric() {
            return Err(self.error(base_id, SemanticErrorKind::NotANumber(binding.name)));
        }

        let index = self.lower_sub_expr(index_head)?;
        if !self.nodes[index].ty.is_integer() {
            return Err(self.error(index_head, SemanticErrorKind::NonIntegerIndex));
        }

        Ok(self.alloc(id, ExecKind::ElementAccess { base, index }, binding.ty))
    }

    /// Lowers an arithmetic operation.
    ///
    /// The result is a 64 bit float if either operand is a float and a 64 bit signed integer
    /// otherwise.
    fn lower_arithmetic(&mut self, id: NodeId) -> Result<ExecId, SemanticError> {
        let ast = self.ast;
        let node = &ast[id];
        let op = match node.token.kind {
            TokenKind::Plus => ArithOp::Add,
            TokenKind::Minus => ArithOp::Sub,
            TokenKind::Star => ArithOp::Mul,
            TokenKind::Slash => ArithOp::Div,
            _ => return Err(self.error(id, SemanticErrorKind::ExpectedExpression)),
        };
        let (Some(lhs), Some(rhs)) = (node.param1, node.param2) else {
            return Err(self.error(id, SemanticErrorKind::ExpectedExpression));
        };

        let lhs = self.lower_expr(lhs)?;
        let rhs = self.lower_expr(rhs)?;
        let (lhs_ty, rhs_ty) = (self.nodes[lhs].ty, self.nodes[rhs].ty);
        if !lhs_ty.is_numeric() || !rhs_ty.is_numeric() {
            return Err(self.error(id, SemanticErrorKind::NonNumericOperand(op.symbol())));
        }

        let ty = if lhs_ty.is_float() || rhs_ty.is_float() {
            PrimitiveType::Float64
        } else {
            PrimitiveType::Int64
        };

        Ok(self.alloc(
            id,
            ExecKind::Arithmetic { op, lhs, rhs },
            ValueType::Primitive(ty),
        ))
    }

    /// Returns `true` if `id` only depends on literals.
    fn is_constant(&self, id: ExecId) -> bool {
        match self.nodes[id].kind {
            ExecKind::IntLiteral(_) => true,
            ExecKind::Arithmetic { lhs, rhs, .. } => self.is_constant(lhs) && self.is_constant(rhs),
            _ => false,
        }
    }
}
