//! Implements walking the executable nodes and placing bricks.

use brickwall_common::{Brick, BrickName, BrickWall, PALETTE, PrimitiveType, StructIndex, TypeId};
use smol_str::SmolStr;
use tracing::{debug, trace, warn};

use crate::ir::{CompiledTemplate, ExecId, ExecKind, StrRef};

use super::{ExecError, ExecErrorKind, ExecOptions, ExecReport, Value, View};

/// The type of the elements of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementType {
    /// A primitive type.
    Primitive(PrimitiveType),
    /// A `struct`, given by its index into the defined layouts.
    Struct(usize),
}

/// A field, either placed at the top level or as a member of a `struct`.
#[derive(Debug, Clone)]
struct Field {
    /// The name of the field.
    name: SmolStr,
    /// The offset of the field, relative to the parent `struct` for members.
    start: i64,
    /// The type of the elements.
    element: ElementType,
    /// The number of elements.
    count: u64,
    /// Whether the field was declared with a count.
    is_array: bool,
}

/// The layout of a `struct` defined by the template.
#[derive(Debug)]
struct StructLayout {
    /// The name of the `struct`.
    name: SmolStr,
    /// The definition in the brick wall.
    index: StructIndex,
    /// The size of one instance in bytes.
    size: u64,
    /// The members in declaration order.
    members: Vec<Field>,
}

/// Contains the state of a single execution.
pub(super) struct Executor<'t, 'v> {
    /// The template being executed.
    template: &'t CompiledTemplate,
    /// The bytes the template describes.
    view: &'v View<'v>,
    /// The options of this execution.
    options: ExecOptions,
    /// The wall receiving the bricks, committed by the caller on success.
    wall: BrickWall,
    /// The offset of the next field.
    cursor: i64,
    /// The `struct`s defined so far.
    layouts: Vec<StructLayout>,
    /// The top level fields placed so far.
    variables: Vec<Field>,
    /// The report of this execution.
    report: ExecReport,
}

impl<'t, 'v> Executor<'t, 'v> {
    /// Creates an executor that places bricks into `wall`.
    pub(super) fn new(
        template: &'t CompiledTemplate,
        view: &'v View<'v>,
        options: ExecOptions,
        wall: BrickWall,
    ) -> Self {
        Executor {
            template,
            view,
            options,
            wall,
            cursor: options.start_offset,
            layouts: Vec::new(),
            variables: Vec::new(),
            report: ExecReport::default(),
        }
    }

    /// Executes the top level statements until the end of the script.
    pub(super) fn run(&mut self) -> Result<(), ExecError> {
        let template = self.template;
        for statement in template.statements() {
            if !self.statement(statement)? {
                break;
            }
        }

        Ok(())
    }

    /// Returns the resulting wall and report.
    pub(super) fn finish(mut self) -> (BrickWall, ExecReport) {
        self.report.end_offset = self.cursor;
        (self.wall, self.report)
    }

    /// Executes a single statement, returning `false` once the script ends.
    fn statement(&mut self, id: ExecId) -> Result<bool, ExecError> {
        let template = self.template;
        let node = template.node(id);

        match node.kind {
            ExecKind::StructDecl { name, members } => self.define_struct(id, name, members)?,
            ExecKind::VarDecl {
                type_name,
                count,
                var_name,
            } => self.place(id, type_name, count, var_name)?,
            ExecKind::Block { first } => {
                for statement in template.chain(Some(first)) {
                    if !self.statement(statement)? {
                        return Ok(false);
                    }
                }
            }
            ExecKind::ScriptEnd => return Ok(false),
            ExecKind::MemberAccess { .. }
            | ExecKind::VarRef { .. }
            | ExecKind::ElementAccess { .. }
            | ExecKind::Arithmetic { .. }
            | ExecKind::IntLiteral(_) => {
                let value = self.eval(id)?;
                debug!(line = node.line, %value, "evaluated expression statement");
            }
        }

        Ok(true)
    }

    /// Creates an error of the given kind at the line of `at`.
    fn error(&self, at: ExecId, kind: ExecErrorKind) -> ExecError {
        ExecError {
            line: self.template.node(at).line,
            kind,
        }
    }

    /// Resolves a type name to an element type.
    fn element_type(&self, at: ExecId, name: &str) -> Result<ElementType, ExecError> {
        if let Some(primitive) = PrimitiveType::from_name(name) {
            return Ok(ElementType::Primitive(primitive));
        }

        self.layouts
            .iter()
            .rposition(|layout| layout.name == name)
            .map(ElementType::Struct)
            .ok_or_else(|| self.error(at, ExecErrorKind::UnknownType(SmolStr::new(name))))
    }

    /// The size of a single element in bytes.
    fn element_size(&self, element: ElementType) -> u64 {
        match element {
            ElementType::Primitive(primitive) => primitive.size(),
            ElementType::Struct(layout) => self.layouts[layout].size,
        }
    }

    /// Evaluates an optional count, defaulting to one.
    fn count(&self, at: ExecId, count: Option<ExecId>) -> Result<u64, ExecError> {
        let Some(count) = count else {
            return Ok(1);
        };

        match self.eval(count)? {
            Value::Int(value) => u64::try_from(value)
                .map_err(|_| self.error(at, ExecErrorKind::NegativeCount(value))),
            Value::Float(value) => Err(self.error(at, ExecErrorKind::NotAnInteger(value))),
        }
    }

    /// Computes the element type, count and total size of a declaration.
    fn declaration(
        &self,
        at: ExecId,
        type_name: StrRef,
        count: Option<ExecId>,
        name: &str,
    ) -> Result<(ElementType, u64, u64), ExecError> {
        let element = self.element_type(at, self.template.str(type_name))?;
        let count = self.count(at, count)?;
        let size = self
            .element_size(element)
            .checked_mul(count)
            .ok_or_else(|| self.error(at, ExecErrorKind::SizeOverflow(SmolStr::new(name))))?;

        Ok((element, count, size))
    }

    /// Defines a `struct` from its member declarations.
    ///
    /// An identical definition of the same name that is already part of the wall is reused.
    fn define_struct(
        &mut self,
        at: ExecId,
        name: StrRef,
        first: ExecId,
    ) -> Result<(), ExecError> {
        let template = self.template;
        let name = template.str(name);

        let mut members = Vec::new();
        let mut bricks = Vec::new();
        let mut offset = 0u64;
        for member in template.chain(Some(first)) {
            let ExecKind::VarDecl {
                type_name,
                count,
                var_name,
            } = template.node(member).kind
            else {
                return Err(self.error(member, ExecErrorKind::InvalidStruct(SmolStr::new(name))));
            };

            let member_name = template.str(var_name);
            let (element, element_count, size) =
                self.declaration(member, type_name, count, member_name)?;
            let overflow = || self.error(member, ExecErrorKind::SizeOverflow(SmolStr::new(name)));
            let start = i64::try_from(offset).map_err(|_| overflow())?;

            if size != 0 {
                bricks.push(self.member_brick(member_name, element, start, size));
            }
            members.push(Field {
                name: SmolStr::new(member_name),
                start,
                element,
                count: element_count,
                is_array: count.is_some(),
            });
            offset = offset.checked_add(size).ok_or_else(overflow)?;
        }

        let existing = self
            .wall
            .struct_by_name(BrickName::new(name).as_str())
            .filter(|&index| {
                self.wall
                    .struct_def(index)
                    .is_some_and(|def| def.members() == bricks.as_slice())
            });
        let index = match existing {
            Some(index) => {
                trace!(struct_name = name, "reusing identical struct definition");
                index
            }
            None => {
                let color = PALETTE[self.wall.structs().len() % PALETTE.len()];
                let index = self.wall.new_struct_def(name, color);
                for brick in bricks {
                    if !self.wall.append_struct_member(index, brick) {
                        return Err(self.error(
                            at,
                            ExecErrorKind::InvalidStruct(SmolStr::new(name)),
                        ));
                    }
                }
                index
            }
        };

        debug!(struct_name = name, size = offset, members = members.len(), "defined struct");
        self.layouts.push(StructLayout {
            name: SmolStr::new(name),
            index,
            size: offset,
            members,
        });
        self.report.structs_defined += 1;

        Ok(())
    }

    /// Creates the brick describing a `struct` member.
    fn member_brick(&self, name: &str, element: ElementType, start: i64, size: u64) -> Brick {
        match element {
            ElementType::Primitive(primitive) => Brick::new(
                name,
                TypeId::primitive(primitive),
                start,
                size,
                primitive.default_color(),
            ),
            ElementType::Struct(layout) => {
                let index = self.layouts[layout].index;
                let color = self
                    .wall
                    .struct_def(index)
                    .map_or(PALETTE[0], |def| def.color);

                Brick {
                    struct_def: Some(index),
                    ..Brick::new(name, TypeId::user_struct(index), start, size, color)
                }
            }
        }
    }

    /// Places a top level field at the cursor and advances the cursor past it.
    fn place(
        &mut self,
        at: ExecId,
        type_name: StrRef,
        count: Option<ExecId>,
        var_name: StrRef,
    ) -> Result<(), ExecError> {
        let template = self.template;
        let name = template.str(var_name);
        let (element, element_count, size) = self.declaration(at, type_name, count, name)?;

        let start = self.cursor;
        let field = Field {
            name: SmolStr::new(name),
            start,
            element,
            count: element_count,
            is_array: count.is_some(),
        };

        if size == 0 {
            debug!(field = name, start, "skipping empty field");
            self.variables.push(field);
            return Ok(());
        }

        let end = i64::try_from(size)
            .ok()
            .and_then(|size| start.checked_add(size))
            .ok_or_else(|| self.error(at, ExecErrorKind::SizeOverflow(SmolStr::new(name))))?;
        self.check_bounds(at, name, start, end)?;

        let inserted = match element {
            ElementType::Primitive(primitive) => self.wall.try_insert_brick(Brick::new(
                name,
                TypeId::primitive(primitive),
                start,
                size,
                primitive.default_color(),
            )),
            ElementType::Struct(layout) => {
                let instances = i32::try_from(element_count).map_err(|_| {
                    self.error(at, ExecErrorKind::CountTooLarge(element_count))
                })?;
                let index = self.layouts[layout].index;
                self.wall
                    .try_insert_brick_struct(name, start, instances, index)
            }
        };

        match inserted {
            Ok(()) => {
                trace!(field = name, start, size, "placed brick");
                self.report.placed += 1;
            }
            Err(err) => {
                warn!(%err, "brick rejected by the wall");
                self.report.rejected.push(err);
            }
        }

        self.variables.push(field);
        self.cursor = end;

        Ok(())
    }

    /// Checks that `start..end` lies within the view.
    fn check_bounds(&self, at: ExecId, name: &str, start: i64, end: i64) -> Result<(), ExecError> {
        let len = self.view.len();
        let inside = start >= 0 && u64::try_from(end).is_ok_and(|end| end <= len);
        if inside {
            Ok(())
        } else {
            Err(self.error(
                at,
                ExecErrorKind::OutOfBounds {
                    name: SmolStr::new(name),
                    start,
                    end,
                    len,
                },
            ))
        }
    }

    /// Finds the field a [`ExecKind::VarRef`] or [`ExecKind::MemberAccess`] refers to.
    ///
    /// Member offsets are made absolute.
    fn locate(&self, id: ExecId) -> Result<Field, ExecError> {
        let template = self.template;
        match template.node(id).kind {
            ExecKind::VarRef { name } => self.variable(id, template.str(name)).cloned(),
            ExecKind::MemberAccess { var, member } => {
                let var = template.str(var);
                let member = template.str(member);

                let parent = self.variable(id, var)?;
                let ElementType::Struct(layout) = parent.element else {
                    return Err(self.error(id, ExecErrorKind::NotAScalar(SmolStr::new(var))));
                };
                let layout = &self.layouts[layout];

                let Some(field) = layout.members.iter().find(|field| field.name == member) else {
                    return Err(self.error(
                        id,
                        ExecErrorKind::UnknownMember {
                            ty: layout.name.clone(),
                            member: SmolStr::new(member),
                        },
                    ));
                };

                Ok(Field {
                    name: SmolStr::new(format!("{var}.{member}")),
                    start: parent.start + field.start,
                    ..field.clone()
                })
            }
            _ => Err(self.error(id, ExecErrorKind::NotAnExpression)),
        }
    }

    /// Finds the most recently placed top level field with the given name.
    fn variable(&self, at: ExecId, name: &str) -> Result<&Field, ExecError> {
        self.variables
            .iter()
            .rev()
            .find(|field| field.name == name)
            .ok_or_else(|| self.error(at, ExecErrorKind::UnknownVariable(SmolStr::new(name))))
    }

    /// Evaluates an expression.
    fn eval(&self, id: ExecId) -> Result<Value, ExecError> {
        let template = self.template;
        match template.node(id).kind {
            ExecKind::IntLiteral(value) => Ok(Value::Int(value)),
            ExecKind::VarRef { .. } | ExecKind::MemberAccess { .. } => {
                let field = self.locate(id)?;
                match field.element {
                    ElementType::Primitive(primitive) if !field.is_array => {
                        self.read(id, &field.name, primitive, field.start)
                    }
                    _ => Err(self.error(id, ExecErrorKind::NotAScalar(field.name))),
                }
            }
            ExecKind::ElementAccess { base, index } => {
                let field = self.locate(base)?;
                let ElementType::Primitive(primitive) = field.element else {
                    return Err(self.error(id, ExecErrorKind::NotAScalar(field.name)));
                };

                let index = match self.eval(index)? {
                    Value::Int(index) => index,
                    Value::Float(index) => {
                        return Err(self.error(id, ExecErrorKind::NotAnInteger(index)));
                    }
                };
                let out_of_range = || ExecErrorKind::IndexOutOfRange {
                    name: field.name.clone(),
                    index,
                    count: field.count,
                };
                let element = u64::try_from(index)
                    .ok()
                    .filter(|&element| element < field.count)
                    .ok_or_else(|| self.error(id, out_of_range()))?;

                let offset = element
                    .checked_mul(primitive.size())
                    .and_then(|offset| i64::try_from(offset).ok())
                    .and_then(|offset| field.start.checked_add(offset))
                    .ok_or_else(|| self.error(id, out_of_range()))?;

                self.read(id, &field.name, primitive, offset)
            }
            ExecKind::Arithmetic { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                Value::apply(op, lhs, rhs).map_err(|kind| self.error(id, kind))
            }
            ExecKind::StructDecl { .. }
            | ExecKind::VarDecl { .. }
            | ExecKind::Block { .. }
            | ExecKind::ScriptEnd => Err(self.error(id, ExecErrorKind::NotAnExpression)),
        }
    }

    /// Reads a single primitive at `offset`.
    fn read(
        &self,
        at: ExecId,
        name: &str,
        primitive: PrimitiveType,
        offset: i64,
    ) -> Result<Value, ExecError> {
        let size = primitive.size();
        let end = offset.saturating_add_unsigned(size);
        self.check_bounds(at, name, offset, end)?;

        let mut buf = [0; 8];
        let buf = &mut buf[..usize::try_from(size).expect("primitive sizes fit a `usize`")];
        let start = u64::try_from(offset).expect("bounds were checked above");
        let bytes = self
            .view
            .read_at(start, buf)
            .map_err(|err| self.error(at, err.into()))?;

        let Some(scalar) = primitive.decode(bytes, self.options.endianness) else {
            return Err(self.error(
                at,
                ExecErrorKind::OutOfBounds {
                    name: SmolStr::new(name),
                    start: offset,
                    end,
                    len: self.view.len(),
                },
            ));
        };

        Value::from_scalar(scalar).map_err(|kind| self.error(at, kind))
    }
}
