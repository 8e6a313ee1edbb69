//! Implements the brick wall, the sorted and non-overlapping collection of bricks of a
//! document.

use smol_str::SmolStr;
use tracing::trace;

use crate::{Brick, BrickName, PrimitiveType, TypeId, TypeInfo};

/// Refers to a `struct` definition in a [`BrickWall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructIndex(usize);

impl StructIndex {
    /// Creates a `struct` index from its raw value.
    pub fn from_raw(raw: usize) -> StructIndex {
        StructIndex(raw)
    }

    /// Returns the raw index into the `struct` definitions.
    pub fn raw(self) -> usize {
        self.0
    }
}

/// A user defined composite type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrickStruct {
    /// The name of the `struct`.
    pub name: BrickName,
    /// The color used for instances of the `struct`.
    pub color: u32,
    /// The sum of the sizes of all members.
    size: u64,
    /// The members in declaration order, with offsets relative to the start of the `struct`.
    members: Vec<Brick>,
}

impl BrickStruct {
    /// The aggregate size of the `struct` in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The members of the `struct`.
    pub fn members(&self) -> &[Brick] {
        &self.members
    }

    /// Looks up a member by name.
    pub fn member(&self, name: &str) -> Option<&Brick> {
        self.members.iter().find(|member| member.name.as_str() == name)
    }

    /// Recomputes the aggregate size from the member sizes.
    ///
    /// Returns `None` and keeps the previous size if the sum does not fit a `u64`.
    pub fn compute_size(&mut self) -> Option<u64> {
        self.size = self
            .members
            .iter()
            .try_fold(0u64, |size, member| size.checked_add(member.size))?;
        Some(self.size)
    }
}

/// The reason a brick could not be inserted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InsertError {
    /// The brick intersects an existing brick.
    #[error("brick `{new}` overlaps the existing brick `{existing}`")]
    Overlap {
        /// The name of the rejected brick.
        new: BrickName,
        /// The name of the brick that is already present.
        existing: BrickName,
    },
    /// The type id of the brick does not resolve.
    #[error("brick `{0}` has an unknown type")]
    UnknownType(BrickName),
    /// The size of the brick is not a multiple of the size of its type.
    #[error("the size of brick `{name}` is not a multiple of {element_size}")]
    MisalignedSize {
        /// The name of the rejected brick.
        name: BrickName,
        /// The size of a single element of the type of the brick.
        element_size: u64,
    },
    /// The brick covers no bytes.
    #[error("brick `{0}` is empty")]
    Empty(BrickName),
    /// The size of the brick does not fit a `u64`.
    #[error("the size of brick `{0}` overflows")]
    SizeOverflow(BrickName),
}

/// The collection of all bricks of a document along with its `struct` definitions.
#[derive(Debug, Clone)]
pub struct BrickWall {
    /// The top level bricks, sorted by start and never overlapping.
    bricks: Vec<Brick>,
    /// The user defined `struct`s.
    structs: Vec<BrickStruct>,
    /// Maps type ids to their names and element sizes.
    ///
    /// Contains all primitives followed by all `struct`s.
    type_cache: Vec<TypeInfo>,
}

impl Default for BrickWall {
    fn default() -> Self {
        BrickWall::new()
    }
}

impl BrickWall {
    /// Creates a new wall without bricks or `struct`s.
    pub fn new() -> BrickWall {
        let mut wall = BrickWall {
            bricks: Vec::new(),
            structs: Vec::new(),
            type_cache: Vec::new(),
        };
        wall.rebuild_type_cache();

        wall
    }

    /// The top level bricks in ascending order.
    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    /// The `struct` definitions in the order they were defined.
    pub fn structs(&self) -> &[BrickStruct] {
        &self.structs
    }

    /// Returns the `struct` definition at the given index.
    pub fn struct_def(&self, index: StructIndex) -> Option<&BrickStruct> {
        self.structs.get(index.0)
    }

    /// Returns the most recently defined `struct` with the given name.
    pub fn struct_by_name(&self, name: &str) -> Option<StructIndex> {
        self.structs
            .iter()
            .rposition(|def| def.name.as_str() == name)
            .map(StructIndex)
    }

    /// Resolves a type id through the type cache.
    pub fn type_info(&self, type_id: TypeId) -> Option<&TypeInfo> {
        if let Some(primitive) = type_id.as_primitive() {
            self.type_cache.get(primitive as usize)
        } else {
            let index = type_id.as_struct()?;
            self.type_cache.get(PrimitiveType::ALL.len() + index.0)
        }
    }

    /// Inserts a brick, returning `false` if it was rejected.
    pub fn insert_brick(&mut self, brick: Brick) -> bool {
        self.try_insert_brick(brick).is_ok()
    }

    /// Inserts a brick at its sorted position.
    ///
    /// The wall is left unchanged if an error is returned.
    pub fn try_insert_brick(&mut self, brick: Brick) -> Result<(), InsertError> {
        let Some(info) = self.type_info(brick.type_id) else {
            return Err(InsertError::UnknownType(brick.name));
        };
        if brick.size == 0 {
            return Err(InsertError::Empty(brick.name));
        }
        if info.size == 0 || brick.size % info.size != 0 {
            return Err(InsertError::MisalignedSize {
                element_size: info.size,
                name: brick.name,
            });
        }

        if let Some(existing) = self.bricks.iter().find(|existing| existing.overlaps(&brick)) {
            trace!(new = %brick.name, existing = %existing.name, "rejecting overlapping brick");
            return Err(InsertError::Overlap {
                existing: existing.name.clone(),
                new: brick.name,
            });
        }

        let end = brick.end();
        match self.bricks.iter().position(|existing| existing.start >= end) {
            Some(index) => self.bricks.insert(index, brick),
            None => self.bricks.push(brick),
        }

        Ok(())
    }

    /// Inserts `count` consecutive instances of the given `struct` as a single brick.
    pub fn insert_brick_struct(
        &mut self,
        name: &str,
        start: i64,
        count: i32,
        struct_def: StructIndex,
    ) -> bool {
        self.try_insert_brick_struct(name, start, count, struct_def)
            .is_ok()
    }

    /// Inserts `count` consecutive instances of the given `struct` as a single brick.
    pub fn try_insert_brick_struct(
        &mut self,
        name: &str,
        start: i64,
        count: i32,
        struct_def: StructIndex,
    ) -> Result<(), InsertError> {
        let name = BrickName::new(name);
        let (Some(def), Ok(count)) = (self.struct_def(struct_def), u64::try_from(count)) else {
            return Err(InsertError::UnknownType(name));
        };

        let Some(size) = def.size.checked_mul(count) else {
            return Err(InsertError::SizeOverflow(name));
        };

        let brick = Brick {
            name,
            type_id: TypeId::user_struct(struct_def),
            start,
            size,
            color: def.color,
            struct_def: Some(struct_def),
        };

        self.try_insert_brick(brick)
    }

    /// Returns the top level brick that covers the given offset.
    pub fn get_brick(&self, offset: i64) -> Option<&Brick> {
        self.bricks.iter().find(|brick| brick.contains(offset))
    }

    /// Removes the top level brick that covers the given offset.
    pub fn remove_brick_at(&mut self, offset: i64) -> Option<Brick> {
        let index = self.bricks.iter().position(|brick| brick.contains(offset))?;
        Some(self.bricks.remove(index))
    }

    /// Defines a new empty `struct`.
    pub fn new_struct_def(&mut self, name: &str, color: u32) -> StructIndex {
        let index = StructIndex(self.structs.len());
        self.structs.push(BrickStruct {
            name: BrickName::new(name),
            color,
            size: 0,
            members: Vec::new(),
        });
        self.rebuild_type_cache();

        index
    }

    /// Appends a member to a `struct` definition and updates its size.
    ///
    /// The member may only refer to primitives or to `struct`s that were defined before the
    /// one being extended. Returns `false` and leaves the wall unchanged otherwise.
    pub fn append_struct_member(&mut self, index: StructIndex, member: Brick) -> bool {
        let valid_type = match (member.type_id.as_primitive(), member.type_id.as_struct()) {
            (Some(_), _) => true,
            (None, Some(member_struct)) => member_struct < index,
            (None, None) => false,
        };
        let element_size = self.type_info(member.type_id).map(|info| info.size);

        let Some(def) = self.structs.get_mut(index.0) else {
            return false;
        };
        match element_size {
            Some(element_size)
                if valid_type && element_size != 0 && member.size % element_size == 0 => {}
            _ => return false,
        }
        if def.size.checked_add(member.size).is_none() {
            trace!(member = %member.name, "rejecting member that overflows the `struct` size");
            return false;
        }

        def.members.push(member);
        def.compute_size();
        self.rebuild_type_cache();

        true
    }

    /// Rebuilds the type cache from the primitives and the current `struct` definitions.
    fn rebuild_type_cache(&mut self) {
        self.type_cache.clear();
        self.type_cache
            .extend(PrimitiveType::ALL.into_iter().map(|ty| TypeInfo {
                name: SmolStr::new_static(ty.name()),
                size: ty.size(),
            }));
        self.type_cache.extend(self.structs.iter().map(|def| TypeInfo {
            name: SmolStr::new(def.name.as_str()),
            size: def.size,
        }));
    }
}
