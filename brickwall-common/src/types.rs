//! Implements type ids that refer to primitives or user defined `struct`s.

use std::fmt;

use smol_str::SmolStr;

use crate::{PrimitiveType, StructIndex};

/// The first type id used for user defined `struct`s.
pub const USER_STRUCT_BASE: u32 = 0x100;

/// Identifies the type of a brick.
///
/// Ids below [`USER_STRUCT_BASE`] are primitive types, the others index into the list of
/// `struct` definitions of a [`BrickWall`](crate::BrickWall).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    /// The type id of the given primitive type.
    pub fn primitive(ty: PrimitiveType) -> TypeId {
        TypeId(ty as u32)
    }

    /// The type id of the `struct` at the given index.
    pub fn user_struct(index: StructIndex) -> TypeId {
        let index = u32::try_from(index.raw()).expect("number of `struct`s fits a `u32`");
        TypeId(USER_STRUCT_BASE + index)
    }

    /// Creates a type id from its raw value.
    pub fn from_raw(raw: u32) -> TypeId {
        TypeId(raw)
    }

    /// The raw value of the type id.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Returns the primitive type if this id refers to one.
    pub fn as_primitive(self) -> Option<PrimitiveType> {
        PrimitiveType::try_from(self.0).ok()
    }

    /// Returns the `struct` index if this id refers to a user defined `struct`.
    pub fn as_struct(self) -> Option<StructIndex> {
        let offset = self.0.checked_sub(USER_STRUCT_BASE)?;
        Some(StructIndex::from_raw(usize::try_from(offset).ok()?))
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.as_primitive(), self.as_struct()) {
            (Some(primitive), _) => write!(f, "{primitive}"),
            (None, Some(index)) => write!(f, "struct#{}", index.raw()),
            (None, None) => write!(f, "invalid#{}", self.0),
        }
    }
}

/// An entry of the type cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// The name of the type.
    pub name: SmolStr,
    /// The size of a single element of the type in bytes.
    pub size: u64,
}
