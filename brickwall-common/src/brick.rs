//! Implements bricks, the named byte-range annotations.

use std::{fmt, ops::Range};

use smol_str::SmolStr;

use crate::{StructIndex, TypeId};

/// The maximum length of a brick name in bytes.
pub const MAX_NAME_LEN: usize = 31;

/// The name of a brick or `struct`.
///
/// Names longer than [`MAX_NAME_LEN`] bytes are truncated at the last character boundary
/// that fits.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct BrickName(SmolStr);

impl BrickName {
    /// Creates a new name, truncating it if necessary.
    pub fn new(name: &str) -> BrickName {
        let mut end = std::cmp::min(name.len(), MAX_NAME_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        BrickName(SmolStr::new(&name[..end]))
    }

    /// Returns the name as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BrickName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for BrickName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BrickName {
    fn from(name: &str) -> Self {
        BrickName::new(name)
    }
}

/// A named, typed and colored annotation of a range of bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Brick {
    /// The name of the brick.
    pub name: BrickName,
    /// The type of the elements in the brick.
    pub type_id: TypeId,
    /// The offset of the first byte of the brick.
    ///
    /// For `struct` members this is relative to the start of the `struct`.
    pub start: i64,
    /// The size of the brick in bytes.
    pub size: u64,
    /// The color of the brick as `0xRRGGBB`.
    pub color: u32,
    /// The `struct` definition that the brick is an instance of.
    pub struct_def: Option<StructIndex>,
}

impl Brick {
    /// Creates a brick that is not an instance of a `struct`.
    pub fn new(name: &str, type_id: TypeId, start: i64, size: u64, color: u32) -> Brick {
        Brick {
            name: BrickName::new(name),
            type_id,
            start,
            size,
            color,
            struct_def: None,
        }
    }

    /// The offset one past the last byte of the brick.
    pub fn end(&self) -> i64 {
        self.start.saturating_add(i64::try_from(self.size).unwrap_or(i64::MAX))
    }

    /// The range of bytes covered by the brick.
    pub fn range(&self) -> Range<i64> {
        self.start..self.end()
    }

    /// Returns `true` if the brick covers the given offset.
    pub fn contains(&self, offset: i64) -> bool {
        self.range().contains(&offset)
    }

    /// Returns `true` if the byte ranges of both bricks intersect.
    pub fn overlaps(&self, other: &Brick) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrimitiveType;

    #[test]
    fn long_names_are_truncated() {
        let name = BrickName::new(&"x".repeat(40));
        assert_eq!(name.as_str().len(), MAX_NAME_LEN);

        // 'ä' takes two bytes, so the cut must not split it
        let name = BrickName::new(&format!("{}ä", "y".repeat(30)));
        assert_eq!(name.as_str(), "y".repeat(30));
    }

    #[test]
    fn adjacent_bricks_do_not_overlap() {
        let ty = TypeId::primitive(PrimitiveType::UInt8);
        let a = Brick::new("a", ty, 0, 4, 0);
        let b = Brick::new("b", ty, 4, 4, 0);
        let c = Brick::new("c", ty, 3, 2, 0);

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
        assert!(a.contains(3));
        assert!(!a.contains(4));
    }
}
