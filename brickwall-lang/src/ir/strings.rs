//! Implements the byte arena holding the names referenced by executable nodes.
//!
//! Each string is stored as a little endian `u32` length followed by its UTF-8 bytes.

use std::fmt;

/// The number of bytes of the length prefix.
const LEN_PREFIX: usize = 4;

/// A reference to a string in an [`ExecData`] arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrRef(u32);

impl StrRef {
    /// The byte offset of the string's length prefix.
    pub fn offset(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for StrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Stores the strings referenced by executable nodes.
#[derive(Debug, Default, Clone)]
pub struct ExecData {
    /// The encoded strings.
    bytes: Vec<u8>,
}

impl ExecData {
    /// Creates an empty arena.
    pub fn new() -> ExecData {
        ExecData::default()
    }

    /// Stores `string` and returns a reference to it.
    ///
    /// Returns `None` if the arena would exceed 4 GiB.
    pub fn intern(&mut self, string: &str) -> Option<StrRef> {
        let offset = u32::try_from(self.bytes.len()).ok()?;
        let len = u32::try_from(string.len()).ok()?;
        u32::try_from(self.bytes.len() + LEN_PREFIX + string.len()).ok()?;

        self.bytes.extend_from_slice(&len.to_le_bytes());
        self.bytes.extend_from_slice(string.as_bytes());

        Some(StrRef(offset))
    }

    /// Returns the string behind `string`, or `None` if it does not refer to this arena.
    pub fn get(&self, string: StrRef) -> Option<&str> {
        let start = usize::try_from(string.0).ok()?;
        let prefix = self.bytes.get(start..start.checked_add(LEN_PREFIX)?)?;
        let len = u32::from_le_bytes(prefix.try_into().ok()?);
        let content_start = start + LEN_PREFIX;
        let content = self
            .bytes
            .get(content_start..content_start.checked_add(usize::try_from(len).ok()?)?)?;

        std::str::from_utf8(content).ok()
    }

    /// Returns the string behind `string`.
    ///
    /// # Panics
    /// Panics if `string` was not returned by [`ExecData::intern`] on this arena.
    pub fn resolve(&self, string: StrRef) -> &str {
        self.get(string)
            .expect("string references are only created by interning into this arena")
    }

    /// The number of bytes used by the arena.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if no string was interned.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn strings_are_length_prefixed() {
        let mut data = ExecData::new();
        let a = data.intern("hdr").unwrap();
        let b = data.intern("").unwrap();
        let c = data.intern("größe").unwrap();

        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 7);
        assert_eq!(c.offset(), 11);
        assert_eq!(data.len(), 11 + 4 + "größe".len());

        assert_eq!(data.resolve(a), "hdr");
        assert_eq!(data.resolve(b), "");
        assert_eq!(data.resolve(c), "größe");
    }

    #[test]
    fn foreign_references_are_detected() {
        let mut data = ExecData::new();
        data.intern("abc").unwrap();

        assert_eq!(data.get(StrRef(100)), None);
        assert_eq!(data.get(StrRef(2)), None);
    }
}
