//! Implements the node arena used for AST and executable nodes.
//!
//! The arena hands out [`Idx`] handles instead of references. Storage is split into a fixed
//! first block followed by overflow blocks that double in capacity. A block is never grown
//! past the capacity it was created with, so nodes never move once allocated.

use std::{fmt, hash, marker::PhantomData, ops};

/// The number of nodes in the first block.
const FIRST_BLOCK_CAPACITY: usize = 64;

/// A handle to a node in a [`NodeArena`].
pub struct Idx<T> {
    /// The position of the node in allocation order.
    raw: u32,
    /// Ties the handle to the node type.
    _marker: PhantomData<fn() -> T>,
}

impl<T> Idx<T> {
    /// The raw allocation index of the handle.
    pub fn raw(self) -> u32 {
        self.raw
    }
}

impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Idx<T> {}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Idx<T> {}

impl<T> hash::Hash for Idx<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.raw)
    }
}

/// A growable store of nodes with stable handles.
pub struct NodeArena<T> {
    /// The blocks holding the nodes, each one twice as large as the previous one.
    blocks: Vec<Vec<T>>,
    /// The total number of allocated nodes.
    len: usize,
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        NodeArena::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeArena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> NodeArena<T> {
    /// Creates an empty arena.
    pub fn new() -> NodeArena<T> {
        NodeArena {
            blocks: vec![Vec::with_capacity(FIRST_BLOCK_CAPACITY)],
            len: 0,
        }
    }

    /// The capacity the block with the given index was created with.
    fn block_capacity(block: usize) -> usize {
        FIRST_BLOCK_CAPACITY << block
    }

    /// Splits a raw index into the block index and the offset in that block.
    fn locate(raw: usize) -> (usize, usize) {
        let blocks_needed = raw / FIRST_BLOCK_CAPACITY + 1;
        let block = (usize::BITS - 1 - blocks_needed.leading_zeros()) as usize;
        let preceding = FIRST_BLOCK_CAPACITY * ((1 << block) - 1);

        (block, raw - preceding)
    }

    /// Allocates a node, returning its handle.
    pub fn alloc(&mut self, node: T) -> Idx<T> {
        let raw = u32::try_from(self.len).expect("arena holds at most `u32::MAX` nodes");
        let (block, _) = Self::locate(self.len);

        if block == self.blocks.len() {
            self.blocks
                .push(Vec::with_capacity(Self::block_capacity(block)));
        }
        self.blocks[block].push(node);
        self.len += 1;

        Idx {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the node for the given handle.
    pub fn get(&self, idx: Idx<T>) -> Option<&T> {
        let raw = usize::try_from(idx.raw).ok()?;
        if raw >= self.len {
            return None;
        }
        let (block, offset) = Self::locate(raw);

        self.blocks.get(block)?.get(offset)
    }

    /// Returns the node for the given handle mutably.
    pub fn get_mut(&mut self, idx: Idx<T>) -> Option<&mut T> {
        let raw = usize::try_from(idx.raw).ok()?;
        if raw >= self.len {
            return None;
        }
        let (block, offset) = Self::locate(raw);

        self.blocks.get_mut(block)?.get_mut(offset)
    }

    /// The number of allocated nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no nodes are allocated.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes all nodes, invalidating every handle issued so far.
    ///
    /// The first block keeps its allocation.
    pub fn clear(&mut self) {
        self.blocks.truncate(1);
        self.blocks[0].clear();
        self.len = 0;
    }

    /// Iterates over all nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.blocks.iter().flatten()
    }
}

impl<T> ops::Index<Idx<T>> for NodeArena<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, idx: Idx<T>) -> &T {
        self.get(idx).expect("handle belongs to this arena")
    }
}

impl<T> ops::IndexMut<Idx<T>> for NodeArena<T> {
    #[track_caller]
    fn index_mut(&mut self, idx: Idx<T>) -> &mut T {
        self.get_mut(idx).expect("handle belongs to this arena")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_maps_into_doubling_blocks() {
        assert_eq!(NodeArena::<u8>::locate(0), (0, 0));
        assert_eq!(NodeArena::<u8>::locate(63), (0, 63));
        assert_eq!(NodeArena::<u8>::locate(64), (1, 0));
        assert_eq!(NodeArena::<u8>::locate(191), (1, 127));
        assert_eq!(NodeArena::<u8>::locate(192), (2, 0));
        assert_eq!(NodeArena::<u8>::locate(447), (2, 255));
        assert_eq!(NodeArena::<u8>::locate(448), (3, 0));
    }

    #[test]
    fn handles_survive_growth() {
        let mut arena = NodeArena::new();
        let first = arena.alloc(String::from("first"));
        let first_ptr = arena[first].as_ptr();

        let handles: Vec<_> = (0..1000).map(|i| arena.alloc(i.to_string())).collect();

        assert_eq!(arena[first], "first");
        assert_eq!(arena[first].as_ptr(), first_ptr);
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(arena[handle], i.to_string());
        }
        assert_eq!(arena.len(), 1001);
        assert_eq!(arena.iter().count(), 1001);
    }

    #[test]
    fn blocks_never_reallocate() {
        let mut arena = NodeArena::new();
        arena.alloc(0u32);
        let first_block = arena.blocks[0].as_ptr();

        for i in 1..500u32 {
            arena.alloc(i);
        }

        assert_eq!(arena.blocks[0].as_ptr(), first_block);
        assert_eq!(arena.blocks.len(), 4);
        for (index, block) in arena.blocks.iter().enumerate() {
            assert!(block.len() <= NodeArena::<u32>::block_capacity(index));
        }
    }

    #[test]
    fn clear_invalidates_handles() {
        let mut arena = NodeArena::new();
        let handles: Vec<_> = (0..100).map(|i| arena.alloc(i)).collect();

        arena.clear();

        assert!(arena.is_empty());
        assert!(arena.get(handles[0]).is_none());
        let fresh = arena.alloc(7);
        assert_eq!(fresh, handles[0]);
        assert_eq!(arena[fresh], 7);
    }
}
