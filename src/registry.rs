//! Defines the [`Registry`], the chain of every block the allocator has created.

use crate::header::Block;

/// A singly-linked chain of blocks in creation order.
///
/// The chain is embedded in the block headers themselves; the registry only
/// keeps its two ends. Since blocks are carved out of the arena one after the
/// other, creation order is also address order. Free and occupied blocks share
/// the same chain.
#[derive(Debug)]
pub struct Registry {
    head: Option<Block>,
    tail: Option<Block>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    pub const fn new() -> Self {
        Registry {
            head: None,
            tail: None,
        }
    }

    #[inline]
    pub fn tail(&self) -> Option<Block> {
        self.tail
    }

    /// Returns the first free block, in creation order, that holds at least `size` bytes.
    /// This operation has a time complexity of *O*(n) where n is the number of blocks.
    ///
    /// # Safety
    /// Every block in the chain must be live.
    pub unsafe fn find_free(&self, size: usize) -> Option<Block> {
        unsafe { self.iter() }.find(|&block| unsafe { block.is_free() && block.size() >= size })
    }

    /// Links `block` after the current tail and makes it the new tail.
    /// This operation has a time complexity of *O*(1).
    ///
    /// # Safety
    /// `block` must be live, not already in the chain, and have no `next` link.
    pub unsafe fn append(&mut self, block: Block) {
        debug_assert_eq!(unsafe { block.next() }, None);
        match self.tail {
            Some(tail) => unsafe { tail.set_next(Some(block)) },
            None => self.head = Some(block),
        }
        self.tail = Some(block);
    }

    /// Unlinks the tail and returns it, or `None` if the registry is empty.
    /// The block before the old tail becomes the new tail.
    /// This operation has a time complexity of *O*(n) since the chain is only linked forwards.
    ///
    /// # Safety
    /// Every block in the chain must be live.
    pub unsafe fn remove_tail(&mut self) -> Option<Block> {
        let tail = self.tail?;
        if self.head == Some(tail) {
            self.head = None;
            self.tail = None;
            return Some(tail);
        }

        let before = unsafe { self.iter() }.find(|&block| unsafe { block.next() } == Some(tail));
        debug_assert!(before.is_some(), "The tail should be reachable from the head.");
        if let Some(before) = before {
            unsafe { before.set_next(None) };
            self.tail = Some(before);
        }
        Some(tail)
    }

    /// Returns an iterator over the chain, head first.
    ///
    /// # Safety
    /// Every block in the chain must be live while the iterator is used.
    #[inline]
    pub unsafe fn iter(&self) -> Blocks<'_> {
        Blocks {
            next: self.head,
            _registry: core::marker::PhantomData,
        }
    }
}

/// Iterator over the blocks of a [`Registry`].
pub struct Blocks<'a> {
    next: Option<Block>,
    _registry: core::marker::PhantomData<&'a Registry>,
}

impl Iterator for Blocks<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let block = self.next?;
        self.next = unsafe { block.next() };
        Some(block)
    }
}
