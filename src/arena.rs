//! The [`Arena`]: a fixed-capacity store plus a movable break.

use crate::error::AllocError;
use crate::stores::Store;

use core::ptr::NonNull;

use tracing::debug;

/// Default capacity of the process heap, 1 GiB.
pub const ARENA_CAPACITY: usize = 1024 * 1024 * 1024;

/// A simulated program break over a [`Store`].
///
/// Bytes in `[0, break_offset)` have been handed out, bytes in
/// `[break_offset, capacity)` are still available. The break only moves
/// through [`extend`](Arena::extend) and never leaves `[0, capacity]`.
/// Memory is neither zeroed when granted nor scrubbed when given back.
#[derive(Debug)]
pub struct Arena<S: Store> {
    store: S,
    break_offset: usize,
}

impl<S: Store> Arena<S> {
    /// Creates an arena with the break at offset zero.
    ///
    /// # Safety
    /// Callers must make sure that the arena will be the only object
    /// managing the store's region for the lifetime of the arena.
    #[inline(always)]
    pub const unsafe fn new(store: S) -> Self {
        Arena {
            store,
            break_offset: 0,
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    #[inline(always)]
    pub fn break_offset(&self) -> usize {
        self.break_offset
    }

    /// Moves the break by `increment` bytes and returns where it was before.
    ///
    /// Fails with [`AllocError::OutOfMemory`] if the break would end up outside
    /// `[0, capacity]`, or if growing and the store can't provide its memory.
    /// On failure the break does not move.
    pub fn extend(&mut self, increment: isize) -> Result<usize, AllocError> {
        let old = self.break_offset;
        let new = old
            .checked_add_signed(increment)
            .filter(|&new| new <= self.capacity())
            .ok_or(AllocError::OutOfMemory)?;
        if increment > 0 {
            unsafe { self.store.base()? };
        }
        self.break_offset = new;
        if increment != 0 {
            debug!(old, new, "Moved break.");
        }
        Ok(old)
    }

    /// Returns the break without moving it.
    #[inline]
    pub fn current_break(&mut self) -> Result<usize, AllocError> {
        self.extend(0)
    }

    /// Moves the break back by `size` bytes, returning where it was before.
    pub fn retract(&mut self, size: usize) -> Result<usize, AllocError> {
        let decrement = isize::try_from(size).map_err(|_| AllocError::OutOfMemory)?;
        self.extend(-decrement)
    }

    /// Returns a pointer to the byte at `offset` within the store.
    #[inline]
    pub fn ptr_at(&mut self, offset: usize) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(offset <= self.capacity());
        let base = unsafe { self.store.base()? };
        Ok(unsafe { base.add(offset) })
    }

    /// Returns the offset of `ptr` within the store.
    ///
    /// # Safety
    /// `ptr` must point into the store's region (or one past its end).
    #[inline]
    pub unsafe fn offset_of(&mut self, ptr: NonNull<u8>) -> Result<usize, AllocError> {
        let base = unsafe { self.store.base()? };
        debug_assert!(ptr >= base);
        Ok(ptr.as_ptr() as usize - base.as_ptr() as usize)
    }
}
