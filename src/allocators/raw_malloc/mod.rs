//! A singlethreaded memory allocator.
//!
// For a general view of the allocator's operational semantics see the [`crate`] level documentation.
//
// # Additional implementation notes
// ## Offsets and pointers
// The arena thinks in offsets from the start of its store, blocks and callers think in pointers.
// The two only meet in `grow_and_place`, which turns a granted offset into a block,
// and in `__free`, which compares a block's end against the break.
//
// ## Internal paths
// `__alloc`, `__free`, `__calloc` and `__realloc` carry the whole policy and report failures as
// `AllocError`. The public methods only translate between `Result` and null pointers, so
// `__realloc` can reuse `__alloc` and `__free` without going through another entry point.

use crate::arena::Arena;
use crate::error::AllocError;
use crate::header::{Block, HEADER_SIZE};
use crate::registry::Registry;
use crate::stores::Store;

use core::ptr::{copy_nonoverlapping, null_mut, write_bytes, NonNull};

use tracing::{debug, error, instrument, Level};

/// A block as seen from outside the allocator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Offset of the block's header within the arena.
    pub offset: usize,
    /// Payload size.
    pub size: usize,
    pub is_free: bool,
}

/// A single threaded memory allocator.
#[derive(Debug)]
pub struct RawMalloc<S: Store> {
    registry: Registry,
    arena: Arena<S>,
}

// Blocks are only reachable through the allocator, so it can move between threads
// together with its store.
unsafe impl<S: Store + Send> Send for RawMalloc<S> {}

impl<S: Store> RawMalloc<S> {
    /// Creates an allocator instance over the specified store.
    ///
    /// # Safety
    /// Callers must make sure that the provided store will be the only object
    /// managing it's underlying region for the lifetime of the returned allocator.
    pub const unsafe fn with_store(store: S) -> Self {
        RawMalloc {
            registry: Registry::new(),
            arena: unsafe { Arena::new(store) },
        }
    }
}

impl<S: Store> RawMalloc<S> {
    #[instrument(level = "info", skip(self), ret(level = Level::INFO), err(level = Level::DEBUG))]
    fn __alloc(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }

        if let Some(block) = unsafe { self.registry.find_free(size) } {
            debug!(
                block_start = ?block.start(),
                block_size = unsafe { block.size() },
                "Found free block to accomodate object."
            );
            unsafe { block.set_free(false) };
            return Ok(block.payload());
        }

        debug!("Couldn't find free block to accomodate object, requesting arena growth.");
        self.grow_and_place(size)
    }

    /// Grows the arena for a block with a `size`-byte payload, writes the block's header
    /// at the start of the granted region and appends the block to the registry.
    /// Returns a pointer to the payload or `Err(AllocError::OutOfMemory)` if the arena can't grow.
    #[instrument(level = "debug", skip(self), ret(level = Level::DEBUG), err(level = Level::ERROR))]
    fn grow_and_place(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let growth_amount = HEADER_SIZE
            .checked_add(size)
            .and_then(|total| isize::try_from(total).ok())
            .ok_or(AllocError::OutOfMemory)
            .inspect_err(|_| error!("Growth failure, object is too big."))?;

        let block_offset = self
            .arena
            .extend(growth_amount)
            .inspect_err(|_| error!(growth_amount, "Growth failure, arena exhausted."))?;
        let block_start = self.arena.ptr_at(block_offset)?;

        let block = unsafe { Block::create(block_start, size) };
        unsafe { self.registry.append(block) };
        debug!(block_offset, ?block_start, "Created a new block.");
        Ok(block.payload())
    }

    /// Frees the block owning `obj_start`.
    ///
    /// If the block ends exactly at the break it is unlinked and its space handed back to
    /// the arena, otherwise it's only marked free.
    ///
    /// # Safety
    /// This function is unsafe since it assumes that `obj_start` is the payload of a live,
    /// occupied block of this allocator.
    #[instrument(level = "info", skip(self), err(level = Level::ERROR))]
    unsafe fn __free(&mut self, obj_start: NonNull<u8>) -> Result<(), AllocError> {
        let block = unsafe { Block::from_payload(obj_start) };
        let block_size = unsafe { block.size() };
        debug_assert!(unsafe { !block.is_free() }, "Block shouldn't be free already.");

        let program_break = self.arena.current_break()?;
        let block_end = unsafe { self.arena.offset_of(block.end())? };

        if block_end != program_break {
            debug!(block_end, program_break, "Block isn't at the break, marking it free.");
            unsafe { block.set_free(true) };
            return Ok(());
        }

        debug_assert_eq!(
            self.registry.tail(),
            Some(block),
            "A block ending at the break should be the registry's tail."
        );
        unsafe { self.registry.remove_tail() };
        self.arena.retract(HEADER_SIZE + block_size)?;
        debug!(
            new_break = self.arena.break_offset(),
            "Block was at the break, handed its space back to the arena."
        );
        Ok(())
    }

    #[instrument(level = "info", skip(self), ret(level = Level::INFO), err(level = Level::DEBUG))]
    fn __calloc(&mut self, count: usize, elem_size: usize) -> Result<NonNull<u8>, AllocError> {
        if count == 0 || elem_size == 0 {
            return Err(AllocError::ZeroSize);
        }
        let size = count.checked_mul(elem_size).ok_or(AllocError::Overflow)?;

        let obj_start = self.__alloc(size)?;
        unsafe { write_bytes(obj_start.as_ptr(), 0, size) };
        Ok(obj_start)
    }

    /// # Safety
    /// This function is unsafe since it assumes that `obj_start`, if present, is the payload
    /// of a live, occupied block of this allocator.
    #[instrument(level = "info", skip(self), ret(level = Level::INFO), err(level = Level::DEBUG))]
    unsafe fn __realloc(
        &mut self,
        obj_start: Option<NonNull<u8>>,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let obj_start = match obj_start {
            Some(p) if new_size != 0 => p,
            // A zero `new_size` allocates (and so fails) rather than frees.
            _ => return self.__alloc(new_size),
        };

        let obj_size = unsafe { Block::from_payload(obj_start).size() };
        if obj_size >= new_size {
            debug!(obj_size, "Block is already large enough.");
            return Ok(obj_start);
        }

        debug!(obj_size, "Block is too small, moving object to a new block.");
        let new_obj_start = self.__alloc(new_size)?;
        unsafe {
            copy_nonoverlapping(obj_start.as_ptr(), new_obj_start.as_ptr(), obj_size);
            self.__free(obj_start)?;
        }
        Ok(new_obj_start)
    }
}

impl<S: Store> RawMalloc<S> {
    /// Returns a pointer to at least `size` uninitialized bytes,
    /// or null if `size` is zero or the arena is exhausted.
    pub fn allocate(&mut self, size: usize) -> *mut u8 {
        self.__alloc(size).map_or(null_mut(), |p| p.as_ptr())
    }

    /// Frees an allocation. Freeing null is a no-op.
    ///
    /// # Safety
    /// `ptr` must be null or a live pointer returned by this allocator
    /// that hasn't been freed since.
    pub unsafe fn deallocate(&mut self, ptr: *mut u8) {
        if let Some(obj_start) = NonNull::new(ptr) {
            let _ = unsafe { self.__free(obj_start) };
        }
    }

    /// Returns a pointer to `count * elem_size` zeroed bytes, or null if either operand is zero,
    /// their product overflows, or the arena is exhausted.
    pub fn zero_allocate(&mut self, count: usize, elem_size: usize) -> *mut u8 {
        self.__calloc(count, elem_size).map_or(null_mut(), |p| p.as_ptr())
    }

    /// Resizes an allocation, moving it if its block is too small.
    ///
    /// A null `ptr` or zero `new_size` behaves exactly like [`allocate`](RawMalloc::allocate)
    /// with `new_size`. Note this means `reallocate(p, 0)` returns null and leaves `p` allocated.
    /// If the object has to move and the arena is exhausted null is returned and `ptr`
    /// stays valid.
    ///
    /// # Safety
    /// `ptr` must be null or a live pointer returned by this allocator
    /// that hasn't been freed since.
    pub unsafe fn reallocate(&mut self, ptr: *mut u8, new_size: usize) -> *mut u8 {
        unsafe { self.__realloc(NonNull::new(ptr), new_size) }
            .map_or(null_mut(), |p| p.as_ptr())
    }

    /// Returns the arena's break offset.
    #[inline]
    pub fn break_offset(&self) -> usize {
        self.arena.break_offset()
    }

    /// Returns the number of blocks currently in the registry, free or not.
    pub fn block_count(&self) -> usize {
        unsafe { self.registry.iter() }.count()
    }

    /// Returns a snapshot of every block in the registry, in creation order.
    pub fn blocks(&mut self) -> Vec<BlockInfo> {
        let mut infos = vec![];
        for block in unsafe { self.registry.iter() } {
            let Ok(offset) = (unsafe { self.arena.offset_of(block.start()) }) else {
                break;
            };
            let header = unsafe { block.header() };
            infos.push(BlockInfo {
                offset,
                size: header.size,
                is_free: header.is_free,
            });
        }
        infos
    }

    /// Returns the recorded payload size of the allocation at `ptr`.
    ///
    /// # Safety
    /// `ptr` must be a live pointer returned by this allocator.
    pub unsafe fn block_size(&self, ptr: NonNull<u8>) -> usize {
        unsafe { Block::from_payload(ptr).size() }
    }
}

#[cfg(test)]
mod tests;
