//! The process heap: one [`BrkMalloc`] shared by the whole process.
//!
//! The heap's arena is a [`MmapStore`] of [`ARENA_CAPACITY`] bytes, reserved on first
//! use and kept until the process exits. The free functions here forward to [`HEAP`].

use crate::allocators::BrkMalloc;
use crate::arena::ARENA_CAPACITY;
use crate::stores::MmapStore;

/// The process heap.
pub static HEAP: BrkMalloc<MmapStore> =
    unsafe { BrkMalloc::with_store(MmapStore::new(ARENA_CAPACITY)) };

/// Allocates `size` bytes from the process heap. Returns null if `size` is zero or
/// the heap is exhausted.
#[inline]
pub fn allocate(size: usize) -> *mut u8 {
    HEAP.allocate(size)
}

/// Frees an allocation of the process heap.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by this module's functions.
#[inline]
pub unsafe fn deallocate(ptr: *mut u8) {
    unsafe { HEAP.deallocate(ptr) }
}

/// Allocates `count * elem_size` zeroed bytes from the process heap.
#[inline]
pub fn zero_allocate(count: usize, elem_size: usize) -> *mut u8 {
    HEAP.zero_allocate(count, elem_size)
}

/// Resizes an allocation of the process heap.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by this module's functions.
#[inline]
pub unsafe fn reallocate(ptr: *mut u8, new_size: usize) -> *mut u8 {
    unsafe { HEAP.reallocate(ptr, new_size) }
}
