//! A multithreaded memory allocator.

use crate::allocators::raw_malloc::{BlockInfo, RawMalloc};
use crate::stores::Store;

use core::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A multithreaded memory allocator.
///
/// This allocator is just a `Mutex` wrapper over [`RawMalloc`] to allow for multithreading.
/// Every entry point holds the lock from start to finish, so concurrent calls behave as if
/// they ran one after the other in the order they acquired it.
#[derive(Debug)]
pub struct BrkMalloc<S: Store> {
    inner: Mutex<RawMalloc<S>>,
}

impl<S: Store> BrkMalloc<S> {
    /// # Safety
    /// Callers must make sure that the provided store will be the only object
    /// managing it's underlying region for the lifetime of the returned allocator.
    pub const unsafe fn with_store(store: S) -> Self {
        BrkMalloc {
            inner: Mutex::new(unsafe { RawMalloc::with_store(store) }),
        }
    }

    /// Waits for the allocator's lock.
    ///
    /// The allocator's state can't be left half-updated by a panicking holder, so a poisoned
    /// lock is taken over as is.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, RawMalloc<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// See [`RawMalloc::allocate`].
    pub fn allocate(&self, size: usize) -> *mut u8 {
        self.lock().allocate(size)
    }

    /// See [`RawMalloc::deallocate`].
    ///
    /// # Safety
    /// `ptr` must be null or a live pointer returned by this allocator
    /// that hasn't been freed since.
    pub unsafe fn deallocate(&self, ptr: *mut u8) {
        unsafe { self.lock().deallocate(ptr) }
    }

    /// See [`RawMalloc::zero_allocate`].
    pub fn zero_allocate(&self, count: usize, elem_size: usize) -> *mut u8 {
        self.lock().zero_allocate(count, elem_size)
    }

    /// See [`RawMalloc::reallocate`]. The whole resize, including any copy, happens under a
    /// single acquisition of the lock.
    ///
    /// # Safety
    /// `ptr` must be null or a live pointer returned by this allocator
    /// that hasn't been freed since.
    pub unsafe fn reallocate(&self, ptr: *mut u8, new_size: usize) -> *mut u8 {
        unsafe { self.lock().reallocate(ptr, new_size) }
    }

    pub fn break_offset(&self) -> usize {
        self.lock().break_offset()
    }

    pub fn block_count(&self) -> usize {
        self.lock().block_count()
    }

    pub fn blocks(&self) -> Vec<BlockInfo> {
        self.lock().blocks()
    }

    /// # Safety
    /// `ptr` must be a live pointer returned by this allocator.
    pub unsafe fn block_size(&self, ptr: NonNull<u8>) -> usize {
        unsafe { self.lock().block_size(ptr) }
    }
}
