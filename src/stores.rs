//! [`Store`] trait and structures that implement it.
//!
//! A store is the fixed-capacity byte region an [`Arena`](crate::arena::Arena)
//! hands out. The arena only ever asks a store for two things: where its
//! memory starts and how many bytes it holds.

use crate::error::AllocError;

use core::ptr::{null_mut, NonNull};

use tracing::{debug, error};

/// A trait for types that own or reference a contiguous, fixed-capacity byte region.
///
/// # Safety
/// * Once [`base`](Store::base) succeeds it must keep returning the same pointer,
///   and the `capacity()` bytes starting there must stay readable and writable
///   for as long as the store is alive.
/// * Moving the store must not move the region. Stores should reference
///   their memory rather than hold it inline.
pub unsafe trait Store {
    /// Returns the start of the region, setting it up first if needed.
    ///
    /// # Safety
    /// Callers must be the only party managing the region.
    unsafe fn base(&mut self) -> Result<NonNull<u8>, AllocError>;

    /// Returns the size of the region in bytes.
    fn capacity(&self) -> usize;
}

/// A store over a caller-provided buffer.
#[derive(Debug)]
pub struct BufStore {
    buf: *mut u8,
    len: usize,
}

impl BufStore {
    /// Creates a store over the `len` bytes starting at `buf`.
    ///
    /// A null `buf` yields a store whose [`base`](Store::base) always fails.
    pub const fn new(buf: *mut u8, len: usize) -> Self {
        BufStore { buf, len }
    }
}

// The buffer is only reachable through the store, see `BufStore::new`.
unsafe impl Send for BufStore {}

unsafe impl Store for BufStore {
    unsafe fn base(&mut self) -> Result<NonNull<u8>, AllocError> {
        NonNull::new(self.buf).ok_or(AllocError::OutOfMemory)
    }

    #[inline(always)]
    fn capacity(&self) -> usize {
        self.len
    }
}

/// A store backed by a private anonymous memory mapping.
///
/// The mapping is reserved lazily on the first call to [`base`](Store::base)
/// with `MAP_NORESERVE`, so a large capacity only costs address space until
/// pages are touched. It is unmapped when the store is dropped.
#[derive(Debug)]
pub struct MmapStore {
    base: Option<NonNull<u8>>,
    capacity: usize,
}

impl MmapStore {
    #[inline(always)]
    pub const fn new(capacity: usize) -> Self {
        MmapStore { base: None, capacity }
    }

    /// Maps `capacity` bytes and remembers where they start.
    ///
    /// # Safety
    /// This function assumes the store was not initialized before.
    unsafe fn try_init(&mut self) -> Result<NonNull<u8>, AllocError> {
        debug_assert!(self.base.is_none());
        let p = unsafe {
            libc::mmap(
                null_mut(),
                self.capacity,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | libc::MAP_NORESERVE,
                -1,
                0,
            )
        };
        if p == libc::MAP_FAILED {
            error!(capacity = self.capacity, "Couldn't map arena store.");
            return Err(AllocError::OutOfMemory);
        }
        let base = NonNull::new(p.cast::<u8>()).ok_or(AllocError::OutOfMemory)?;
        debug!(?base, capacity = self.capacity, "Mapped arena store.");
        self.base = Some(base);
        Ok(base)
    }
}

// The mapping is private to the store.
unsafe impl Send for MmapStore {}

unsafe impl Store for MmapStore {
    unsafe fn base(&mut self) -> Result<NonNull<u8>, AllocError> {
        match self.base {
            Some(base) => Ok(base),
            None => unsafe { self.try_init() },
        }
    }

    #[inline(always)]
    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for MmapStore {
    fn drop(&mut self) {
        if let Some(base) = self.base.take() {
            unsafe { libc::munmap(base.as_ptr().cast(), self.capacity) };
        }
    }
}

unsafe impl<T: Store + ?Sized> Store for &mut T {
    unsafe fn base(&mut self) -> Result<NonNull<u8>, AllocError> {
        (**self).base()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }
}
