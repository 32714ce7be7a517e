//! Defines the [`Header`] struct, the [`Block`] handle and associated constants.

use core::mem::size_of;
use core::ptr::{addr_of, addr_of_mut, NonNull};

use static_assertions::const_assert_eq;

pub const HEADER_SIZE: usize = size_of::<Header>();

// Two pointer-sized fields plus a padded flag.
const_assert_eq!(HEADER_SIZE, 3 * size_of::<usize>());
const_assert_eq!(size_of::<Option<Block>>(), size_of::<usize>());

/// Metadata stored right in front of every block's payload.
///
/// Blocks are laid out back to back with no padding, so a header can sit at
/// any address. Headers are therefore never referenced, only copied in and out
/// with unaligned reads and writes through a [`Block`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct Header {
    /// Size of the payload. Fixed when the block is created.
    pub size: usize,
    pub is_free: bool,
    /// The block created right after this one, if it is still around.
    pub next: Option<Block>,
}

/// A handle to a block living in the arena.
///
/// The handle points at the block's header, the payload starts
/// [`HEADER_SIZE`] bytes later.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Block(NonNull<Header>);

impl Block {
    /// Writes a fresh in-use header with payload size `size` at `start`.
    ///
    /// # Safety
    /// `start` must be valid for writes of `HEADER_SIZE + size` bytes
    /// and must not overlap any live block.
    #[inline]
    pub unsafe fn create(start: NonNull<u8>, size: usize) -> Block {
        let block = Block(start.cast());
        unsafe {
            block.0.as_ptr().write_unaligned(Header {
                size,
                is_free: false,
                next: None,
            })
        };
        block
    }

    /// Recovers the block owning the payload at `payload`.
    ///
    /// # Safety
    /// `payload` must have been produced by [`Block::payload`].
    #[inline(always)]
    pub unsafe fn from_payload(payload: NonNull<u8>) -> Block {
        Block(unsafe { NonNull::new_unchecked(payload.as_ptr().sub(HEADER_SIZE)) }.cast())
    }

    #[inline(always)]
    pub fn start(self) -> NonNull<u8> {
        self.0.cast()
    }

    #[inline(always)]
    pub fn payload(self) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(self.start().as_ptr().add(HEADER_SIZE)) }
    }

    /// Returns a copy of the block's header.
    ///
    /// # Safety
    /// The block must be live, i.e. its header must still be in the arena.
    #[inline(always)]
    pub unsafe fn header(self) -> Header {
        unsafe { self.0.as_ptr().read_unaligned() }
    }

    /// # Safety
    /// See [`header`](Block::header).
    #[inline(always)]
    pub unsafe fn size(self) -> usize {
        unsafe { addr_of!((*self.0.as_ptr()).size).read_unaligned() }
    }

    /// # Safety
    /// See [`header`](Block::header).
    #[inline(always)]
    pub unsafe fn is_free(self) -> bool {
        unsafe { addr_of!((*self.0.as_ptr()).is_free).read_unaligned() }
    }

    /// # Safety
    /// See [`header`](Block::header).
    #[inline(always)]
    pub unsafe fn next(self) -> Option<Block> {
        unsafe { addr_of!((*self.0.as_ptr()).next).read_unaligned() }
    }

    /// # Safety
    /// See [`header`](Block::header).
    #[inline(always)]
    pub unsafe fn set_free(self, is_free: bool) {
        unsafe { addr_of_mut!((*self.0.as_ptr()).is_free).write_unaligned(is_free) }
    }

    /// # Safety
    /// See [`header`](Block::header).
    #[inline(always)]
    pub unsafe fn set_next(self, next: Option<Block>) {
        unsafe { addr_of_mut!((*self.0.as_ptr()).next).write_unaligned(next) }
    }

    /// Returns a pointer one past the end of the payload.
    ///
    /// # Safety
    /// See [`header`](Block::header).
    #[inline(always)]
    pub unsafe fn end(self) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(self.payload().as_ptr().add(self.size())) }
    }
}
