//! A simple, multithreaded, break-based memory allocator.
//!
//! The allocator hands out memory from a single fixed-capacity arena whose used part
//! grows and shrinks at one end, just like a process heap managed with `sbrk`.
//! It implements the four classic entry points: allocate, free, zero-allocate and resize.
//!
//! # Usage
//! ```
//! use brk_malloc::global;
//!
//! let p = global::zero_allocate(10, 4);
//! assert!(!p.is_null());
//! unsafe {
//!     *p = 42;
//!     let q = global::reallocate(p, 80);
//!     assert_eq!(*q, 42);
//!     global::deallocate(q);
//! }
//! ```
//!
//! Allocators over your own memory are built from a [`Store`]:
//! ```
//! use brk_malloc::BrkMalloc;
//! use brk_malloc::stores::BufStore;
//!
//! let mut buf = vec![0_u8; 4096];
//! let heap = unsafe { BrkMalloc::with_store(BufStore::new(buf.as_mut_ptr(), buf.len())) };
//! let p = heap.allocate(100);
//! assert!(!p.is_null());
//! unsafe { heap.deallocate(p) };
//! assert_eq!(heap.break_offset(), 0);
//! ```
//!
//! # Allocators
//! Two allocators are exported by this crate - [`RawMalloc`] and [`BrkMalloc`].
//! Use [`RawMalloc`] if you own the allocator from a single thread,
//! [`BrkMalloc`] is just a `Mutex` wrapper over it to allow for multithreading.
//! A process-wide [`BrkMalloc`] lives in [`global::HEAP`].
//!
//! # Mode of operation
//! ## Blocks
//! Every allocation is a block: a [header](#headers) immediately followed by the payload
//! handed to the caller. Blocks are carved out of the arena back to back, in the order they
//! are created, without any padding. Payloads have no alignment guarantee.
//!
//! ## Headers
//! A header records the payload size, whether the block is free, and a link to the block
//! created after it. The size never changes once the block exists.
//!
//! ## Registry
//! The links form the registry, a chain of every block still in the arena, free or not,
//! in creation (and address) order.
//!
//! ## Allocation
//! The registry is scanned from the start and the first free block that is large enough is
//! reused as a whole, it is never split. If there is none the arena's break is pushed forward
//! by a header plus the requested size and a new block is appended to the registry.
//!
//! ## Deallocation
//! If the freed block ends exactly at the break it is unlinked and the break moves back over
//! it. This is the only way memory returns to the arena, and it only happens for blocks freed
//! in last-in first-out order. Any other block is just marked free and waits to be reused.
//! Adjacent free blocks are never merged.
//!
//! ## Resizing
//! A block that is already large enough is returned unchanged, otherwise the contents move
//! to a new allocation and the old block is freed. Resizing to zero does *not* free, it behaves
//! like allocating zero bytes and returns null.
//!
//! ## Stores
//! A store is the memory behind the arena. Anything that implements [`Store`] can be used,
//! this crate provides [`BufStore`] for caller-provided buffers and [`MmapStore`] for
//! lazily mapped anonymous memory.
//!
//! # Failures
//! Every failure is reported as a null pointer: zero-sized requests, overflowing
//! `count * elem_size` products and an exhausted arena. Passing a pointer to `deallocate`
//! or `reallocate` that wasn't handed out by the same allocator is undefined behavior
//! and is not checked.
//!
//! [`RawMalloc`]: allocators::RawMalloc
//! [`BrkMalloc`]: allocators::BrkMalloc
//! [`Store`]: stores::Store
//! [`BufStore`]: stores::BufStore
//! [`MmapStore`]: stores::MmapStore

pub use crate::allocators::BrkMalloc;
pub use crate::allocators::RawMalloc;
pub use crate::arena::ARENA_CAPACITY;
pub use crate::error::AllocError;

pub mod allocators;
pub mod arena;
mod error;
pub mod global;
mod header;
mod registry;
pub mod stores;
