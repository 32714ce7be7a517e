//! The [`RawMalloc`] and [`BrkMalloc`] allocators.

pub mod brk_malloc;
pub mod raw_malloc;

pub use brk_malloc::BrkMalloc;
pub use raw_malloc::{BlockInfo, RawMalloc};
