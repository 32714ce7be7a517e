//! The [`AllocError`] type.

use thiserror::Error;

/// Reasons an allocation request can fail.
///
/// Failures never escape the public entry points as errors, they surface
/// there as null pointers. Inside the allocator they travel as
/// `Result<_, AllocError>` so that logs can say what went wrong.
///
/// Passing a pointer that was not handed out by the same allocator is not
/// represented here: it is undefined behavior and never checked.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
    /// A zero-sized request, or a zero operand to `zero_allocate`.
    #[error("zero-sized allocation request")]
    ZeroSize,
    /// `count * elem_size` does not fit in a `usize`.
    #[error("allocation size overflows usize")]
    Overflow,
    /// The arena can not grow enough to hold the block.
    #[error("arena exhausted")]
    OutOfMemory,
}
