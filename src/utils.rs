//! Buffer, smoothing, pitch and tempo utilities used by the grain engines and effects.

pub mod buffer;
pub mod dsp;
pub mod pitch;
pub mod smoothed;
pub mod tempo;

pub use buffer::{InterleavedBuffer, InterleavedBufferMut};
pub use smoothed::{ExponentialSmoothedValue, SmoothedValue};

// -------------------------------------------------------------------------------------------------

/// Run the given function with allocation checks enabled, when the `assert-allocs` feature is
/// enabled. Only has an effect when `assert_no_alloc::AllocDisabler` is the global allocator.
#[inline]
pub(crate) fn assert_no_alloc<T, F: FnOnce() -> T>(func: F) -> T {
    #[cfg(feature = "assert-allocs")]
    return assert_no_alloc::assert_no_alloc(func);
    #[cfg(not(feature = "assert-allocs"))]
    return func();
}
