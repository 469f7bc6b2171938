//! Interleaved audio buffer helpers.

// -------------------------------------------------------------------------------------------------

/// Frame based access to interleaved sample buffers.
///
/// Interleaved buffers store one frame of `N` channel samples after each other: `[L, R, L, R, ...]`.
/// Trailing samples which don't fill up a whole frame are not part of the returned frames.
pub trait InterleavedBuffer {
    /// Access the buffer as slice of fixed sized frames.
    fn as_frames<const N: usize>(&self) -> &[[f32; N]];
}

/// Mutable frame based access to interleaved sample buffers.
pub trait InterleavedBufferMut {
    /// Access the buffer as mutable slice of fixed sized frames.
    fn as_frames_mut<const N: usize>(&mut self) -> &mut [[f32; N]];
}

impl InterleavedBuffer for [f32] {
    #[inline]
    fn as_frames<const N: usize>(&self) -> &[[f32; N]] {
        const { assert!(N > 0, "Need at least one channel") };
        debug_assert!(
            self.len() % N == 0,
            "Buffer length must be a multiple of the channel count"
        );
        // SAFETY: `[f32; N]` has the same alignment as `f32` and the length is rounded down to
        // the number of whole frames.
        unsafe { std::slice::from_raw_parts(self.as_ptr().cast::<[f32; N]>(), self.len() / N) }
    }
}

impl InterleavedBufferMut for [f32] {
    #[inline]
    fn as_frames_mut<const N: usize>(&mut self) -> &mut [[f32; N]] {
        const { assert!(N > 0, "Need at least one channel") };
        debug_assert!(
            self.len() % N == 0,
            "Buffer length must be a multiple of the channel count"
        );
        // SAFETY: see `as_frames`
        unsafe {
            std::slice::from_raw_parts_mut(self.as_mut_ptr().cast::<[f32; N]>(), self.len() / N)
        }
    }
}

// -------------------------------------------------------------------------------------------------
