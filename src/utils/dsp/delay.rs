//! Circular delay buffers with fractional, interpolated reads.

use assume::assume;

// -------------------------------------------------------------------------------------------------

/// Multi channel circular delay buffer, storing the most recent sample frames of a signal.
///
/// Frames get written once per sample and can be read back any number of times at fractional
/// delay times. A delay of `0.0` returns the most recently written frame. The capacity is rounded
/// up to the next power of two and never changes after construction.
#[derive(Debug, Default, Clone)]
pub struct DelayBuffer<const CHANNELS: usize> {
    buffer: Vec<f32>,
    buffer_mask: usize,
    write_pos: usize,
}

impl<const CHANNELS: usize> DelayBuffer<CHANNELS> {
    /// Create a new delay buffer which holds at least `min_capacity` frames.
    pub fn new(min_capacity: usize) -> Self {
        let (buffer, buffer_mask) = if min_capacity > 0 {
            let buffer_frames = min_capacity.max(2).next_power_of_two();
            (vec![0.0; buffer_frames * CHANNELS], buffer_frames - 1)
        } else {
            (Vec::new(), 0)
        };
        let write_pos = 0;
        Self {
            buffer,
            buffer_mask,
            write_pos,
        }
    }

    /// Number of frames the buffer can hold. 0 for default constructed buffers.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len() / CHANNELS
    }

    /// Largest valid fractional delay for `read`.
    #[inline]
    pub fn max_delay(&self) -> f32 {
        self.capacity().saturating_sub(2) as f32
    }

    /// True when the buffer got default constructed and can't hold any frames.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Zero the buffer and rewind the write position, without reallocating.
    pub fn flush(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Write a new frame, overwriting the oldest one.
    #[inline]
    pub fn write(&mut self, frame: [f32; CHANNELS]) {
        if self.buffer.is_empty() {
            return;
        }
        let sample_index = self.write_pos * CHANNELS;
        assume!(unsafe: sample_index + CHANNELS <= self.buffer.len());
        self.buffer[sample_index..sample_index + CHANNELS].copy_from_slice(&frame);
        self.write_pos = (self.write_pos + 1) & self.buffer_mask;
    }

    /// Read a linearly interpolated frame `delay` frames behind the most recently written one.
    /// The delay gets clamped into `[0, capacity - 2]`.
    #[inline]
    pub fn read(&self, delay: f32) -> [f32; CHANNELS] {
        let mut output = [0.0; CHANNELS];
        if self.buffer.is_empty() {
            return output;
        }
        let delay = delay.clamp(0.0, self.max_delay());
        let delay_floor = delay.floor();
        let fraction = delay - delay_floor;

        // newest of the two frames and its older neighbour
        let capacity = self.buffer_mask + 1;
        let index1 = (self.write_pos + capacity - 1 - delay_floor as usize) & self.buffer_mask;
        let index2 = (index1 + capacity - 1) & self.buffer_mask;

        #[allow(clippy::needless_range_loop)]
        for ch in 0..CHANNELS {
            let sample_index1 = index1 * CHANNELS + ch;
            let sample_index2 = index2 * CHANNELS + ch;
            assume!(unsafe: sample_index1 < self.buffer.len());
            assume!(unsafe: sample_index2 < self.buffer.len());

            let val1 = self.buffer[sample_index1];
            let val2 = self.buffer[sample_index2];
            output[ch] = val1 + (val2 - val1) * fraction;
        }
        output
    }
}

// -------------------------------------------------------------------------------------------------
