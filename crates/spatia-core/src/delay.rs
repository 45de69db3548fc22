//! Delay line implementations for allpass and reverberator structures.
//!
//! Provides circular buffer-based delay lines behind a common [`DelayLine`]
//! trait, so filters such as [`AllpassFilter`](crate::AllpassFilter) can be
//! built atop any line type.
//!
//! # Types
//!
//! - [`SampleDelayLine`] - Integer delay in samples, the usual allpass line
//! - [`InterpolatedDelay`] - Variable-length delay with fractional reads
//! - [`FractionalDelayLine`] - [`InterpolatedDelay`] adapted to [`DelayLine`]
//!
//! # Read/advance protocol
//!
//! [`DelayLine::read`] returns the sample pushed `delay()` advances ago,
//! without moving the line. [`DelayLine::advance`] pushes a new sample.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// A delay line that can be read without advancing.
pub trait DelayLine {
    /// Returns the current delayed sample without advancing.
    fn read(&self) -> f32;

    /// Pushes `sample` into the line.
    fn advance(&mut self, sample: f32);

    /// Clears the line to silence.
    fn reset(&mut self);

    /// Sets the delay in samples. Values are clamped to the line's range.
    fn set_delay(&mut self, samples: f32);

    /// Returns the current delay in samples.
    fn delay(&self) -> f32;

    /// Returns the largest delay this line supports.
    fn max_delay(&self) -> f32;
}

/// Integer-length delay line (heap-allocated once, never reallocates).
///
/// # Example
///
/// ```rust
/// use spatia_core::{DelayLine, SampleDelayLine};
///
/// let mut line = SampleDelayLine::new(16);
/// line.set_delay(2.0);
/// line.advance(1.0);
/// line.advance(0.0);
/// assert_eq!(line.read(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct SampleDelayLine {
    buffer: Vec<f32>,
    /// Next slot to be written
    write_pos: usize,
    delay: usize,
}

impl SampleDelayLine {
    /// Creates a line able to delay up to `max_delay` samples, with the
    /// delay initially set to `max_delay`.
    ///
    /// # Panics
    ///
    /// Panics if `max_delay` is 0.
    pub fn new(max_delay: usize) -> Self {
        assert!(max_delay > 0, "Delay size must be > 0");
        Self {
            buffer: vec![0.0; max_delay],
            write_pos: 0,
            delay: max_delay,
        }
    }

    /// Creates a line with the given maximum and current delay.
    pub fn with_delay(max_delay: usize, delay: usize) -> Self {
        let mut line = Self::new(max_delay);
        line.delay = delay.clamp(1, max_delay);
        line
    }

    /// Current delay in whole samples.
    pub fn delay_samples(&self) -> usize {
        self.delay
    }
}

impl DelayLine for SampleDelayLine {
    #[inline]
    fn read(&self) -> f32 {
        let len = self.buffer.len();
        self.buffer[(self.write_pos + len - self.delay) % len]
    }

    #[inline]
    fn advance(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    fn set_delay(&mut self, samples: f32) {
        let samples = if samples.is_finite() { samples } else { 1.0 };
        self.delay = (samples as usize).clamp(1, self.buffer.len());
    }

    fn delay(&self) -> f32 {
        self.delay as f32
    }

    fn max_delay(&self) -> f32 {
        self.buffer.len() as f32
    }
}

/// Interpolated delay line using a circular buffer (heap-allocated).
///
/// Supports fractional delay times through linear interpolation. Reads take
/// the delay as an argument: `read(0.0)` is the most recently written sample.
///
/// # Memory
///
/// The buffer is heap-allocated during construction but never reallocates.
///
/// # Example
///
/// ```rust
/// use spatia_core::InterpolatedDelay;
///
/// let mut delay = InterpolatedDelay::new(64);
/// delay.write(0.0);
/// delay.write(1.0);
/// assert!((delay.read(0.5) - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedDelay {
    /// Circular buffer storage
    buffer: Vec<f32>,
    /// Write position in buffer
    write_pos: usize,
}

impl InterpolatedDelay {
    /// Creates a new delay line with the given capacity in samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Delay size must be > 0");

        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Reads a delayed sample with linear interpolation.
    ///
    /// `delay_samples` counts back from the last written sample and is
    /// clamped to `capacity - 1`.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        debug_assert!(delay_samples >= 0.0);

        let len = self.buffer.len();
        let delay_clamped = delay_samples.clamp(0.0, (len - 1) as f32);

        let delay_int = delay_clamped as usize;
        let frac = delay_clamped - delay_int as f32;

        // Points to the sample `delay_int` samples before the last written.
        let read_pos = (self.write_pos + len - delay_int - 1) % len;
        let next_pos = (read_pos + len - 1) % len;

        let a = self.buffer[read_pos];
        let b = self.buffer[next_pos];
        a + (b - a) * frac
    }

    /// Writes a sample to the delay line and advances the write position.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Clears the delay line (sets all samples to 0).
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Returns the capacity in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

/// Fractional-length [`DelayLine`] backed by an [`InterpolatedDelay`].
///
/// The delay is in `[1, max_delay]` samples; non-integer values interpolate
/// linearly between neighbours.
#[derive(Debug, Clone)]
pub struct FractionalDelayLine {
    line: InterpolatedDelay,
    delay: f32,
}

impl FractionalDelayLine {
    /// Creates a line able to delay up to `max_delay` samples.
    pub fn new(max_delay: usize) -> Self {
        Self {
            // One extra slot so a delay of exactly `max_delay` stays readable.
            line: InterpolatedDelay::new(max_delay + 1),
            delay: max_delay as f32,
        }
    }

    /// Creates a line from a sample rate and maximum delay time in seconds.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        Self::new((sample_rate * max_seconds) as usize + 1)
    }
}

impl DelayLine for FractionalDelayLine {
    #[inline]
    fn read(&self) -> f32 {
        self.line.read(self.delay - 1.0)
    }

    #[inline]
    fn advance(&mut self, sample: f32) {
        self.line.write(sample);
    }

    fn reset(&mut self) {
        self.line.clear();
    }

    fn set_delay(&mut self, samples: f32) {
        let samples = if samples.is_finite() { samples } else { 1.0 };
        self.delay = samples.clamp(1.0, self.max_delay());
    }

    fn delay(&self) -> f32 {
        self.delay
    }

    fn max_delay(&self) -> f32 {
        (self.line.capacity() - 1) as f32
    }
}
