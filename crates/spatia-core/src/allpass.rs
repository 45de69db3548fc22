//! Nestable allpass filters for reverb diffusion.
//!
//! [`AllpassFilter`] is a first-order-in-`z^-d` allpass built atop any
//! [`DelayLine`]:
//!
//! ```text
//! H(z) = (c + z^-d) / (1 + c·z^-d)
//! ```
//!
//! Per sample, with `v` the current delayed value:
//!
//! ```text
//! rec = x - c·v
//! y   = c·rec + v
//! line <- rec
//! ```
//!
//! # Nesting
//!
//! The tick is split into [`begin_nested_tick`](AllpassFilter::begin_nested_tick)
//! and [`end_nested_tick`](AllpassFilter::end_nested_tick) so another stage can
//! process the delayed value in between. Placing an allpass inside the delay
//! path of another yields the lattice/Gardner structures used by Schroeder
//! style reverberators, without an intermediate buffering pass.
//!
//! # Linked filters
//!
//! [`AllpassBank`] owns a set of filters and an acyclic table of
//! master → slave links. Tuning a master (coefficient or delay) is mirrored to
//! its slave chain, while every filter keeps its own delay state.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

use crate::delay::{DelayLine, SampleDelayLine};
use crate::flush_denormal;

/// Nestable allpass filter over a delay line of type `D`.
///
/// # Example
///
/// ```rust
/// use spatia_core::{AllpassFilter, SampleDelayLine};
///
/// let mut ap = AllpassFilter::new(SampleDelayLine::new(1));
/// ap.set_coefficient(0.5);
///
/// // The line starts silent, so the first output is c·x.
/// assert!((ap.tick(1.0) - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct AllpassFilter<D: DelayLine = SampleDelayLine> {
    line: D,
    coefficient: f32,
}

impl<D: DelayLine> AllpassFilter<D> {
    /// Wraps `line` with a coefficient of 0.5.
    pub fn new(line: D) -> Self {
        Self {
            line,
            coefficient: 0.5,
        }
    }

    /// Wraps `line` with the given coefficient.
    pub fn with_coefficient(line: D, coefficient: f32) -> Self {
        Self { line, coefficient }
    }

    /// Sets the coefficient. Stable for `|c| < 1`.
    #[inline]
    pub fn set_coefficient(&mut self, coefficient: f32) {
        self.coefficient = coefficient;
    }

    /// Current coefficient.
    #[inline]
    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    /// Shared access to the delay line.
    pub fn line(&self) -> &D {
        &self.line
    }

    /// Mutable access to the delay line, for delay changes.
    pub fn line_mut(&mut self) -> &mut D {
        &mut self.line
    }

    /// Processes one sample.
    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        let v = self.begin_nested_tick();
        self.end_nested_tick(input, v)
    }

    /// First half of a split tick. Returns the delayed value `v`.
    #[inline]
    pub fn begin_nested_tick(&mut self) -> f32 {
        self.line.read()
    }

    /// Second half of a split tick.
    ///
    /// `line_value` is the delayed value from
    /// [`begin_nested_tick`](Self::begin_nested_tick), possibly transformed by a
    /// nested stage.
    #[inline]
    pub fn end_nested_tick(&mut self, input: f32, line_value: f32) -> f32 {
        let rec = input - self.coefficient * line_value;
        let out = self.coefficient * rec + line_value;
        self.line.advance(flush_denormal(rec));
        out
    }

    /// Clears this filter's delay line. Linked filters are not touched.
    pub fn reset(&mut self) {
        self.line.reset();
    }
}

/// Reasons an [`AllpassBank::link`] call is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllpassLinkError {
    /// A filter cannot be its own slave.
    SelfLink(usize),
    /// The index does not name a filter in the bank.
    OutOfRange(usize),
    /// The link would close a loop in the slave chain.
    Cycle {
        /// Requested master.
        master: usize,
        /// Requested slave.
        slave: usize,
    },
}

impl core::fmt::Display for AllpassLinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SelfLink(i) => write!(f, "allpass {i} cannot be linked to itself"),
            Self::OutOfRange(i) => write!(f, "allpass index {i} out of range"),
            Self::Cycle { master, slave } => {
                write!(f, "linking allpass {master} -> {slave} would create a cycle")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllpassLinkError {}

/// Arena of allpass filters with optional non-owning slave links.
///
/// Links are indices into the bank. The bank refuses any link that would form
/// a cycle, so propagation along a chain always terminates.
///
/// # Example
///
/// ```rust
/// use spatia_core::{AllpassBank, AllpassFilter, DelayLine, SampleDelayLine};
///
/// let mut bank = AllpassBank::new();
/// let left = bank.push(AllpassFilter::new(SampleDelayLine::new(64)));
/// let right = bank.push(AllpassFilter::new(SampleDelayLine::new(64)));
/// bank.link(left, right).unwrap();
///
/// bank.set_coefficient(left, 0.7);
/// bank.set_delay(left, 31.0);
/// assert_eq!(bank.get(right).unwrap().coefficient(), 0.7);
/// assert_eq!(bank.get(right).unwrap().line().delay(), 31.0);
/// ```
#[derive(Debug, Clone)]
pub struct AllpassBank<D: DelayLine = SampleDelayLine> {
    filters: Vec<AllpassFilter<D>>,
    slaves: Vec<Option<usize>>,
}

impl<D: DelayLine> Default for AllpassBank<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DelayLine> AllpassBank<D> {
    /// Creates an empty bank.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            slaves: Vec::new(),
        }
    }

    /// Adds a filter and returns its index.
    pub fn push(&mut self, filter: AllpassFilter<D>) -> usize {
        self.filters.push(filter);
        self.slaves.push(None);
        self.filters.len() - 1
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if the bank holds no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filter at `index`.
    pub fn get(&self, index: usize) -> Option<&AllpassFilter<D>> {
        self.filters.get(index)
    }

    /// Mutable filter at `index`. Changes made here are not propagated.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut AllpassFilter<D>> {
        self.filters.get_mut(index)
    }

    /// Slave currently linked to `master`, if any.
    pub fn slave_of(&self, master: usize) -> Option<usize> {
        self.slaves.get(master).copied().flatten()
    }

    /// Links `slave` to `master` and immediately copies the master's
    /// coefficient and delay down the new chain.
    ///
    /// Replaces any previous slave of `master`.
    pub fn link(&mut self, master: usize, slave: usize) -> Result<(), AllpassLinkError> {
        let len = self.filters.len();
        if master >= len {
            return Err(AllpassLinkError::OutOfRange(master));
        }
        if slave >= len {
            return Err(AllpassLinkError::OutOfRange(slave));
        }
        if master == slave {
            return Err(AllpassLinkError::SelfLink(master));
        }
        // Walking down from the slave must never reach the master.
        let mut cursor = self.slaves[slave];
        while let Some(next) = cursor {
            if next == master {
                #[cfg(feature = "tracing")]
                tracing::debug!("allpass_link: {master} -> {slave} rejected, cycle");
                return Err(AllpassLinkError::Cycle { master, slave });
            }
            cursor = self.slaves[next];
        }

        self.slaves[master] = Some(slave);
        #[cfg(feature = "tracing")]
        tracing::debug!("allpass_link: {master} -> {slave}");
        let coefficient = self.filters[master].coefficient();
        let delay = self.filters[master].line().delay();
        self.propagate(master, |f| {
            f.set_coefficient(coefficient);
            f.line_mut().set_delay(delay);
        });
        Ok(())
    }

    /// Removes the slave link of `master`, if any.
    pub fn unlink(&mut self, master: usize) {
        if let Some(link) = self.slaves.get_mut(master) {
            *link = None;
        }
    }

    /// Sets the coefficient of `index` and every filter down its slave chain.
    pub fn set_coefficient(&mut self, index: usize, coefficient: f32) {
        let Some(filter) = self.filters.get_mut(index) else {
            return;
        };
        filter.set_coefficient(coefficient);
        self.propagate(index, |f| f.set_coefficient(coefficient));
    }

    /// Sets the delay of `index` and every line down its slave chain.
    pub fn set_delay(&mut self, index: usize, samples: f32) {
        let Some(filter) = self.filters.get_mut(index) else {
            return;
        };
        filter.line_mut().set_delay(samples);
        self.propagate(index, |f| f.line_mut().set_delay(samples));
    }

    /// Ticks filter `index`. Out-of-range indices pass the input through.
    #[inline]
    pub fn tick(&mut self, index: usize, input: f32) -> f32 {
        match self.filters.get_mut(index) {
            Some(filter) => filter.tick(input),
            None => input,
        }
    }

    /// Clears filter `index` only. Slaves are not reset.
    pub fn reset(&mut self, index: usize) {
        if let Some(filter) = self.filters.get_mut(index) {
            filter.reset();
        }
    }

    /// Clears every filter in the bank.
    pub fn reset_all(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    fn propagate(&mut self, from: usize, mut apply: impl FnMut(&mut AllpassFilter<D>)) {
        let mut cursor = self.slaves[from];
        while let Some(next) = cursor {
            apply(&mut self.filters[next]);
            cursor = self.slaves[next];
        }
    }
}
