//! Reusable scratch storage for block processing.
//!
//! A [`Workspace`] hands out zero-cost `&mut [f32]` scratch regions. The backing
//! vector grows to the largest request ever made and is never shrunk, so after
//! the first block of a given size no further allocation happens.
//!
//! Contents returned by [`Workspace::get`] are whatever the previous user left
//! behind. Callers must overwrite before reading.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

/// Monotonically growing `f32` scratch buffer.
///
/// # Example
///
/// ```rust
/// use spatia_core::Workspace;
///
/// let mut ws = Workspace::new();
/// let buf = ws.get(256);
/// assert_eq!(buf.len(), 256);
/// assert!(ws.capacity() >= 256);
///
/// // Smaller requests reuse the existing storage.
/// assert_eq!(ws.get(64).len(), 64);
/// assert!(ws.capacity() >= 256);
/// ```
#[derive(Debug, Default)]
pub struct Workspace {
    data: Vec<f32>,
}

impl Workspace {
    /// Creates an empty workspace.
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Returns a scratch slice of exactly `len` samples.
    pub fn get(&mut self, len: usize) -> &mut [f32] {
        if self.data.len() < len {
            self.data.resize(len, 0.0);
        }
        &mut self.data[..len]
    }

    /// Number of samples currently backed by storage.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

#[cfg(feature = "std")]
std::thread_local! {
    static THREAD_WORKSPACE: core::cell::RefCell<Workspace> =
        const { core::cell::RefCell::new(Workspace::new()) };
}

/// Runs `f` with a `len`-sample slice borrowed from this thread's workspace.
///
/// Each processing thread owns its own instance, so no locking is involved.
/// Calls must not nest: the workspace is exclusively borrowed for the
/// duration of `f`. A nested call gets a fresh temporary buffer instead of
/// panicking, which allocates and is logged at `warn` with the `tracing`
/// feature.
#[cfg(feature = "std")]
pub fn with_thread_workspace<R>(len: usize, f: impl FnOnce(&mut [f32]) -> R) -> R {
    THREAD_WORKSPACE.with(|cell| match cell.try_borrow_mut() {
        Ok(mut ws) => f(ws.get(len)),
        Err(_) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("nested thread workspace borrow: allocating {len} samples");
            let mut fallback = Workspace::new();
            f(fallback.get(len))
        }
    })
}
