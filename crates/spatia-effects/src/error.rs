//! Construction errors for effects.

/// Reasons an effect cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectError {
    /// A channel count is outside what the effect supports.
    ChannelCount(usize),
}

impl core::fmt::Display for EffectError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ChannelCount(n) => write!(f, "range error: channel count must be > 0 (got {n})"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EffectError {}
