//! Policies for reading and writing containers

use crate::slug::DEFAULT_MAX_SUFFIX;

/// Default limit on folder nesting
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling how containers are unpacked and packed
///
/// ```
/// use chunky::ChunkyOptions;
///
/// let options = ChunkyOptions::new().max_suffix(9).max_depth(16);
/// assert_eq!(options.max_suffix, 9);
/// assert_eq!(options.max_depth, 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkyOptions {
    /// Highest numeric suffix tried when a materialized name collides.
    ///
    /// With the default of 99 the candidates are `name.CODE`,
    /// `name-2.CODE`, ..., `name-99.CODE`.
    pub max_suffix: u32,

    /// Deepest folder nesting accepted, for both unpacking and packing.
    pub max_depth: usize,
}

impl ChunkyOptions {
    /// Default options
    pub fn new() -> Self {
        Self {
            max_suffix: DEFAULT_MAX_SUFFIX,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the highest collision suffix
    pub fn max_suffix(mut self, max_suffix: u32) -> Self {
        self.max_suffix = max_suffix;
        self
    }

    /// Set the folder nesting limit
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ChunkyOptions {
    fn default() -> Self {
        Self::new()
    }
}
