//! Configuration options for blockfilter.

use crate::error::{Error, Result};
use crate::filter::BloomFilterPolicy;
use serde::{Deserialize, Serialize};

/// Default bits per key for bloom filters (roughly a 1% false positive rate).
pub const DEFAULT_BITS_PER_KEY: usize = 10;

/// Largest bits-per-key accepted by [`FilterOptions::validate`].
///
/// Beyond this the probe count is already pinned at its maximum of 30, so
/// extra bits only grow the filter.
pub const MAX_BITS_PER_KEY: usize = 128;

/// Configuration options for building filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Number of filter bits to spend on each key.
    /// Default: 10
    pub bits_per_key: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            bits_per_key: DEFAULT_BITS_PER_KEY,
        }
    }
}

impl FilterOptions {
    /// Creates a new FilterOptions with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of bits per key.
    pub fn bits_per_key(mut self, value: usize) -> Self {
        self.bits_per_key = value;
        self
    }

    /// Validates the options and returns an error if any are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.bits_per_key == 0 {
            return Err(Error::invalid_argument("bits_per_key must be > 0"));
        }
        if self.bits_per_key > MAX_BITS_PER_KEY {
            return Err(Error::invalid_argument(format!(
                "bits_per_key must be <= {}, got {}",
                MAX_BITS_PER_KEY, self.bits_per_key
            )));
        }
        Ok(())
    }

    /// Validates the options and creates the policy they describe.
    pub fn build_policy(&self) -> Result<BloomFilterPolicy> {
        self.validate()?;
        Ok(BloomFilterPolicy::new(self.bits_per_key))
    }
}
