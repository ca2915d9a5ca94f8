//! # blockfilter - Bloom filters for LSM-Tree data blocks
//!
//! A storage engine builds one filter per data block and stores it next to
//! the block. Before reading a block for a lookup it asks the filter whether
//! the key might be there, and skips the disk read when the answer is no.
//!
//! ## Architecture
//!
//! - **Hash**: seeded 32-bit hash shared by filter construction and queries
//! - **Filter policy**: derives the probe count from a bits-per-key budget,
//!   builds serialized filters and answers membership queries
//! - **Options**: validated configuration for the bits-per-key knob
//!
//! Filters never produce false negatives. Each serialized filter records its
//! own probe count, so filters written under old settings stay readable.
//!
//! ## Example Usage
//!
//! ```rust
//! use blockfilter::{FilterOptions, Result};
//!
//! # fn main() -> Result<()> {
//! let policy = FilterOptions::new().bits_per_key(10).build_policy()?;
//!
//! let mut block_filters = Vec::new();
//! policy.create_filter(&["apple", "banana", "cherry"], &mut block_filters);
//!
//! assert!(policy.key_may_match("banana", &block_filters));
//! if !policy.key_may_match("durian", &block_filters) {
//!     println!("durian is definitely not in this block");
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod config;
pub mod error;
pub mod filter;
pub mod hash;

// Re-exports
pub use config::FilterOptions;
pub use error::{Error, Result};
pub use filter::{BloomFilter, BloomFilterPolicy, FilterPolicy};
pub use hash::FilterKey;
