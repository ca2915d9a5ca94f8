//! Filter implementations for efficient key existence checking.
//!
//! A filter summarises the keys of one data block so a lookup can skip the
//! block when the key is definitely not present.

pub mod bloom;

pub use bloom::{BloomFilter, BloomFilterPolicy, Encoding, MAX_PROBES};

/// An algorithm for probabilistically encoding a set of keys.
///
/// The policy name is persisted next to the filters it writes. A reader
/// should only hand a filter to a policy with the same name; anything else
/// may produce wrong answers.
pub trait FilterPolicy: Send + Sync {
    /// Return the name of this policy. It must change whenever the filter
    /// encoding changes incompatibly.
    fn name(&self) -> &'static str;

    /// Append a filter summarising `keys` to `dst`.
    ///
    /// Bytes already in `dst` are left untouched. Keys may contain
    /// duplicates.
    fn create_filter(&self, keys: &[&[u8]], dst: &mut Vec<u8>);

    /// Check if `key` may be in the set `filter` was built from.
    ///
    /// Must return `true` for every key passed to [`create_filter`]; may
    /// return `true` for other keys (false positives).
    ///
    /// [`create_filter`]: FilterPolicy::create_filter
    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool;
}
