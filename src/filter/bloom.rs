//! Bloom Filter implementation.
//!
//! A space-efficient probabilistic data structure used to test whether an element
//! is a member of a set. False positive matches are possible, but false negatives are not.
//!
//! Serialized format:
//! [bit array: ceil(max(n * bits_per_key, 64) / 8) bytes][num_probes: 1 byte]
//!
//! The trailing probe count makes every filter self-describing: a policy can
//! read filters written under any other bits-per-key setting.

use crate::filter::FilterPolicy;
use crate::hash::FilterKey;

/// Largest probe count a filter can record. Trailing bytes above this are
/// reserved for other encodings.
pub const MAX_PROBES: u8 = 30;

/// Bit arrays never shrink below this, which keeps tiny filters from having
/// a very high false positive rate.
const MIN_FILTER_BITS: usize = 64;

/// BloomFilterPolicy builds and queries serialized bloom filters at a fixed
/// bits-per-key budget.
///
/// # Example
/// ```
/// use blockfilter::filter::BloomFilterPolicy;
///
/// let policy = BloomFilterPolicy::new(10);
/// let mut dst = Vec::new();
/// policy.create_filter(&["key1", "key2"], &mut dst);
///
/// assert!(policy.key_may_match("key1", &dst));
/// assert!(policy.key_may_match("key2", &dst));
/// // key3 might return true (false positive) or false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloomFilterPolicy {
    bits_per_key: usize,
    num_probes: u8,
}

impl BloomFilterPolicy {
    /// Name of the filter encoding.
    pub const NAME: &'static str = "leveldb.BuiltinBloomFilter2";

    /// Create a policy spending `bits_per_key` bits on every key.
    ///
    /// The probe count is `floor(bits_per_key * ln 2)` clamped to `[1, 30]`.
    /// LevelDB multiplies by 0.69 instead, so for a few settings (13, 26, 39,
    /// 42) new filters record one more probe than LevelDB would write. Both
    /// read each other's filters unchanged.
    ///
    /// Any value is accepted; see [`FilterOptions`] for a validated entry point.
    ///
    /// [`FilterOptions`]: crate::config::FilterOptions
    pub fn new(bits_per_key: usize) -> Self {
        // Rounding down costs a little accuracy and saves a probe.
        let num_probes = (bits_per_key as f64 * std::f64::consts::LN_2) as usize;
        let num_probes = num_probes.clamp(1, MAX_PROBES as usize) as u8;

        log::debug!(
            "Created bloom filter policy: {} bits per key, {} probes",
            bits_per_key,
            num_probes
        );

        Self {
            bits_per_key,
            num_probes,
        }
    }

    /// Get the configured bits per key.
    pub fn bits_per_key(&self) -> usize {
        self.bits_per_key
    }

    /// Get the number of probes this policy writes into new filters.
    pub fn num_probes(&self) -> u8 {
        self.num_probes
    }

    /// Size in bytes of the bit array for `num_keys` keys.
    fn bit_array_len(&self, num_keys: usize) -> usize {
        let bits = num_keys
            .saturating_mul(self.bits_per_key)
            .max(MIN_FILTER_BITS);
        bits.div_ceil(8)
    }

    /// Number of bits in the bit array for `num_keys` keys.
    fn bit_array_bits(&self, num_keys: usize) -> usize {
        self.bit_array_len(num_keys).saturating_mul(8)
    }

    /// Get the exact number of bytes [`create_filter`] appends for `num_keys` keys.
    ///
    /// [`create_filter`]: BloomFilterPolicy::create_filter
    pub fn filter_size(&self, num_keys: usize) -> usize {
        self.bit_array_len(num_keys).saturating_add(1)
    }

    /// Append a filter holding `keys` to `dst`.
    ///
    /// Existing bytes in `dst` are not modified. Duplicate keys only set bits
    /// that are already set.
    ///
    /// # Panics
    ///
    /// Panics if `dst` cannot grow by [`filter_size`] bytes, which only
    /// happens for absurd `bits_per_key` values.
    ///
    /// [`filter_size`]: BloomFilterPolicy::filter_size
    pub fn create_filter<K: FilterKey>(&self, keys: &[K], dst: &mut Vec<u8>) {
        let bytes = self.bit_array_len(keys.len());
        let bits = self.bit_array_bits(keys.len());

        let init_size = dst.len();
        dst.resize(init_size + bytes, 0);
        dst.push(self.num_probes);

        let array = &mut dst[init_size..init_size + bytes];
        for key in keys {
            // Double hashing, see [Kirsch, Mitzenmacher 2006].
            let mut h = key.bloom_hash();
            let delta = h.rotate_right(17);
            for _ in 0..self.num_probes {
                let bitpos = h as usize % bits;
                array[bitpos / 8] |= 1 << (bitpos % 8);
                h = h.wrapping_add(delta);
            }
        }

        log::trace!(
            "Built bloom filter: {} keys, {} bytes, {} probes",
            keys.len(),
            bytes + 1,
            self.num_probes
        );
    }

    /// Check if `key` may be in the set `filter` was built from.
    ///
    /// The probe count is read from `filter` itself, so filters built with
    /// any bits-per-key setting are answered correctly.
    pub fn key_may_match<K: FilterKey + ?Sized>(&self, key: &K, filter: &[u8]) -> bool {
        BloomFilter::new(filter).may_contain(key)
    }

    /// Theoretical false positive rate of filters built by this policy.
    ///
    /// p = (1 - e^(-k/b))^k, with k = num_probes and b = bits_per_key.
    /// Small key counts fall under the 64-bit floor and do better than this.
    pub fn estimated_false_positive_rate(&self) -> f64 {
        if self.bits_per_key == 0 {
            return 1.0;
        }
        let k = self.num_probes as f64;
        let b = self.bits_per_key as f64;
        (1.0 - (-k / b).exp()).powf(k)
    }
}

impl Default for BloomFilterPolicy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BITS_PER_KEY)
    }
}

impl FilterPolicy for BloomFilterPolicy {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn create_filter(&self, keys: &[&[u8]], dst: &mut Vec<u8>) {
        BloomFilterPolicy::create_filter(self, keys, dst)
    }

    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool {
        BloomFilterPolicy::key_may_match(self, key, filter)
    }
}

/// How a serialized filter is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Shorter than two bytes. Matches nothing.
    Empty,
    /// Trailing byte above [`MAX_PROBES`], kept for future encodings.
    /// Matches everything.
    Reserved(u8),
    /// A regular bloom filter.
    Bloom {
        /// Probes recorded in the trailing byte.
        num_probes: u8,
    },
}

/// BloomFilter is a read-only view over a serialized filter.
#[derive(Debug, Clone, Copy)]
pub struct BloomFilter<'a> {
    data: &'a [u8],
    encoding: Encoding,
}

impl<'a> BloomFilter<'a> {
    /// Parse a serialized filter. Never fails: malformed input maps to
    /// [`Encoding::Empty`] or [`Encoding::Reserved`].
    pub fn new(data: &'a [u8]) -> Self {
        let encoding = match data.last() {
            _ if data.len() < 2 => Encoding::Empty,
            Some(&k) if k > MAX_PROBES => {
                log::debug!("Bloom filter uses reserved encoding {}, treating as match", k);
                Encoding::Reserved(k)
            }
            Some(&k) => Encoding::Bloom { num_probes: k },
            None => Encoding::Empty,
        };
        Self { data, encoding }
    }

    /// Get how this filter is interpreted.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Get the recorded probe count (0 for an empty filter).
    pub fn num_probes(&self) -> u8 {
        match self.encoding {
            Encoding::Empty => 0,
            Encoding::Reserved(k) => k,
            Encoding::Bloom { num_probes } => num_probes,
        }
    }

    /// Get the bit array, without the trailing probe byte.
    pub fn bit_array(&self) -> &'a [u8] {
        match self.encoding {
            Encoding::Empty => &[],
            _ => &self.data[..self.data.len() - 1],
        }
    }

    /// Get the number of bits in the bit array.
    pub fn num_bits(&self) -> usize {
        self.bit_array().len() * 8
    }

    /// Count the bits that are set.
    pub fn bits_set(&self) -> usize {
        self.bit_array()
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum()
    }

    /// Check if a key may exist in the set.
    ///
    /// Returns `true` if the key might exist (with possible false positives).
    /// Returns `false` if the key definitely does not exist (no false negatives).
    pub fn may_contain<K: FilterKey + ?Sized>(&self, key: &K) -> bool {
        let num_probes = match self.encoding {
            Encoding::Empty => return false,
            Encoding::Reserved(_) => return true,
            Encoding::Bloom { num_probes } => num_probes,
        };

        let array = self.bit_array();
        let bits = array.len() * 8;

        let mut h = key.bloom_hash();
        let delta = h.rotate_right(17);
        for _ in 0..num_probes {
            let bitpos = h as usize % bits;
            if array[bitpos / 8] & (1 << (bitpos % 8)) == 0 {
                return false; // Definitely not present
            }
            h = h.wrapping_add(delta);
        }

        true
    }

    /// Calculate the approximate false positive rate for `num_keys` keys.
    ///
    /// p = (1 - e^(-kn/m))^k
    /// where k = num_probes, n = num_keys, m = num_bits
    pub fn estimated_false_positive_rate(&self, num_keys: usize) -> f64 {
        let num_probes = match self.encoding {
            Encoding::Empty => return 0.0,
            Encoding::Reserved(_) => return 1.0,
            Encoding::Bloom { num_probes } => num_probes,
        };
        // No probes to fail: every key matches.
        if num_probes == 0 {
            return 1.0;
        }
        if num_keys == 0 {
            return 0.0;
        }

        let k = num_probes as f64;
        let n = num_keys as f64;
        let m = self.num_bits() as f64;

        let exp = (-k * n / m).exp();
        (1.0 - exp).powf(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build<K: FilterKey>(policy: &BloomFilterPolicy, keys: &[K]) -> Vec<u8> {
        let mut dst = Vec::new();
        policy.create_filter(keys, &mut dst);
        dst
    }

    #[test]
    fn test_num_probes_derivation() {
        let cases = [
            (0, 1),
            (1, 1),
            (2, 1),
            (3, 2),
            (10, 6),
            (13, 9),
            (16, 11),
            (20, 13),
            (42, 29),
            (43, 29),
            (44, 30),
            (1000, 30),
        ];
        for (bits_per_key, expected) in cases {
            assert_eq!(
                BloomFilterPolicy::new(bits_per_key).num_probes(),
                expected,
                "bits_per_key = {}",
                bits_per_key
            );
        }
    }

    #[test]
    fn test_bloom_filter_empty() {
        let policy = BloomFilterPolicy::new(10);
        let filter = build::<&str>(&policy, &[]);

        assert_eq!(filter, [0, 0, 0, 0, 0, 0, 0, 0, 6]);
        assert!(!policy.key_may_match("hello", &filter));
        assert!(!policy.key_may_match("world", &filter));
    }

    #[test]
    fn test_bloom_filter_small() {
        let policy = BloomFilterPolicy::new(10);
        let filter = build(&policy, &["hello", "world"]);

        assert_eq!(filter, [0x11, 0x40, 0x00, 0x41, 0x44, 0x10, 0x40, 0x10, 0x06]);
        assert!(policy.key_may_match("hello", &filter));
        assert!(policy.key_may_match("world", &filter));
        assert!(!policy.key_may_match("x", &filter));
        assert!(!policy.key_may_match("foo", &filter));
    }

    #[test]
    fn test_bloom_filter_minimum_size() {
        let policy = BloomFilterPolicy::new(1);
        let filter = build(&policy, &["a"]);
        assert_eq!(filter.len(), 9);
        assert_eq!(filter[8], 1);
        assert!(policy.key_may_match("a", &filter));
    }

    #[test]
    fn test_bloom_filter_size_rounds_up_to_bytes() {
        let policy = BloomFilterPolicy::new(10);
        // 7 keys * 10 bits = 70 bits -> 9 bytes
        assert_eq!(policy.filter_size(7), 10);
        assert_eq!(policy.filter_size(100), 126);

        let keys: Vec<u64> = (0..7).collect();
        assert_eq!(build(&policy, &keys).len(), 10);
    }

    #[test]
    fn test_bloom_filter_appends() {
        let policy = BloomFilterPolicy::new(10);
        let mut dst = b"prefix".to_vec();
        policy.create_filter(&["a", "b", "c"], &mut dst);

        assert_eq!(&dst[..6], b"prefix");
        assert_eq!(dst.len(), 6 + policy.filter_size(3));
        assert!(policy.key_may_match("b", &dst[6..]));
    }

    #[test]
    fn test_bloom_filter_u64_keys() {
        let policy = BloomFilterPolicy::new(10);
        let filter = build(&policy, &[7u64, 9u64]);

        assert_eq!(filter, [0x0d, 0x80, 0x40, 0x21, 0x00, 0x16, 0xa0, 0x00, 0x06]);
        assert!(policy.key_may_match(&7u64, &filter));
        assert!(policy.key_may_match(&9u64, &filter));
        assert!(policy.key_may_match(&7u64.to_le_bytes()[..], &filter));
    }

    #[test]
    fn test_bloom_filter_too_short() {
        let policy = BloomFilterPolicy::new(10);
        assert!(!policy.key_may_match("hello", b""));
        assert!(!policy.key_may_match("hello", b"x"));
        assert!(!policy.key_may_match(&0u64, &[6]));

        assert_eq!(BloomFilter::new(b"x").encoding(), Encoding::Empty);
        assert_eq!(BloomFilter::new(b"x").num_bits(), 0);
    }

    #[test]
    fn test_bloom_filter_reserved_encoding() {
        let policy = BloomFilterPolicy::new(10);
        let mut filter = vec![0u8; 8];
        filter.push(31);

        assert!(policy.key_may_match("anything", &filter));
        assert!(policy.key_may_match(&12345u64, &filter));

        let view = BloomFilter::new(&filter);
        assert_eq!(view.encoding(), Encoding::Reserved(31));
        assert_eq!(view.num_probes(), 31);

        filter[8] = 0xff;
        assert!(policy.key_may_match("anything", &filter));
    }

    #[test]
    fn test_bloom_filter_zero_probes() {
        // A zero probe count has no bits to check.
        let filter = [0u8, 0];
        assert!(BloomFilterPolicy::new(10).key_may_match("k", &filter));
    }

    #[test]
    fn test_bloom_filter_no_false_negatives() {
        let policy = BloomFilterPolicy::new(10);
        let keys: Vec<Vec<u8>> = (0..1000)
            .map(|i| format!("key{}", i).into_bytes())
            .collect();
        let filter = build(&policy, &keys);

        for key in &keys {
            assert!(
                policy.key_may_match(key, &filter),
                "False negative detected for key: {:?}",
                String::from_utf8_lossy(key)
            );
        }
    }

    #[test]
    fn test_bloom_filter_false_positive_rate() {
        let num_keys = 10000;
        let policy = BloomFilterPolicy::new(10);

        let keys: Vec<String> = (0..num_keys).map(|i| format!("key{}", i)).collect();
        let filter = build(&policy, &keys);

        let test_keys = 10000;
        let false_positives = (num_keys..num_keys + test_keys)
            .filter(|i| policy.key_may_match(&format!("key{}", i), &filter))
            .count();

        let actual_fp_rate = false_positives as f64 / test_keys as f64;
        println!("Actual FP rate: {:.4}", actual_fp_rate);
        assert!(
            actual_fp_rate < 0.02,
            "False positive rate too high: {:.4}",
            actual_fp_rate
        );
    }

    #[test]
    fn test_bloom_filter_cross_policy() {
        let writer = BloomFilterPolicy::new(20);
        let reader = BloomFilterPolicy::new(2);
        let keys: Vec<String> = (0..500).map(|i| format!("k{}", i)).collect();
        let filter = build(&writer, &keys);

        assert_eq!(BloomFilter::new(&filter).num_probes(), 13);
        for key in &keys {
            assert!(reader.key_may_match(key, &filter));
        }
    }

    #[test]
    fn test_bloom_filter_view() {
        let policy = BloomFilterPolicy::new(10);
        let filter = build(&policy, &["hello", "world"]);
        let view = BloomFilter::new(&filter);

        assert_eq!(view.encoding(), Encoding::Bloom { num_probes: 6 });
        assert_eq!(view.num_bits(), 64);
        assert_eq!(view.bit_array().len(), 8);
        assert_eq!(view.bits_set(), 10);
        assert!(view.may_contain("hello"));
    }

    #[test]
    fn test_bloom_filter_estimated_fp_rate() {
        let policy = BloomFilterPolicy::new(10);
        let estimated = policy.estimated_false_positive_rate();
        assert!(estimated > 0.005 && estimated < 0.02, "{}", estimated);

        let keys: Vec<u64> = (0..1000).collect();
        let filter = build(&policy, &keys);
        let view_estimate = BloomFilter::new(&filter).estimated_false_positive_rate(1000);
        assert!((view_estimate - estimated).abs() < 1e-9);

        assert_eq!(BloomFilter::new(b"").estimated_false_positive_rate(10), 0.0);
        assert_eq!(BloomFilterPolicy::new(0).estimated_false_positive_rate(), 1.0);
    }

    #[test]
    fn test_estimated_fp_rate_matches_everything_encodings() {
        let zero_probes = [0u8; 9];
        let view = BloomFilter::new(&zero_probes);
        assert_eq!(view.encoding(), Encoding::Bloom { num_probes: 0 });
        assert!(view.may_contain("anything"));
        assert_eq!(view.estimated_false_positive_rate(10), 1.0);
        assert_eq!(view.estimated_false_positive_rate(0), 1.0);

        let mut reserved = vec![0u8; 8];
        reserved.push(31);
        let view = BloomFilter::new(&reserved);
        assert!(view.may_contain("anything"));
        assert_eq!(view.estimated_false_positive_rate(10), 1.0);

        // Regular filters with no keys yet report no false positives
        let mut empty = Vec::new();
        BloomFilterPolicy::new(10).create_filter::<u64>(&[], &mut empty);
        assert_eq!(BloomFilter::new(&empty).estimated_false_positive_rate(0), 0.0);
    }

    #[test]
    fn test_bit_array_size_saturates() {
        let policy = BloomFilterPolicy::new(usize::MAX);
        assert_eq!(policy.num_probes(), 30);
        assert_eq!(policy.bit_array_len(2), usize::MAX.div_ceil(8));
        assert_eq!(policy.bit_array_bits(2), usize::MAX);
        assert_eq!(policy.filter_size(2), usize::MAX.div_ceil(8) + 1);

        // Small settings are unaffected
        let policy = BloomFilterPolicy::new(10);
        assert_eq!(policy.bit_array_bits(0), 64);
        assert_eq!(policy.bit_array_bits(7), 72);
    }

    #[test]
    fn test_filter_policy_trait_object() {
        let policy: Box<dyn FilterPolicy> = Box::new(BloomFilterPolicy::default());
        assert_eq!(policy.name(), "leveldb.BuiltinBloomFilter2");

        let mut dst = Vec::new();
        policy.create_filter(&[b"hello".as_slice(), b"world".as_slice()], &mut dst);
        assert_eq!(dst, [0x11, 0x40, 0x00, 0x41, 0x44, 0x10, 0x40, 0x10, 0x06]);
        assert!(policy.key_may_match(b"hello", &dst));
        assert!(!policy.key_may_match(b"x", &dst));
    }
}
