//! Example demonstrating Bloom filter policy usage in blockfilter
//!
//! This example builds one filter per simulated data block and shows how
//! lookups skip blocks whose filter rules the key out.
//!
//! Run with `RUST_LOG=trace` to see the filter construction logs.

use blockfilter::filter::{BloomFilter, BloomFilterPolicy};
use blockfilter::{FilterOptions, Result};

fn main() -> Result<()> {
    env_logger::init();

    println!("=== blockfilter Bloom Filter Example ===\n");

    // Example 1: Direct filter usage
    example_direct_filter()?;

    // Example 2: One filter per data block
    example_block_filters()?;

    // Example 3: Reading filters written with other settings
    example_cross_policy();

    Ok(())
}

/// Example 1: Building and querying a single filter
fn example_direct_filter() -> Result<()> {
    println!("--- Example 1: Direct Filter Usage ---");

    let policy = FilterOptions::new().bits_per_key(10).build_policy()?;

    let keys = vec!["user:1001", "user:1002", "user:1003", "user:1004", "user:1005"];
    let mut filter = Vec::new();
    policy.create_filter(&keys, &mut filter);

    let view = BloomFilter::new(&filter);
    println!("Added {} keys to bloom filter", keys.len());
    println!("Filter size: {} bytes ({} bits)", filter.len(), view.num_bits());
    println!("Number of probes: {}", view.num_probes());

    println!("\nTesting membership:");
    for key in &keys {
        println!("  {} exists? {}", key, policy.key_may_match(key, &filter));
    }

    println!("\nTesting non-existent keys:");
    for key in ["user:9001", "user:9002", "user:9003"] {
        println!("  {} exists? {} (should be false)", key, policy.key_may_match(key, &filter));
    }

    println!();
    Ok(())
}

/// Example 2: A storage engine keeps a filter next to every data block
fn example_block_filters() -> Result<()> {
    println!("--- Example 2: Filters per Data Block ---");

    let policy = FilterOptions::default().build_policy()?;

    // Ten blocks of 1000 sorted keys each, filters packed into one buffer
    let mut filter_data = Vec::new();
    let mut handles = Vec::new();
    for block in 0..10u64 {
        let keys: Vec<u64> = (block * 1000..(block + 1) * 1000).collect();
        let offset = filter_data.len();
        policy.create_filter(&keys, &mut filter_data);
        handles.push((offset, filter_data.len()));
    }
    println!(
        "Built {} filters, {} bytes total ({:.1} bits per key)",
        handles.len(),
        filter_data.len(),
        filter_data.len() as f64 * 8.0 / 10000.0
    );

    let mut blocks_read = 0;
    let mut blocks_skipped = 0;
    for key in 20_000u64..30_000 {
        for &(start, end) in &handles {
            if policy.key_may_match(&key, &filter_data[start..end]) {
                blocks_read += 1;
            } else {
                blocks_skipped += 1;
            }
        }
    }
    println!("Looked up 10000 absent keys:");
    println!("  Blocks read (false positives): {}", blocks_read);
    println!("  Blocks skipped:                {}", blocks_skipped);
    println!(
        "  Expected false positive rate:  {:.4}",
        policy.estimated_false_positive_rate()
    );

    println!();
    Ok(())
}

/// Example 3: The probe count travels with the filter
fn example_cross_policy() {
    println!("--- Example 3: Cross-Policy Reads ---");

    let old_policy = BloomFilterPolicy::new(20);
    let new_policy = BloomFilterPolicy::new(8);

    let keys: Vec<String> = (0..100).map(|i| format!("legacy_{}", i)).collect();
    let mut filter = Vec::new();
    old_policy.create_filter(&keys, &mut filter);

    let found = keys
        .iter()
        .filter(|k| new_policy.key_may_match(*k, &filter))
        .count();
    println!(
        "Filter written with {} probes, read by a {}-probe policy: {}/{} keys found",
        old_policy.num_probes(),
        new_policy.num_probes(),
        found,
        keys.len()
    );
    println!();
}
