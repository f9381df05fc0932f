//! Shared helpers for MonoKV benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Creates deterministic pseudo-random data of the given size.
#[must_use]
pub fn sample_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Creates `count` key-value entries with values of `value_size` bytes.
#[must_use]
pub fn sample_entries(count: usize, value_size: usize) -> Vec<(String, Vec<u8>)> {
    (0..count)
        .map(|i| (format!("key-{i:06}"), sample_data(value_size)))
        .collect()
}
