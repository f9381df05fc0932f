//! Inspect command implementation.

use monokv_core::LogScanner;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Runs the inspect command.
///
/// Scanner-based: reports on the log file as it sits on disk without
/// opening (locking, compacting) the store.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("log file not found: {}", path.display()).into());
    }

    let size = fs::metadata(path)?.len();

    let mut records = 0usize;
    let mut bytes_in_values = 0u64;
    let mut distinct_keys: HashSet<String> = HashSet::new();

    for result in LogScanner::open(path)? {
        let (_, record) = result?;
        records += 1;
        bytes_in_values += record.value.len() as u64;
        distinct_keys.insert(record.key);
    }

    println!("Log file:      {}", path.display());
    println!("Size:          {size} bytes");
    println!("Records:       {records}");
    println!("Distinct keys: {}", distinct_keys.len());
    println!("Value bytes:   {bytes_in_values}");

    if records > distinct_keys.len() {
        println!();
        println!(
            "{} stale record(s) present - run compact to reclaim space",
            records - distinct_keys.len()
        );
    }

    Ok(())
}
