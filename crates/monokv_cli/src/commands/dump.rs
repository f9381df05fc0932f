//! Dump command implementation.

use monokv_core::LogScanner;
use std::path::Path;

/// Runs the dump command.
///
/// Reads the raw log directly; the store is not opened, so dumping never
/// locks or compacts anything. Records are printed in physical order,
/// which means stale records not yet purged by compaction show up too.
pub fn run(path: &Path, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let mut count = 0usize;

    for result in LogScanner::open(path)? {
        if let Some(limit) = limit {
            if count >= limit {
                println!("... (stopped after {limit} records)");
                break;
            }
        }

        let (_, record) = result?;
        println!("{}: {}", record.key, String::from_utf8_lossy(&record.value));
        count += 1;
    }

    if count == 0 {
        println!("(empty log)");
    }

    Ok(())
}
