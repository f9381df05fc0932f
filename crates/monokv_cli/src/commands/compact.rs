//! Compact command implementation.

use monokv_core::{Store, StoreConfig};
use std::fs;

/// Runs the compact command.
///
/// Opening the store compacts the log against the rebuilt index and
/// closing compacts once more, so an open/close cycle is a full pass.
pub fn run(config: StoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    let path = config.resolved_path();
    let bytes_before = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    let store = Store::open(config)?;
    let live_keys = store.len();
    store.close()?;

    let bytes_after = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    println!("Log file:  {}", path.display());
    println!("Live keys: {live_keys}");
    println!("Size:      {bytes_before} -> {bytes_after} bytes");
    println!(
        "✓ Compaction complete ({} bytes reclaimed)",
        bytes_before.saturating_sub(bytes_after)
    );

    Ok(())
}
