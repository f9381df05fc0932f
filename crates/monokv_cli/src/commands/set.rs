//! Set command implementation.

use monokv_core::{Store, StoreConfig};

/// Runs the set command.
///
/// Uses rewrite, so an existing value is replaced and a new key is added.
pub fn run(config: StoreConfig, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = Store::open(config)?;

    store.rewrite(key, value.as_bytes().to_vec(), true)?;
    store.close()?;

    println!("✓ Stored key ({key})");
    Ok(())
}
