//! Remove command implementation.

use monokv_core::{Store, StoreConfig};

/// Runs the remove command.
///
/// Removing a key that does not exist is a no-op.
pub fn run(config: StoreConfig, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = Store::open(config)?;

    let existed = store.exists(key);
    store.remove(key)?;
    store.close()?;

    if existed {
        println!("✓ Removed key ({key})");
    } else {
        println!("Key ({key}) does not exist - nothing to do");
    }
    Ok(())
}
