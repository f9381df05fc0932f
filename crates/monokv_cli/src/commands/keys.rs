//! Keys command implementation.

use monokv_core::{Store, StoreConfig};

/// Runs the keys command.
pub fn run(config: StoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(config)?;

    for key in store.keys() {
        println!("{key}");
    }

    store.close()?;
    Ok(())
}
