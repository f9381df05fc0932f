//! Get command implementation.

use monokv_core::{Store, StoreConfig};
use std::io::Write;

/// Runs the get command.
pub fn run(config: StoreConfig, key: &str, strict: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(config)?;

    match store.load(key, strict)? {
        Some(value) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&value)?;
            stdout.write_all(b"\n")?;
        }
        None => println!("(no value)"),
    }

    store.close()?;
    Ok(())
}
