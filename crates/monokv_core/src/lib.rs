//! # MonoKV Core
//!
//! An embedded key-value store backed by a single on-disk log file.
//!
//! A store is an append-only sequence of self-delimiting records plus an
//! in-memory index of the keys that are currently live. Lookups scan the
//! log; mutations append to it or rewrite it; compaction keeps it
//! minimal by dropping every record whose key is no longer live.
//!
//! ## Record Format
//!
//! ```text
//! | magic (4) | version (2) | length (4) | payload (N) | crc32 (4) |
//! ```
//!
//! with `payload = key_len (4 LE) | key (UTF-8) | value (raw bytes)`.
//!
//! ## Invariants
//!
//! - The log is **append-only** between compactions; compaction is the
//!   only full rewrite, and it swaps the file atomically
//! - After any completed operation the log holds at most one record per
//!   live key
//! - The index is the sole source of truth for existence; records
//!   without a live key are invisible and purged by the next compaction
//! - Scans are streaming: memory stays proportional to one record, not
//!   to the log
//!
//! ## Example
//!
//! ```no_run
//! use monokv_core::{Store, StoreConfig};
//!
//! let mut store = Store::open(StoreConfig::new("data/state.kv"))?;
//! store.add([("alpha", b"1".to_vec()), ("beta", b"2".to_vec())]);
//!
//! let values = store.loads(&["beta", "alpha"], true)?;
//! assert_eq!(values[0].as_deref(), Some(b"2".as_slice()));
//!
//! store.rewrite("alpha", b"replaced".to_vec(), true)?;
//! store.remove("beta")?;
//! store.close()?;
//! # Ok::<(), monokv_core::StoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compaction;
mod config;
mod error;
mod index;
mod record;
mod scanner;
mod store;

pub use compaction::{compact, CompactionResult};
pub use config::{StoreConfig, DEFAULT_EXTENSION};
pub use error::{StoreError, StoreResult};
pub use index::KeyIndex;
pub use record::{Record, LOG_MAGIC, LOG_VERSION};
pub use scanner::LogScanner;
pub use store::{AddOutcome, AddStatus, Store};

/// Crate version, for tooling and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
