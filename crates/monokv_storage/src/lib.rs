//! # MonoKV Storage
//!
//! Byte-store backends for MonoKV.
//!
//! This crate provides the lowest-level storage abstraction for MonoKV.
//! Backends are **opaque byte stores** - they do not interpret the data
//! they hold. All knowledge of the record log format lives in
//! `monokv_core`; a backend only knows how to append bytes, read bytes
//! back at an offset, and make them durable.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - Persistent storage using OS file APIs
//! - [`InMemoryBackend`] - For tests and ephemeral stores
//!
//! ## Example
//!
//! ```rust
//! use monokv_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
