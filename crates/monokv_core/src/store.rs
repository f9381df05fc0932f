//! The store handle.

use crate::compaction::compact;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::index::KeyIndex;
use crate::record::Record;
use crate::scanner::LogScanner;
use fs2::FileExt;
use monokv_storage::{FileBackend, StorageBackend};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Outcome of one entry in a batch [`Store::add`].
#[derive(Debug)]
pub struct AddOutcome {
    /// The key the entry targeted.
    pub key: String,
    /// What happened to the entry.
    pub status: AddStatus,
}

impl AddOutcome {
    /// Returns whether the entry was accepted.
    #[must_use]
    pub fn is_added(&self) -> bool {
        matches!(self.status, AddStatus::Added)
    }
}

/// Per-entry status of a batch add.
#[derive(Debug)]
pub enum AddStatus {
    /// The record was appended and the key is now live.
    Added,
    /// The key was already live; the entry was skipped.
    SkippedDuplicate,
    /// The append failed; the index is unchanged for this key.
    Failed(StoreError),
}

/// An embedded key-value store backed by a single log file.
///
/// A `Store` owns the log file path, the in-memory index of live keys,
/// and an exclusive advisory lock. It is the sole writer of the log for
/// the lifetime of the handle; the index carries no locking of its own,
/// so a handle must not be shared between writers.
///
/// Every remove (and rewrite, which removes first) ends with a
/// compaction pass, and closing the handle compacts once more, so the
/// persisted log never carries logically-dead records past the handle's
/// lifetime. Dropping an unclosed handle performs the final compaction
/// on a best-effort basis; call [`Store::close`] to observe its errors.
///
/// # Example
///
/// ```no_run
/// use monokv_core::{Store, StoreConfig};
///
/// let mut store = Store::open(StoreConfig::new("data/state.kv"))?;
/// store.add([("greeting", b"hello".to_vec())]);
/// let value = store.load("greeting", true)?;
/// store.close()?;
/// # Ok::<(), monokv_core::StoreError>(())
/// ```
pub struct Store {
    /// Resolved log file path.
    path: PathBuf,
    /// Live keys in insertion order.
    index: KeyIndex,
    /// Whether appends fsync the log.
    sync_on_write: bool,
    /// Advisory lock held for the handle's lifetime.
    _lock_file: File,
    /// Set by `close` to disable the drop-time compaction.
    closed: bool,
}

impl Store {
    /// Opens a store for the log described by `config`.
    ///
    /// The open sequence:
    /// 1. Resolve the path, applying the default extension if needed
    /// 2. Create missing ancestor directories
    /// 3. Acquire the exclusive advisory lock
    /// 4. Build the index: empty when `reset` is set or no log exists,
    ///    otherwise from a full scan of the log in file order
    /// 5. Compact, so the on-disk log matches the index from the start
    ///    (with `reset` this supersedes any existing content)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Ancestor directories cannot be created
    /// - Another handle holds the lock (`StoreLocked`)
    /// - An existing log cannot be scanned (`Io`, `LogCorruption`,
    ///   `ChecksumMismatch`) - a missing log is not an error
    /// - The initial compaction fails
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let path = config.resolved_path();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = acquire_lock(&path)?;

        let mut index = KeyIndex::new();
        if !config.reset && path.exists() {
            for result in LogScanner::open(&path)? {
                let (_, record) = result?;
                index.insert(record.key);
            }
        }

        compact(&path, &index)?;

        Ok(Self {
            path,
            index,
            sync_on_write: config.sync_on_write,
            _lock_file: lock_file,
            closed: false,
        })
    }

    /// Adds entries to the store, best effort per entry.
    ///
    /// Each accepted entry is one physical append to the log followed by
    /// an index insert. An entry whose key is already live is skipped; an
    /// entry whose append fails leaves the index unchanged for that key.
    /// Neither aborts the batch. Outcomes are returned in entry order for
    /// programmatic inspection; skips and failures are also logged as
    /// warnings.
    ///
    /// Adding never overwrites: use [`Store::rewrite`] to replace the
    /// value of a live key.
    pub fn add<K, V, I>(&mut self, entries: I) -> Vec<AddOutcome>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let mut outcomes = Vec::new();

        for (key, value) in entries {
            let key = key.into();

            if self.index.contains(&key) {
                warn!("failed to add key ({key}): already exists, use rewrite to overwrite");
                outcomes.push(AddOutcome {
                    key,
                    status: AddStatus::SkippedDuplicate,
                });
                continue;
            }

            let record = Record::new(key.clone(), value.into());
            match self.append_record(&record) {
                Ok(()) => {
                    self.index.insert(key.clone());
                    outcomes.push(AddOutcome {
                        key,
                        status: AddStatus::Added,
                    });
                }
                Err(error) => {
                    warn!("failed to add key ({key}): {error}");
                    outcomes.push(AddOutcome {
                        key,
                        status: AddStatus::Failed(error),
                    });
                }
            }
        }

        outcomes
    }

    /// Loads the value for a key.
    ///
    /// A live key is resolved with one scan of the log, returning the
    /// value of the first matching record. A key that cannot be resolved
    /// fails with `MissingKey` in strict mode and yields `Ok(None)` (plus
    /// a warning) otherwise.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` in strict mode, or a scan error if the log
    /// cannot be read.
    pub fn load(&self, key: &str, strict: bool) -> StoreResult<Option<Vec<u8>>> {
        if self.index.contains(key) {
            for result in LogScanner::open(&self.path)? {
                let (_, record) = result?;
                if record.key == key {
                    return Ok(Some(record.value));
                }
            }
        }

        if strict {
            Err(StoreError::missing_key(key))
        } else {
            warn!("failed to read key ({key})");
            Ok(None)
        }
    }

    /// Loads multiple values with one scan of the log.
    ///
    /// Results come back in request order, regardless of where the
    /// records sit in the log. In strict mode every requested key must be
    /// live; otherwise unresolved positions are `None`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty request or duplicate keys,
    /// `MissingKey` in strict mode when any requested key is not live,
    /// or a scan error if the log cannot be read.
    pub fn loads<S: AsRef<str>>(&self, keys: &[S], strict: bool) -> StoreResult<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Err(StoreError::invalid_argument("at least one key is required"));
        }

        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            if positions.insert(key.as_ref(), i).is_some() {
                return Err(StoreError::invalid_argument(format!(
                    "duplicate key in request: {}",
                    key.as_ref()
                )));
            }
        }

        if strict {
            for key in keys {
                if !self.index.contains(key.as_ref()) {
                    return Err(StoreError::missing_key(key.as_ref()));
                }
            }
        }

        let mut values: Vec<Option<Vec<u8>>> = vec![None; keys.len()];
        let mut unresolved = keys.len();

        for result in LogScanner::open(&self.path)? {
            let (_, record) = result?;
            if let Some(&i) = positions.get(record.key.as_str()) {
                if values[i].is_none() {
                    values[i] = Some(record.value);
                    unresolved -= 1;
                    if unresolved == 0 {
                        break;
                    }
                }
            }
        }

        Ok(values)
    }

    /// Removes a key and purges its record from the log.
    ///
    /// A key that is not live is a no-op; removing is idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the compaction pass fails.
    pub fn remove(&mut self, key: &str) -> StoreResult<()> {
        if self.index.remove(key) {
            compact(&self.path, &self.index)?;
        }
        Ok(())
    }

    /// Replaces the value of a key.
    ///
    /// Equivalent to a remove followed by an add, except that a key that
    /// is not live is left untouched when `should_add` is false. Unlike
    /// batch [`Store::add`], failures propagate.
    ///
    /// This is a delete-then-append, not an atomic in-place update: a
    /// failure between the two steps leaves the key removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal compaction or the append fails.
    pub fn rewrite(&mut self, key: &str, value: impl Into<Vec<u8>>, should_add: bool) -> StoreResult<()> {
        if !self.index.contains(key) && !should_add {
            return Ok(());
        }

        self.remove(key)?;
        self.append_record(&Record::new(key, value.into()))?;
        self.index.insert(key);
        Ok(())
    }

    /// Returns whether a key is live.
    ///
    /// This is an index lookup; the log is never touched.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.index.contains(key)
    }

    /// Returns the live keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys()
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns whether the store holds no live keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns a raw scan over every record in the log.
    ///
    /// No index filtering is applied; between an add and the next
    /// compaction the scan may surface records for keys that are no
    /// longer live (this window is normally empty, since every remove
    /// compacts).
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be opened.
    pub fn iter(&self) -> StoreResult<LogScanner> {
        LogScanner::open(&self.path)
    }

    /// Returns the resolved log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the store, compacting the log a final time.
    ///
    /// # Errors
    ///
    /// Returns an error if the final compaction fails; the handle is
    /// consumed either way.
    pub fn close(mut self) -> StoreResult<()> {
        self.closed = true;
        compact(&self.path, &self.index)?;
        Ok(())
    }

    /// Appends one encoded record to the log.
    fn append_record(&self, record: &Record) -> StoreResult<()> {
        let data = record.encode()?;
        let mut backend = FileBackend::open(&self.path)?;
        backend.append(&data)?;
        backend.flush()?;
        if self.sync_on_write {
            backend.sync()?;
        }
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(error) = compact(&self.path, &self.index) {
            warn!("compaction on drop failed for {:?}: {error}", self.path);
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("keys", &self.index.len())
            .finish_non_exhaustive()
    }
}

/// Acquires the exclusive advisory lock for the log at `path`.
fn acquire_lock(path: &Path) -> StoreResult<File> {
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path_for(path))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(StoreError::StoreLocked);
    }

    Ok(lock_file)
}

/// Returns the lock file path for the log at `path`.
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}
