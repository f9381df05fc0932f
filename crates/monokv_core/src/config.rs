//! Store configuration.

use std::path::PathBuf;

/// Extension applied to log paths that carry none of their own.
pub const DEFAULT_EXTENSION: &str = "kv";

/// Configuration for opening a store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the log file.
    pub path: PathBuf,

    /// Extension applied when `path` has no extension.
    pub default_extension: String,

    /// Whether to start from an empty index, superseding any existing log.
    pub reset: bool,

    /// Whether to fsync the log after every accepted append (safer but slower).
    pub sync_on_write: bool,
}

impl StoreConfig {
    /// Creates a configuration for the given log path with default values.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_extension: DEFAULT_EXTENSION.to_string(),
            reset: false,
            sync_on_write: true,
        }
    }

    /// Sets the extension applied when the path has none.
    #[must_use]
    pub fn default_extension(mut self, extension: impl Into<String>) -> Self {
        self.default_extension = extension.into();
        self
    }

    /// Sets whether to start from an empty index.
    #[must_use]
    pub const fn reset(mut self, value: bool) -> Self {
        self.reset = value;
        self
    }

    /// Sets whether to fsync after every accepted append.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Returns the log path with the default extension applied if needed.
    ///
    /// A path whose file name has no extension (or an empty one, as in
    /// `"state."`) resolves to `<path>.<default_extension>`; any explicit
    /// extension is kept as given.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        let mut path = self.path.clone();
        if path.extension().map_or(true, |ext| ext.is_empty()) {
            path.set_extension(&self.default_extension);
        }
        path
    }
}
