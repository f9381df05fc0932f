//! Log compaction.
//!
//! Compaction rewrites the log so it contains only records whose key is
//! currently live, reclaiming the space held by overwritten and removed
//! keys.
//!
//! ## Invariants
//!
//! - Compaction **MUST NOT** change logical state
//! - Surviving records keep their original relative order
//! - The log is replaced atomically: a crash at any point leaves either
//!   the old log or the new one, never a mixture
//! - The temporary file never outlives the call

use crate::error::StoreResult;
use crate::index::KeyIndex;
use crate::scanner::LogScanner;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of the temporary file written next to the log.
const TEMP_SUFFIX: &str = ".compact";

/// Result of a compaction pass.
#[derive(Debug)]
pub struct CompactionResult {
    /// Number of records in the input log.
    pub input_records: usize,
    /// Number of records in the rewritten log.
    pub output_records: usize,
    /// Log size before compaction, in bytes.
    pub bytes_before: u64,
    /// Log size after compaction, in bytes.
    pub bytes_after: u64,
}

impl CompactionResult {
    /// Returns the number of bytes reclaimed by the pass.
    #[must_use]
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Rewrites the log at `path` to contain only records with live keys.
///
/// The existing log is streamed once; every record whose key is present
/// in `index` is written unchanged, in original order, to a temporary
/// file in the same directory. The temporary file is synced and then
/// atomically renamed over the log, and the parent directory is fsynced
/// so the swap survives a crash. A missing log behaves as empty, so
/// compacting a brand-new store creates its (empty) log file.
///
/// # Errors
///
/// Returns an error on any read, decode, write, or rename failure. The
/// temporary file is removed before the error is returned.
pub fn compact(path: &Path, index: &KeyIndex) -> StoreResult<CompactionResult> {
    let bytes_before = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let temp_path = temp_path_for(path);

    match rewrite_live(path, index, &temp_path) {
        Ok((input_records, output_records, bytes_after)) => {
            let result = CompactionResult {
                input_records,
                output_records,
                bytes_before,
                bytes_after,
            };
            debug!(
                "compacted log: {} -> {} records, {} bytes reclaimed",
                result.input_records,
                result.output_records,
                result.bytes_reclaimed()
            );
            Ok(result)
        }
        Err(error) => {
            let _ = fs::remove_file(&temp_path);
            Err(error)
        }
    }
}

/// Streams live records into the temp file and swaps it over the log.
fn rewrite_live(
    path: &Path,
    index: &KeyIndex,
    temp_path: &Path,
) -> StoreResult<(usize, usize, u64)> {
    let mut input_records = 0usize;
    let mut output_records = 0usize;
    let mut bytes_after = 0u64;

    {
        // File::create truncates a leftover temp file from an interrupted run
        let mut temp = File::create(temp_path)?;

        for result in LogScanner::open(path)? {
            let (_, record) = result?;
            input_records += 1;

            if index.contains(&record.key) {
                let data = record.encode()?;
                temp.write_all(&data)?;
                bytes_after += data.len() as u64;
                output_records += 1;
            }
        }

        temp.sync_all()?;
    }

    fs::rename(temp_path, path)?;
    sync_parent_dir(path)?;

    Ok((input_records, output_records, bytes_after))
}

/// Returns the temporary file path written alongside the log.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

/// Fsyncs the log's parent directory so the rename is durable.
///
/// On Windows, directory fsync is not supported; the NTFS journal
/// provides metadata durability for rename operations.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> StoreResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let dir = File::open(parent)?;
    dir.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> StoreResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use tempfile::tempdir;

    fn write_log(path: &Path, records: &[Record]) {
        let mut data = Vec::new();
        for record in records {
            data.extend(record.encode().unwrap());
        }
        fs::write(path, data).unwrap();
    }

    fn scan_keys(path: &Path) -> Vec<String> {
        LogScanner::open(path)
            .unwrap()
            .map(|r| r.unwrap().1.key)
            .collect()
    }

    #[test]
    fn drops_records_without_live_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.kv");
        write_log(
            &path,
            &[
                Record::new("a", b"1".to_vec()),
                Record::new("b", b"2".to_vec()),
                Record::new("c", b"3".to_vec()),
            ],
        );

        let mut index = KeyIndex::new();
        index.insert("a");
        index.insert("c");

        let result = compact(&path, &index).unwrap();
        assert_eq!(result.input_records, 3);
        assert_eq!(result.output_records, 2);
        assert!(result.bytes_reclaimed() > 0);

        assert_eq!(scan_keys(&path), vec!["a", "c"]);
    }

    #[test]
    fn preserves_physical_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.kv");
        write_log(
            &path,
            &[
                Record::new("z", b"1".to_vec()),
                Record::new("m", b"2".to_vec()),
                Record::new("a", b"3".to_vec()),
            ],
        );

        let mut index = KeyIndex::new();
        index.insert("a");
        index.insert("m");
        index.insert("z");

        compact(&path, &index).unwrap();
        assert_eq!(scan_keys(&path), vec!["z", "m", "a"]);
    }

    #[test]
    fn empty_index_empties_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.kv");
        write_log(&path, &[Record::new("a", b"1".to_vec())]);

        let result = compact(&path, &KeyIndex::new()).unwrap();
        assert_eq!(result.output_records, 0);
        assert_eq!(result.bytes_after, 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn missing_log_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.kv");

        let result = compact(&path, &KeyIndex::new()).unwrap();
        assert_eq!(result.input_records, 0);
        assert_eq!(result.bytes_before, 0);
        assert!(path.exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn temp_file_not_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.kv");
        write_log(&path, &[Record::new("a", b"1".to_vec())]);

        let mut index = KeyIndex::new();
        index.insert("a");
        compact(&path, &index).unwrap();

        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn leftover_temp_file_is_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.kv");
        write_log(&path, &[Record::new("a", b"1".to_vec())]);
        fs::write(temp_path_for(&path), b"stale garbage").unwrap();

        let mut index = KeyIndex::new();
        index.insert("a");
        compact(&path, &index).unwrap();

        assert_eq!(scan_keys(&path), vec!["a"]);
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn corrupt_log_aborts_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.kv");
        let mut data = Record::new("a", b"1".to_vec()).encode().unwrap();
        data.truncate(data.len() - 2);
        fs::write(&path, &data).unwrap();

        let mut index = KeyIndex::new();
        index.insert("a");

        let result = compact(&path, &index);
        assert!(result.is_err());
        assert!(!temp_path_for(&path).exists());
        // Original log untouched
        assert_eq!(fs::read(&path).unwrap(), data);
    }
}
