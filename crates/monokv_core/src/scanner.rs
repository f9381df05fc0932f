//! Streaming log scanner.
//!
//! Provides constant-memory streaming over log records, reading records
//! one-by-one from a storage backend without loading the entire log into
//! memory. The scanner is used both for index construction at open time
//! and for every lookup, so it must stay memory-proportional to one
//! record rather than to the log.

use crate::error::{StoreError, StoreResult};
use crate::record::{Record, CRC_SIZE, HEADER_SIZE, LOG_MAGIC, LOG_VERSION};
use monokv_storage::{FileBackend, InMemoryBackend, StorageBackend};
use std::path::Path;

/// Read buffer size for streaming iteration.
/// Records are read in chunks to minimize I/O syscalls while keeping
/// memory bounded.
const READ_BUFFER_SIZE: usize = 64 * 1024; // 64 KB

/// A streaming iterator over log records.
///
/// Yields `(offset, Record)` pairs in file order. Each scanner starts
/// from offset zero; reopening the scanner restarts the scan. The
/// underlying storage is never mutated.
///
/// # Error Handling
///
/// A missing log file is a legitimately empty store and produces an
/// empty scan (see [`LogScanner::open`]). A log that is present but
/// damaged is fatal for the scan:
///
/// - Invalid magic bytes or an unsupported version return a corruption error
/// - CRC mismatches return `ChecksumMismatch`
/// - A truncated trailing record returns a corruption error
///
/// Truncation is not tolerated as a clean end-of-log here: the log is
/// rewritten whole by compaction and synced per append, so a short tail
/// means the file was damaged outside the engine's control.
pub struct LogScanner {
    /// Storage backend being scanned.
    backend: Box<dyn StorageBackend>,
    /// Total size of the log.
    total_size: u64,
    /// Current read position in the log.
    current_offset: u64,
    /// Read buffer for reducing I/O syscalls.
    buffer: Vec<u8>,
    /// Current position within the buffer.
    buffer_pos: usize,
    /// Number of valid bytes in the buffer.
    buffer_len: usize,
    /// Whether we've encountered an error or reached the end.
    finished: bool,
}

impl LogScanner {
    /// Creates a scanner over an arbitrary storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend size cannot be determined.
    pub fn new(backend: Box<dyn StorageBackend>) -> StoreResult<Self> {
        let total_size = backend.size()?;
        Ok(Self {
            backend,
            total_size,
            current_offset: 0,
            buffer: vec![0u8; READ_BUFFER_SIZE],
            buffer_pos: 0,
            buffer_len: 0,
            finished: false,
        })
    }

    /// Opens a scanner over the log file at `path`.
    ///
    /// A missing file produces an empty scan rather than an error: a
    /// brand-new store has no log yet.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be opened.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Self::new(Box::new(InMemoryBackend::new()));
        }
        Self::new(Box::new(FileBackend::open(path)?))
    }

    /// Ensures at least `min_bytes` are available in the buffer from the
    /// current position.
    ///
    /// Returns `true` if the requested bytes are available, `false` if
    /// the log ends before them. The buffer is grown past its default
    /// size only when a single record requires it.
    fn ensure_buffered(&mut self, min_bytes: usize) -> StoreResult<bool> {
        let available = self.buffer_len - self.buffer_pos;
        if available >= min_bytes {
            return Ok(true);
        }

        let needed_from_log = min_bytes - available;
        let remaining_in_log = (self.total_size - self.current_offset) as usize - available;

        if remaining_in_log < needed_from_log {
            return Ok(false);
        }

        // Move any remaining data to the start of the buffer
        if self.buffer_pos > 0 && available > 0 {
            self.buffer.copy_within(self.buffer_pos..self.buffer_len, 0);
        }
        self.buffer_len = available;
        self.buffer_pos = 0;

        if min_bytes > self.buffer.len() {
            let new_size = min_bytes.next_power_of_two();
            self.buffer.resize(new_size, 0);
        }

        let bytes_to_read = std::cmp::min(self.buffer.len() - self.buffer_len, remaining_in_log);
        if bytes_to_read > 0 {
            let read_offset = self.current_offset + self.buffer_len as u64;
            let data = self.backend.read_at(read_offset, bytes_to_read)?;
            self.buffer[self.buffer_len..self.buffer_len + data.len()].copy_from_slice(&data);
            self.buffer_len += data.len();
        }

        Ok(self.buffer_len - self.buffer_pos >= min_bytes)
    }

    /// Reads the next record from the log.
    ///
    /// Returns `Ok(Some((offset, record)))` for a valid record,
    /// `Ok(None)` at a clean end of log, `Err(...)` on corruption,
    /// truncation, or I/O error.
    fn read_next_record(&mut self) -> StoreResult<Option<(u64, Record)>> {
        if self.finished {
            return Ok(None);
        }

        // Clean end: the previous record ended exactly at the last byte
        if self.current_offset == self.total_size {
            self.finished = true;
            return Ok(None);
        }

        let record_start = self.current_offset;

        if !self.ensure_buffered(HEADER_SIZE)? {
            self.finished = true;
            return Err(StoreError::log_corruption(format!(
                "truncated record header at offset {record_start}"
            )));
        }

        let header = &self.buffer[self.buffer_pos..self.buffer_pos + HEADER_SIZE];

        if header[0..4] != LOG_MAGIC {
            self.finished = true;
            return Err(StoreError::log_corruption(format!(
                "invalid magic at offset {record_start}"
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version > LOG_VERSION {
            self.finished = true;
            return Err(StoreError::log_corruption(format!(
                "unsupported version {version} at offset {record_start}"
            )));
        }

        let payload_len = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;
        let total_len = HEADER_SIZE + payload_len + CRC_SIZE;

        if !self.ensure_buffered(total_len)? {
            self.finished = true;
            return Err(StoreError::log_corruption(format!(
                "truncated record at offset {record_start}"
            )));
        }

        let payload_start = self.buffer_pos + HEADER_SIZE;
        let payload_end = payload_start + payload_len;
        let crc_start = payload_end;

        let stored_crc = u32::from_le_bytes([
            self.buffer[crc_start],
            self.buffer[crc_start + 1],
            self.buffer[crc_start + 2],
            self.buffer[crc_start + 3],
        ]);

        // CRC covers header + payload
        let computed_crc = crc32fast::hash(&self.buffer[self.buffer_pos..payload_end]);
        if stored_crc != computed_crc {
            self.finished = true;
            return Err(StoreError::ChecksumMismatch {
                expected: stored_crc,
                actual: computed_crc,
            });
        }

        let record = Record::decode_payload(&self.buffer[payload_start..payload_end])?;

        self.buffer_pos += total_len;
        self.current_offset += total_len as u64;

        Ok(Some((record_start, record)))
    }
}

impl Iterator for LogScanner {
    type Item = StoreResult<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_next_record() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for LogScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogScanner")
            .field("total_size", &self.total_size)
            .field("current_offset", &self.current_offset)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn log_bytes(records: &[Record]) -> Vec<u8> {
        let mut data = Vec::new();
        for record in records {
            data.extend(record.encode().unwrap());
        }
        data
    }

    fn scan_all(data: Vec<u8>) -> Vec<(u64, Record)> {
        LogScanner::new(Box::new(InMemoryBackend::with_data(data)))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn empty_backend_yields_nothing() {
        let records = scan_all(Vec::new());
        assert!(records.is_empty());
    }

    #[test]
    fn single_record() {
        let record = Record::new("a", b"1".to_vec());
        let records = scan_all(log_bytes(&[record.clone()]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, 0);
        assert_eq!(records[0].1, record);
    }

    #[test]
    fn multiple_records_in_file_order() {
        let input = vec![
            Record::new("a", b"1".to_vec()),
            Record::new("b", b"2".to_vec()),
            Record::new("c", b"3".to_vec()),
        ];
        let records = scan_all(log_bytes(&input));

        assert_eq!(records.len(), 3);
        for (scanned, expected) in records.iter().zip(input.iter()) {
            assert_eq!(&scanned.1, expected);
        }
    }

    #[test]
    fn offsets_are_record_starts() {
        let input = vec![
            Record::new("a", b"1".to_vec()),
            Record::new("b", b"2".to_vec()),
        ];
        let first_len = input[0].encode().unwrap().len() as u64;
        let records = scan_all(log_bytes(&input));

        assert_eq!(records[0].0, 0);
        assert_eq!(records[1].0, first_len);
    }

    #[test]
    fn record_larger_than_read_buffer() {
        let big = Record::new("big", vec![0xAB; 128 * 1024]);
        let records = scan_all(log_bytes(&[big.clone()]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, big);
    }

    #[test]
    fn truncated_tail_is_fatal() {
        let mut data = log_bytes(&[Record::new("a", b"1".to_vec())]);
        data.truncate(data.len() - 3);

        let mut scanner = LogScanner::new(Box::new(InMemoryBackend::with_data(data))).unwrap();
        let result = scanner.next().unwrap();
        assert!(matches!(result, Err(StoreError::LogCorruption { .. })));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let mut data = log_bytes(&[Record::new("a", b"payload".to_vec())]);
        let idx = data.len() - CRC_SIZE - 1;
        data[idx] ^= 0xFF;

        let mut scanner = LogScanner::new(Box::new(InMemoryBackend::with_data(data))).unwrap();
        let result = scanner.next().unwrap();
        assert!(matches!(result, Err(StoreError::ChecksumMismatch { .. })));
    }

    #[test]
    fn bad_magic_is_fatal() {
        let mut data = log_bytes(&[Record::new("a", b"1".to_vec())]);
        data[0] = b'X';

        let mut scanner = LogScanner::new(Box::new(InMemoryBackend::with_data(data))).unwrap();
        let result = scanner.next().unwrap();
        assert!(matches!(result, Err(StoreError::LogCorruption { .. })));
    }

    #[test]
    fn error_after_valid_records() {
        let mut data = log_bytes(&[
            Record::new("a", b"1".to_vec()),
            Record::new("b", b"2".to_vec()),
        ]);
        data.truncate(data.len() - 2);

        let mut scanner = LogScanner::new(Box::new(InMemoryBackend::with_data(data))).unwrap();
        assert_eq!(scanner.next().unwrap().unwrap().1.key, "a");
        assert!(scanner.next().unwrap().is_err());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn missing_file_is_empty_scan() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.kv");

        let records: Vec<_> = LogScanner::open(&path).unwrap().collect();
        assert!(records.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn scan_is_restartable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.kv");
        std::fs::write(&path, log_bytes(&[Record::new("a", b"1".to_vec())])).unwrap();

        for _ in 0..2 {
            let records: Vec<_> = LogScanner::open(&path)
                .unwrap()
                .map(|r| r.unwrap())
                .collect();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].1.key, "a");
        }
    }
}
