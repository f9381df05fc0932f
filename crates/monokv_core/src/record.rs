//! Record types and serialization.

use crate::error::{StoreError, StoreResult};

/// Magic bytes identifying a log record.
pub const LOG_MAGIC: [u8; 4] = *b"MKVL";

/// Current log format version.
pub const LOG_VERSION: u16 = 1;

/// Header size for log records.
/// magic (4) + version (2) + length (4) = 10 bytes
pub(crate) const HEADER_SIZE: usize = 10;

/// CRC size.
pub(crate) const CRC_SIZE: usize = 4;

/// One key-value pair as stored physically in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The key, unique among live records.
    pub key: String,
    /// The value; opaque bytes to the engine.
    pub value: Vec<u8>,
}

impl Record {
    /// Maximum size for a record payload.
    ///
    /// Payloads larger than this are rejected with an error. This limit
    /// exists because the framing uses a 4-byte length field.
    pub const MAX_PAYLOAD_SIZE: usize = u32::MAX as usize;

    /// Creates a record from a key and an opaque value.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Serializes the record payload (without envelope).
    ///
    /// Layout: `key_len (4 LE) | key (UTF-8) | value (raw bytes)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key or the total payload exceeds
    /// [`Self::MAX_PAYLOAD_SIZE`].
    pub fn encode_payload(&self) -> StoreResult<Vec<u8>> {
        let key_bytes = self.key.as_bytes();
        if key_bytes.len() > Self::MAX_PAYLOAD_SIZE - 4
            || self.value.len() > Self::MAX_PAYLOAD_SIZE - 4 - key_bytes.len()
        {
            return Err(StoreError::invalid_argument(format!(
                "record for key ({}) exceeds maximum payload size",
                self.key
            )));
        }

        let mut buf = Vec::with_capacity(4 + key_bytes.len() + self.value.len());
        let key_len = key_bytes.len() as u32;
        buf.extend_from_slice(&key_len.to_le_bytes());
        buf.extend_from_slice(key_bytes);
        buf.extend_from_slice(&self.value);
        Ok(buf)
    }

    /// Deserializes a record from its payload bytes.
    ///
    /// # Errors
    ///
    /// Returns a corruption error if the payload is shorter than its key
    /// length claims or the key is not valid UTF-8.
    pub fn decode_payload(payload: &[u8]) -> StoreResult<Self> {
        if payload.len() < 4 {
            return Err(StoreError::log_corruption("payload shorter than key length"));
        }

        let key_len =
            u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
        if 4 + key_len > payload.len() {
            return Err(StoreError::log_corruption(format!(
                "key length {} exceeds payload of {} bytes",
                key_len,
                payload.len()
            )));
        }

        let key = std::str::from_utf8(&payload[4..4 + key_len])
            .map_err(|_| StoreError::log_corruption("key is not valid UTF-8"))?
            .to_string();
        let value = payload[4 + key_len..].to_vec();

        Ok(Self { key, value })
    }

    /// Serializes the record with its full envelope.
    ///
    /// Layout: `magic (4) | version (2) | length (4) | payload | crc32 (4)`,
    /// with the CRC computed over header and payload.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let payload = self.encode_payload()?;

        let mut data = Vec::with_capacity(HEADER_SIZE + payload.len() + CRC_SIZE);
        data.extend_from_slice(&LOG_MAGIC);
        data.extend_from_slice(&LOG_VERSION.to_le_bytes());

        let len = payload.len() as u32;
        data.extend_from_slice(&len.to_le_bytes());
        data.extend_from_slice(&payload);

        let crc = crc32fast::hash(&data);
        data.extend_from_slice(&crc.to_le_bytes());

        Ok(data)
    }
}
