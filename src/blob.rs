//! Versioned binary encoding for a [`StateEnvelope`] passed to an evaluator
//! subprocess on disk.
//!
//! Layout: a 4-byte magic, a little-endian `u16` format version, a
//! little-endian `u32` CRC32 checksum of the payload, then the
//! `bincode`-encoded payload itself. A reader that finds a bad magic,
//! version, or checksum rejects the blob with [`MachetliError::CriticalError`]
//! rather than attempting to decode and panicking on garbage.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::{MachetliError, Result};
use crate::state::StateEnvelope;

const MAGIC: &[u8; 4] = b"MCH1";
const FORMAT_VERSION: u16 = 1;

/// Encode a state envelope to the versioned blob format.
pub fn encode(state: &StateEnvelope) -> Result<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(state, bincode::config::standard())
        .map_err(|e| MachetliError::CriticalError(format!("failed to encode state blob: {e}")))?;
    let checksum = crc32fast::hash(&payload);

    let mut out = Vec::with_capacity(4 + 2 + 4 + payload.len());
    out.extend_from_slice(MAGIC);
    out.write_u16::<LittleEndian>(FORMAT_VERSION).unwrap();
    out.write_u32::<LittleEndian>(checksum).unwrap();
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode and validate a state envelope from the versioned blob format.
pub fn decode(bytes: &[u8]) -> Result<StateEnvelope> {
    if bytes.len() < 4 + 2 + 4 {
        return Err(MachetliError::CriticalError(
            "state blob is shorter than its header".to_string(),
        ));
    }
    let (magic, rest) = bytes.split_at(4);
    if magic != MAGIC {
        return Err(MachetliError::CriticalError(format!(
            "state blob has bad magic {magic:?}, expected {MAGIC:?}"
        )));
    }

    let mut cursor = rest;
    let version = cursor.read_u16::<LittleEndian>().unwrap();
    if version != FORMAT_VERSION {
        return Err(MachetliError::CriticalError(format!(
            "state blob has version {version}, this build supports only {FORMAT_VERSION}"
        )));
    }
    let checksum = cursor.read_u32::<LittleEndian>().unwrap();
    let payload = cursor;

    let actual = crc32fast::hash(payload);
    if actual != checksum {
        return Err(MachetliError::CriticalError(format!(
            "state blob checksum mismatch: header says {checksum:#010x}, computed {actual:#010x}"
        )));
    }

    let (state, _) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            MachetliError::CriticalError(format!("failed to decode state blob payload: {e}"))
        })?;
    Ok(state)
}
