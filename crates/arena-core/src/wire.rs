//! Framing for results that cross from an executing instance to the coordinator.
//!
//! ```text
//! +-------+---------+-----------+-----------+-----------------+
//! | "AR"  | version | index u32 | len u32   | JSON body (len) |
//! +-------+---------+-----------+-----------+-----------------+
//! ```
//! Integers are big-endian. A frame is only decoded once all `len` body bytes
//! are present.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub const MAGIC: [u8; 2] = *b"AR";
pub const VERSION: u8 = 1;
pub const HEADER_LEN: usize = 2 + 1 + 4 + 4;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("frame truncated: need {need} bytes, have {have}")]
    Truncated { need: usize, have: usize },
    #[error("frame has {extra} trailing bytes")]
    Trailing { extra: usize },
    #[error("bad frame magic {0:?}")]
    BadMagic([u8; 2]),
    #[error("unsupported frame version {0}")]
    Version(u8),
    #[error("value too large to frame ({0} bytes)")]
    TooLarge(usize),
    #[error("index {0} does not fit in a frame header")]
    IndexOverflow(usize),
    #[error("body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize `value` into a frame tagged with its slot `index`.
pub fn encode<T: Serialize>(index: usize, value: &T) -> Result<Vec<u8>, WireError> {
    let tag = u32::try_from(index).map_err(|_| WireError::IndexOverflow(index))?;
    let body = serde_json::to_vec(value)?;
    let len = u32::try_from(body.len()).map_err(|_| WireError::TooLarge(body.len()))?;

    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&MAGIC);
    frame.push(VERSION);
    frame.extend_from_slice(&tag.to_be_bytes());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Slot index carried in a frame header, without touching the body.
pub fn peek_index(frame: &[u8]) -> Result<usize, WireError> {
    let (index, _) = header(frame)?;
    Ok(index)
}

/// Rebuild `(index, value)` from one complete frame.
pub fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<(usize, T), WireError> {
    let (index, len) = header(frame)?;
    let need = HEADER_LEN + len;
    if frame.len() < need {
        return Err(WireError::Truncated {
            need,
            have: frame.len(),
        });
    }
    if frame.len() > need {
        return Err(WireError::Trailing {
            extra: frame.len() - need,
        });
    }
    let value = serde_json::from_slice(&frame[HEADER_LEN..])?;
    Ok((index, value))
}

fn header(frame: &[u8]) -> Result<(usize, usize), WireError> {
    if frame.len() < HEADER_LEN {
        return Err(WireError::Truncated {
            need: HEADER_LEN,
            have: frame.len(),
        });
    }
    let magic = [frame[0], frame[1]];
    if magic != MAGIC {
        return Err(WireError::BadMagic(magic));
    }
    if frame[2] != VERSION {
        return Err(WireError::Version(frame[2]));
    }
    let index = u32::from_be_bytes([frame[3], frame[4], frame[5], frame[6]]) as usize;
    let len = u32::from_be_bytes([frame[7], frame[8], frame[9], frame[10]]) as usize;
    Ok((index, len))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn nested_value_survives_the_frame() {
        let mut stats = BTreeMap::new();
        stats.insert("states".to_string(), vec![u64::MAX, 0, 17]);
        stats.insert("log\nwith\nnewlines".to_string(), vec![]);

        let frame = encode(41, &stats).unwrap();
        let (index, back): (usize, BTreeMap<String, Vec<u64>>) = decode(&frame).unwrap();
        assert_eq!(index, 41);
        assert_eq!(back, stats);
    }

    #[test]
    fn truncated_frame_is_not_decoded() {
        let frame = encode(0, &"a fairly long string payload").unwrap();
        let err = decode::<String>(&frame[..frame.len() - 1]).unwrap_err();
        assert!(matches!(err, WireError::Truncated { .. }));

        let err = decode::<String>(&frame[..4]).unwrap_err();
        assert!(matches!(err, WireError::Truncated { need: HEADER_LEN, have: 4 }));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut frame = encode(3, &1u8).unwrap();
        frame.push(b'x');
        assert!(matches!(decode::<u8>(&frame), Err(WireError::Trailing { extra: 1 })));
    }

    #[test]
    fn wrong_version_or_magic_is_rejected() {
        let mut frame = encode(3, &1u8).unwrap();
        frame[2] = VERSION + 1;
        assert!(matches!(decode::<u8>(&frame), Err(WireError::Version(_))));

        frame[0] = b'Z';
        assert!(matches!(decode::<u8>(&frame), Err(WireError::BadMagic(_))));
    }

    #[test]
    fn peek_reads_index_only() {
        let frame = encode(9, &"x").unwrap();
        assert_eq!(peek_index(&frame).unwrap(), 9);
    }
}
