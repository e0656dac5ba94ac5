//! Frame codec: `[u32 LE length][payload bytes]`.
//!
//! One frame is one queue record on disk. The length is stored and read as
//! plain unsigned 32-bit; there is no sign bit to normalise.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::{Error, Result};

/// Bytes of length prefix in front of every payload.
pub const FRAME_HEADER_SIZE: u64 = 4;

/// Encode one payload as a frame.
pub fn encode(payload: &[u8], max_segment_size: u32) -> Result<Vec<u8>> {
    if payload.len() as u64 > max_segment_size as u64 {
        return Err(Error::InvalidArgument("payload exceeds max segment size"));
    }
    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE as usize + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Read the length prefix of the frame at `offset`.
///
/// `segment` is the filename carried into the error for diagnostics.
pub fn read_length(file: &mut File, offset: u64, segment: &str) -> Result<u32> {
    let len = file.metadata()?.len();
    if offset + FRAME_HEADER_SIZE > len {
        return Err(Error::Truncated {
            segment: segment.to_string(),
            offset,
        });
    }
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = [0u8; 4];
    file.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Decode the frame at `offset`, returning the payload and the bytes
/// consumed (header plus payload).
pub fn decode(file: &mut File, offset: u64, segment: &str) -> Result<(Vec<u8>, u64)> {
    let payload_len = read_length(file, offset, segment)? as u64;
    let len = file.metadata()?.len();
    if offset + FRAME_HEADER_SIZE + payload_len > len {
        return Err(Error::Truncated {
            segment: segment.to_string(),
            offset,
        });
    }
    let mut payload = vec![0u8; payload_len as usize];
    file.seek(SeekFrom::Start(offset + FRAME_HEADER_SIZE))?;
    file.read_exact(&mut payload)?;
    Ok((payload, FRAME_HEADER_SIZE + payload_len))
}
