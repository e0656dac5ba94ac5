//! Append engine: writes frames to the tail of the latest segment and
//! rotates to a fresh segment when a frame would overflow the configured
//! size.
//!
//! The write position lives only in memory. It is rebuilt from the
//! filesystem on startup (latest segment, current file length); segment
//! files are self-describing, so persisting it would add nothing.

use std::fs::OpenOptions;
use std::io::Write;

use log::debug;

use crate::frame::{self, FRAME_HEADER_SIZE};
use crate::segment::SegmentDirectory;
use crate::{Error, Result};

/// In-memory tail of the queue: the segment the next frame lands in and
/// the byte offset it lands at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePosition {
    pub segment: String,
    pub offset: u64,
}

/// Rebuild the write position from the directory: the latest segment (one
/// is created in an empty directory) at its current length.
pub fn recover_position(dir: &SegmentDirectory) -> Result<WritePosition> {
    let segment = match dir.latest_segment()? {
        Some(name) => name,
        None => dir.create_segment()?,
    };
    let offset = dir.len_of(&segment)?.unwrap_or(0);
    Ok(WritePosition { segment, offset })
}

/// Append one record to the current segment, rotating first when the frame
/// would overflow it. Mutates exactly one segment file; never touches the
/// checkpoint.
pub fn push(
    dir: &SegmentDirectory,
    pos: &mut WritePosition,
    payload: &[u8],
    max_segment_size: u32,
) -> Result<()> {
    let frame_len = payload.len() as u64 + FRAME_HEADER_SIZE;
    if frame_len > max_segment_size as u64 {
        return Err(Error::RecordTooLarge {
            len: payload.len(),
            max: max_segment_size,
        });
    }

    if dir.len_of(&pos.segment)?.is_none() {
        // The current segment vanished out from under us (external
        // deletion); start a fresh one.
        pos.segment = dir.create_segment()?;
        pos.offset = 0;
    }

    if pos.offset + frame_len > max_segment_size as u64 {
        debug!("segment {} full at {} bytes, rotating", pos.segment, pos.offset);
        pos.segment = dir.create_segment()?;
        pos.offset = 0;
    }

    let frame = frame::encode(payload, max_segment_size)?;
    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path_of(&pos.segment))?;
    // Length prefix and payload go out as a single append, so a reader at
    // a frame boundary never observes half a frame.
    file.write_all(&frame)?;
    pos.offset += frame_len;
    Ok(())
}
