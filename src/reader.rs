//! Read cursor: decodes the frame at the checkpoint position, crossing
//! into the following segment when the current one is exhausted.
//!
//! Peeking never mutates persisted state; only a commit moves the
//! checkpoint, so repeated peeks keep returning the same record.

use std::fs::File;

use crate::checkpoint::CheckpointState;
use crate::frame::{self, FRAME_HEADER_SIZE};
use crate::segment::SegmentDirectory;
use crate::{Error, Result};

/// One record handed to the consumer.
///
/// The token captures the exact checkpoint state this read was taken
/// against and must be presented back to acknowledge the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub token: String,
    pub payload: Vec<u8>,
    pub size: usize,
}

/// Return the next unacknowledged record, or `None` when the queue is
/// empty (or the next frame is not fully written yet).
pub fn peek_next(dir: &SegmentDirectory, checkpoint: &CheckpointState) -> Result<Option<Record>> {
    let token = checkpoint.token();
    let mut segment = checkpoint.segment.clone();
    let mut offset = checkpoint.offset;

    match dir.len_of(&segment)? {
        Some(len) if offset != len => {}
        _ => {
            // Exhausted or deleted: read from the start of the next
            // segment for this peek only. The checkpoint itself advances
            // on commit.
            segment = match dir.next_segment(Some(&segment))? {
                Some(next) => next,
                None => return Ok(None),
            };
            offset = 0;
        }
    }

    let len = match dir.len_of(&segment)? {
        Some(len) => len,
        None => return Ok(None),
    };
    if len < offset + FRAME_HEADER_SIZE {
        // Not even a length prefix yet; a writer may be mid-append.
        return Ok(None);
    }

    let mut file = File::open(dir.path_of(&segment))?;
    match frame::decode(&mut file, offset, &segment) {
        Ok((payload, _)) => Ok(Some(Record {
            token,
            size: payload.len(),
            payload,
        })),
        // A partially visible frame is "no data yet", not a fault.
        Err(Error::Truncated { .. }) => Ok(None),
        Err(err) => Err(err),
    }
}
