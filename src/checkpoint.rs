//! Checkpoint store: the durable consumer cursor.
//!
//! The checkpoint file holds `<segment_filename> <offset>` marking the
//! first unread byte and is the single source of truth for consumer
//! progress across restarts. Every advance replaces it wholesale via a
//! temp file and rename, so a crash never leaves a half-written cursor.

use std::fs;
use std::io::Write;

use log::debug;

use crate::frame::{self, FRAME_HEADER_SIZE};
use crate::segment::SegmentDirectory;
use crate::{Error, Result};

/// Durable consumer position: the first unread byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointState {
    pub segment: String,
    pub offset: u64,
}

impl CheckpointState {
    /// Token form, as handed to consumers and compared on commit.
    pub fn token(&self) -> String {
        format!("{} {}", self.segment, self.offset)
    }
}

/// Load the checkpoint from disk, or initialize it at the earliest segment
/// (creating one in an empty directory) and persist that.
pub fn load_or_init(dir: &SegmentDirectory) -> Result<CheckpointState> {
    match fs::read_to_string(dir.checkpoint_path()) {
        Ok(text) => parse(&text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let segment = match dir.earliest_segment()? {
                Some(name) => name,
                None => dir.create_segment()?,
            };
            let state = CheckpointState { segment, offset: 0 };
            store(dir, &state)?;
            Ok(state)
        }
        Err(err) => Err(err.into()),
    }
}

/// Persist the checkpoint, replacing the previous file in full.
pub fn store(dir: &SegmentDirectory, state: &CheckpointState) -> Result<()> {
    let path = dir.checkpoint_path();
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp)?;
    file.write_all(state.token().as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp, &path)?;
    Ok(())
}

/// Acknowledge exactly the record the given token was issued for.
///
/// The token must equal the current checkpoint state; anything else is a
/// stale acknowledgment and the checkpoint stays put.
pub fn commit(dir: &SegmentDirectory, state: &mut CheckpointState, token: &str) -> Result<()> {
    if token != state.token() {
        return Err(Error::StaleCheckpoint {
            token: token.to_string(),
            current: state.token(),
        });
    }
    advance(dir, state, 1)
}

/// Move the checkpoint forward by `count` records and persist it.
///
/// An exhausted segment (missing, or offset at its end) first moves the
/// cursor to the start of the next segment — created when none exists —
/// and persists that intermediate position. The whole batch is walked
/// before the final offset is stored; on failure the in-memory cursor is
/// unchanged past the segment advance.
pub fn advance(dir: &SegmentDirectory, state: &mut CheckpointState, count: usize) -> Result<()> {
    let exhausted = match dir.len_of(&state.segment)? {
        Some(len) => state.offset == len,
        None => true,
    };
    if exhausted {
        state.segment = match dir.next_segment(Some(&state.segment))? {
            Some(name) => name,
            None => dir.create_segment()?,
        };
        state.offset = 0;
        store(dir, state)?;
    }

    let mut file = fs::File::open(dir.path_of(&state.segment))?;
    let len = file.metadata()?.len();
    let mut offset = state.offset;
    for _ in 0..count {
        let payload_len =
            frame::read_length(&mut file, offset, &state.segment).map_err(|err| match err {
                Error::Truncated { segment, offset } => Error::IncompleteRecord { segment, offset },
                other => other,
            })?;
        let frame_len = FRAME_HEADER_SIZE + payload_len as u64;
        if len < offset + frame_len {
            return Err(Error::IncompleteRecord {
                segment: state.segment.clone(),
                offset,
            });
        }
        offset += frame_len;
    }
    state.offset = offset;
    store(dir, state)?;
    debug!("checkpoint advanced to {}", state.token());
    Ok(())
}

fn parse(text: &str) -> Result<CheckpointState> {
    let mut parts = text.split_whitespace();
    let segment = parts
        .next()
        .ok_or(Error::Corrupt("checkpoint file missing segment name"))?;
    let offset = parts
        .next()
        .ok_or(Error::Corrupt("checkpoint file missing offset"))?
        .parse::<u64>()
        .map_err(|_| Error::Corrupt("checkpoint offset is not a number"))?;
    Ok(CheckpointState {
        segment: segment.to_string(),
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::writer::{self, WritePosition};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn directory(path: &std::path::Path) -> SegmentDirectory {
        SegmentDirectory::new(path, Arc::new(SystemClock)).expect("directory")
    }

    fn push_all(dir: &SegmentDirectory, pos: &mut WritePosition, payloads: &[&[u8]]) {
        for payload in payloads {
            writer::push(dir, pos, payload, 1024).expect("push");
        }
    }

    #[test]
    fn init_persists_earliest_position() {
        let dir = tempdir().expect("tempdir");
        let segments = directory(dir.path());

        let state = load_or_init(&segments).expect("init");
        assert_eq!(state.offset, 0);
        assert!(segments.checkpoint_path().exists());

        // A reload parses the file back to the same state.
        let reloaded = load_or_init(&segments).expect("reload");
        assert_eq!(reloaded, state);
    }

    #[test]
    fn batch_advance_walks_whole_frames() {
        let dir = tempdir().expect("tempdir");
        let segments = directory(dir.path());
        let mut state = load_or_init(&segments).expect("init");
        let mut pos = writer::recover_position(&segments).expect("recover");
        push_all(&segments, &mut pos, &[b"one", b"two", b"three"]);

        advance(&segments, &mut state, 2).expect("advance two");
        assert_eq!(state.offset, 14);

        advance(&segments, &mut state, 1).expect("advance third");
        assert_eq!(state.offset, 23);
    }

    #[test]
    fn advancing_past_durable_data_is_incomplete() {
        let dir = tempdir().expect("tempdir");
        let segments = directory(dir.path());
        let mut state = load_or_init(&segments).expect("init");
        let mut pos = writer::recover_position(&segments).expect("recover");
        push_all(&segments, &mut pos, &[b"one"]);

        let err = advance(&segments, &mut state, 2).expect_err("advance past tail");
        assert!(matches!(err, Error::IncompleteRecord { .. }));
        // Nothing was persisted for the failed batch.
        assert_eq!(load_or_init(&segments).expect("reload").offset, 0);
    }

    #[test]
    fn mismatched_token_is_stale() {
        let dir = tempdir().expect("tempdir");
        let segments = directory(dir.path());
        let mut state = load_or_init(&segments).expect("init");
        let mut pos = writer::recover_position(&segments).expect("recover");
        push_all(&segments, &mut pos, &[b"one"]);

        let bogus = format!("{} 999", state.segment);
        let err = commit(&segments, &mut state, &bogus).expect_err("stale commit");
        assert!(matches!(err, Error::StaleCheckpoint { .. }));
        assert_eq!(state.offset, 0);
    }
}
