use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The frame (length prefix plus payload) cannot fit an empty segment,
    /// so the record can never be written.
    #[error("record of {len} bytes exceeds max segment size {max}")]
    RecordTooLarge { len: usize, max: u32 },
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The frame at this position extends past the end of the segment.
    /// Readers racing a live writer treat this as "no data yet".
    #[error("truncated frame at offset {offset} in {segment}")]
    Truncated { segment: String, offset: u64 },
    /// Commit found a frame whose bytes are not all durable yet.
    #[error("incomplete record at offset {offset} in {segment}")]
    IncompleteRecord { segment: String, offset: u64 },
    /// The commit token does not match the current checkpoint state; the
    /// caller must re-poll.
    #[error("stale checkpoint token {token:?}, checkpoint is at {current:?}")]
    StaleCheckpoint { token: String, current: String },
    #[error("corrupt state: {0}")]
    Corrupt(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
