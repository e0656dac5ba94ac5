//! `FileQueue`: the public facade wiring the append engine, read cursor,
//! checkpoint store, and retention sweeper together over one directory.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::info;

use crate::checkpoint::{self, CheckpointState};
use crate::clock::{Clock, SystemClock};
use crate::reader;
use crate::retention::{self, RetentionSweeper};
use crate::segment::SegmentDirectory;
use crate::writer::{self, WritePosition};
use crate::{Error, Record, Result};

pub const DEFAULT_MAX_SEGMENT_SIZE: u32 = 64 * 1024 * 1024;
pub const DEFAULT_RETENTION_PERIOD: Duration = Duration::from_secs(7 * 24 * 3600);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Constructor-time queue configuration, immutable for the lifetime of
/// the instance.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Directory holding the segment files and the checkpoint marker.
    pub base_dir: PathBuf,
    /// Upper bound on segment size; every frame fits one segment whole.
    pub max_segment_size: u32,
    /// Age past which a segment becomes eligible for deletion.
    pub retention_period: Duration,
    /// Pause between retention sweeps.
    pub sweep_interval: Duration,
}

impl QueueConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            retention_period: DEFAULT_RETENTION_PERIOD,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// State shared between the caller-facing handle and the sweeper thread.
///
/// The append cursor and the checkpoint cursor take independent locks:
/// they touch disjoint state, and segment creation — the one point where
/// both sides meet — is serialized by the filesystem itself.
pub(crate) struct Shared {
    pub(crate) dir: SegmentDirectory,
    pub(crate) config: QueueConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) append: Mutex<WritePosition>,
    pub(crate) checkpoint: Mutex<CheckpointState>,
}

/// A durable FIFO queue over rotating segment files in one directory.
///
/// Single writer, single consumer cursor. Records survive process
/// restarts; consumer progress is acknowledged record by record through
/// the poll/commit token protocol.
pub struct FileQueue {
    shared: Arc<Shared>,
    _sweeper: RetentionSweeper,
}

impl FileQueue {
    /// Open (or initialize) a queue over `config.base_dir`, rebuilding
    /// both cursors from the filesystem, and start the retention sweeper.
    pub fn open(config: QueueConfig) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`FileQueue::open`] with an explicit time source.
    pub fn open_with_clock(config: QueueConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let dir = SegmentDirectory::new(&config.base_dir, Arc::clone(&clock))?;
        let checkpoint = checkpoint::load_or_init(&dir)?;
        let append = writer::recover_position(&dir)?;
        info!(
            "queue opened at {}: tail {} @{}, checkpoint {}",
            config.base_dir.display(),
            append.segment,
            append.offset,
            checkpoint.token()
        );

        let shared = Arc::new(Shared {
            dir,
            config,
            clock,
            append: Mutex::new(append),
            checkpoint: Mutex::new(checkpoint),
        });
        let sweeper = RetentionSweeper::spawn(Arc::clone(&shared))?;
        Ok(Self {
            shared,
            _sweeper: sweeper,
        })
    }

    /// Append one record to the tail of the queue.
    pub fn push(&self, data: &[u8]) -> Result<()> {
        let mut pos = self
            .shared
            .append
            .lock()
            .map_err(|_| Error::Corrupt("append lock poisoned"))?;
        writer::push(
            &self.shared.dir,
            &mut pos,
            data,
            self.shared.config.max_segment_size,
        )
    }

    /// Return the record at the consumer cursor without acknowledging it.
    ///
    /// Repeated polls return the same record until it is committed.
    pub fn poll(&self) -> Result<Option<Record>> {
        let state = self
            .shared
            .checkpoint
            .lock()
            .map_err(|_| Error::Corrupt("checkpoint lock poisoned"))?;
        reader::peek_next(&self.shared.dir, &state)
    }

    /// Acknowledge the record most recently returned by [`FileQueue::poll`].
    ///
    /// The token must match the current checkpoint exactly; a token from
    /// an already-committed read fails with `StaleCheckpoint` and leaves
    /// the checkpoint untouched.
    pub fn commit(&self, token: &str) -> Result<()> {
        let mut state = self
            .shared
            .checkpoint
            .lock()
            .map_err(|_| Error::Corrupt("checkpoint lock poisoned"))?;
        checkpoint::commit(&self.shared.dir, &mut state, token)
    }

    /// Run one retention sweep immediately, returning the names of the
    /// deleted segments. The background sweeper does the same on its own
    /// schedule.
    pub fn sweep_now(&self) -> Result<Vec<String>> {
        retention::sweep_once(&self.shared)
    }
}
