//! Retention sweeper: a background thread that periodically deletes
//! segments older than the retention window.
//!
//! Deletion is purely age-based with three exclusions: the checkpoint
//! marker, the segment currently written to, and the segment the
//! checkpoint points at. Any other segment past the window is deleted
//! even if it still holds unread records; a consumer lagging further than
//! the retention period loses them. That hazard is inherited from the
//! original design and intentionally not papered over here.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, warn};

use crate::queue::Shared;
use crate::{Error, Result};

/// Handle to the background sweep thread. Dropping it signals the thread
/// and joins it, so shutdown is deterministic.
pub struct RetentionSweeper {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl RetentionSweeper {
    pub(crate) fn spawn(shared: Arc<Shared>) -> Result<Self> {
        let (stop, ticks) = mpsc::channel::<()>();
        let interval = shared.config.sweep_interval;
        let handle = std::thread::Builder::new()
            .name("diskqueue-retention".into())
            .spawn(move || loop {
                match ticks.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(err) = sweep_once(&shared) {
                            warn!("retention sweep failed: {err}");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for RetentionSweeper {
    fn drop(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Run one sweep: snapshot the two live segment names under their locks,
/// then scan and delete without holding either.
pub(crate) fn sweep_once(shared: &Shared) -> Result<Vec<String>> {
    let threshold = match shared.clock.now().checked_sub(shared.config.retention_period) {
        Some(threshold) => threshold,
        // A window reaching before the epoch can never age anything out.
        None => return Ok(Vec::new()),
    };

    let write_segment = shared
        .append
        .lock()
        .map_err(|_| Error::Corrupt("append lock poisoned"))?
        .segment
        .clone();
    let checkpoint_segment = shared
        .checkpoint
        .lock()
        .map_err(|_| Error::Corrupt("checkpoint lock poisoned"))?
        .segment
        .clone();
    let protected = [write_segment.as_str(), checkpoint_segment.as_str()];

    let deleted = shared.dir.delete_if_older_than(threshold, &protected)?;
    if !deleted.is_empty() {
        debug!("retention removed {} segment(s)", deleted.len());
    }
    Ok(deleted)
}
