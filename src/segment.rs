//! Segment directory: naming, discovery, creation, and deletion of the
//! segment files under one base directory.
//!
//! Segment filenames encode their creation time at millisecond precision
//! (`yyyyMMddHHmmssSSS.log`, UTC, fixed width), so lexicographic filename
//! order equals creation order. The directory scan is the source of truth
//! for earliest/latest/next; nothing about segment order is persisted
//! anywhere else, which keeps discovery crash-safe.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use log::{debug, warn};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::clock::Clock;
use crate::{Error, Result};

/// Checkpoint marker filename; never treated as a segment.
pub const CHECKPOINT_FILE: &str = "checkpoint";

/// Extension shared by all segment files.
pub const SEGMENT_EXT: &str = "log";

/// Attempts at synthesizing a unique segment name before giving up. Two
/// creations inside the same millisecond collide on the same name; each
/// retry re-reads the clock after a short sleep.
const CREATE_ATTEMPTS: u32 = 10;

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month][day][hour][minute][second][subsecond digits:3]");

/// Returns true for well-formed segment filenames (`<17 digits>.log`).
pub fn is_segment_name(name: &str) -> bool {
    match name.strip_suffix(".log") {
        Some(stem) => !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Owns segment file lifecycle within a base directory. The only component
/// permitted to create or delete segment files.
pub struct SegmentDirectory {
    base: PathBuf,
    clock: Arc<dyn Clock>,
}

impl SegmentDirectory {
    pub fn new(base: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base, clock })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.base.join(CHECKPOINT_FILE)
    }

    /// Length of a segment file, or `None` if it no longer exists.
    pub fn len_of(&self, name: &str) -> Result<Option<u64>> {
        match fs::metadata(self.path_of(name)) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// All segment filenames in creation order.
    pub fn scan(&self) -> Result<Vec<String>> {
        let mut segments = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if is_segment_name(&name) {
                segments.push(name);
            }
        }
        segments.sort_unstable();
        Ok(segments)
    }

    /// Oldest segment by creation order, or `None` if the directory holds
    /// no segments.
    pub fn earliest_segment(&self) -> Result<Option<String>> {
        let mut segments = self.scan()?;
        Ok(if segments.is_empty() {
            None
        } else {
            Some(segments.remove(0))
        })
    }

    /// Newest segment by creation order.
    pub fn latest_segment(&self) -> Result<Option<String>> {
        Ok(self.scan()?.pop())
    }

    /// The lexicographically smallest segment strictly after `after`, or
    /// the smallest overall when `after` is `None`.
    pub fn next_segment(&self, after: Option<&str>) -> Result<Option<String>> {
        let segments = self.scan()?;
        Ok(segments
            .into_iter()
            .find(|name| after.map_or(true, |after| name.as_str() > after)))
    }

    /// Create a fresh, empty segment named after the current wall clock.
    ///
    /// A same-millisecond collision retries with a fresh timestamp; when
    /// the clock refuses to advance the `AlreadyExists` error surfaces
    /// after a bounded number of attempts.
    pub fn create_segment(&self) -> Result<String> {
        for attempt in 0..CREATE_ATTEMPTS {
            let name = self.synthesize_name()?;
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.path_of(&name))
            {
                Ok(_) => {
                    debug!("created segment {name}");
                    return Ok(name);
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("segment name {name} taken (attempt {attempt}), retrying");
                    std::thread::sleep(Duration::from_millis(1));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "segment name collided on every attempt",
        )))
    }

    /// Delete every segment whose modification time predates `threshold`,
    /// except the names in `protected` (the segments currently referenced
    /// by the write position and the checkpoint). The checkpoint marker is
    /// never a candidate. Per-file failures are logged and skipped so one
    /// bad file does not abort the sweep.
    pub fn delete_if_older_than(
        &self,
        threshold: SystemTime,
        protected: &[&str],
    ) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if !is_segment_name(&name) || protected.contains(&name.as_str()) {
                continue;
            }
            let modified = match entry.metadata().and_then(|meta| meta.modified()) {
                Ok(modified) => modified,
                Err(err) => {
                    warn!("cannot read mtime of {name}: {err}");
                    continue;
                }
            };
            if modified >= threshold {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!("deleted segment {name}");
                    deleted.push(name);
                }
                Err(err) => warn!("failed to delete segment {name}: {err}"),
            }
        }
        deleted.sort_unstable();
        Ok(deleted)
    }

    fn synthesize_name(&self) -> Result<String> {
        let stamp = OffsetDateTime::from(self.clock.now())
            .format(&TIMESTAMP_FORMAT)
            .map_err(|_| Error::Corrupt("segment timestamp formatting failed"))?;
        Ok(format!("{stamp}.{SEGMENT_EXT}"))
    }
}
