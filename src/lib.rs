//! Durable file-backed FIFO queue.
//!
//! Records are appended as length-prefixed frames to rotating segment
//! files; a single durable checkpoint tracks consumer progress across
//! restarts; a background sweeper reclaims segments past the retention
//! window.
//!
//! ```no_run
//! use diskqueue::{FileQueue, QueueConfig};
//!
//! # fn main() -> diskqueue::Result<()> {
//! let queue = FileQueue::open(QueueConfig::new("logs"))?;
//! queue.push(b"hello")?;
//! if let Some(record) = queue.poll()? {
//!     queue.commit(&record.token)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod clock;
pub mod error;
pub mod frame;
pub mod queue;
pub mod reader;
pub mod retention;
pub mod segment;
pub mod writer;

pub use clock::{Clock, SystemClock};
pub use error::{Error, Result};
pub use queue::{FileQueue, QueueConfig};
pub use reader::Record;
