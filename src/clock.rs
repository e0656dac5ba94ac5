use std::time::SystemTime;

/// A source of wall-clock time for the queue.
///
/// Segment filenames are derived from the current time and retention
/// compares file ages against it, so tests can substitute a stepped clock
/// to exercise naming collisions deterministically.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// The default clock, backed by `std::time::SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
