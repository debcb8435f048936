//! Synchronization module
//!
//! This module reconciles decoded radio time with the local clock: the
//! [`SyncQualityGate`] decides when a decoded timestamp can be trusted and
//! [`RadioClock`] drives decoder and gate from a signal line.
//!
//! # Examples
//!
//! ```
//! use wordclock_sync::sync::SyncQualityGate;
//! use wordclock_sync::time::CalendarTimestamp;
//!
//! let mut gate = SyncQualityGate::new(2).unwrap();
//! gate.add_sample(
//!     CalendarTimestamp::new(30, 12, 1, 0, 1, 24),
//!     CalendarTimestamp::new(10, 9, 1, 0, 1, 24),
//! );
//! assert!(!gate.samples_ok());
//!
//! gate.add_sample(
//!     CalendarTimestamp::new(31, 12, 1, 0, 1, 24),
//!     CalendarTimestamp::new(11, 9, 1, 0, 1, 24),
//! );
//! assert!(gate.samples_ok());
//! ```

mod gate;
mod manager;

pub use self::gate::SyncQualityGate;
pub use self::manager::{RadioClock, SyncEvent};

/// Utility functions for synchronization
pub mod util {
    use crate::time::CalendarTimestamp;

    /// Signed minutes from `from` to `to`
    pub fn elapsed_minutes(from: &CalendarTimestamp, to: &CalendarTimestamp) -> i64 {
        to.minutes_of_century() as i64 - from.minutes_of_century() as i64
    }
}
