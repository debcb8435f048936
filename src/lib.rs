//! wordclock_sync: radio time synchronization for a word clock
//!
//! This library decodes a longwave amplitude-modulated time signal sampled
//! from a plain logic line, validates each decoded minute against the local
//! free-running clock and keeps a calendar value that is always valid within
//! 2000 to 2099.
pub mod core;
pub mod line;
pub mod protocol;
pub mod sync;
pub mod time;
pub mod util;

// Re-export commonly used items
pub use core::{ClockConfig, Error, Result};
pub use protocol::RadioTelegramDecoder;
pub use sync::{RadioClock, SyncEvent, SyncQualityGate};
pub use time::CalendarTimestamp;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
