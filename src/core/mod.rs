//! Core types and traits for the radio clock
//!
//! This module contains the error type, configuration and persisted state
//! shared by the decoder, the quality gate and the host loop.

pub mod error;
pub mod types;
pub mod serde;

pub use self::error::{Error, Result};
pub use self::types::{
    ClockConfig,
    DecoderConfig,
    GateConfig,
    PersistedClock,
    TelegramField,
};

/// Default number of histogram bins per second
pub const DEFAULT_SIGNAL_BINS: usize = 11;

/// Fewer bins leave no room for the pulse span inside one window
pub const MIN_SIGNAL_BINS: usize = 4;

/// Finer bins make the phase histogram too flat to locate the pulse onset
pub const MAX_SIGNAL_BINS: usize = 30;

/// Default number of polls per bin
pub const DEFAULT_SAMPLES_PER_BIN: usize = 5;

/// Upper bound on the poll rate; polls beyond it within one second are dropped
pub const MAX_POLLS_PER_SECOND: usize = 1000;

/// Default drift correction window in seconds
pub const DEFAULT_DRIFT_CORRECTION_SECS: u32 = 30;

/// Default number of sample pairs held by the quality gate
pub const DEFAULT_GATE_CAPACITY: usize = 2;
