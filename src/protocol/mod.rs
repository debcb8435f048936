//! Time signal protocol implementation module
//!
//! This module defines the telegram layout of the longwave time signal,
//! encoding/decoding of telegrams, and the statistical bit decoder that
//! recovers telegrams from a sampled signal line.
//!
//! One telegram is transmitted per minute, one bit per second. Each second
//! starts with a carrier reduction of about 100 ms (logical 0) or 200 ms
//! (logical 1); second 59 carries no pulse and marks the start of the next
//! minute. A leap second extends the telegram to 60 bits.

pub mod codec;
pub mod decoder;
pub mod telegram;

pub use self::codec::{encode, TelegramFlags};
pub use self::decoder::{Pulse, RadioTelegramDecoder};
pub use self::telegram::Telegram;

use std::ops::Range;

/// Bits in a regular telegram
pub const TELEGRAM_BITS: usize = 59;

/// Bits in a telegram extended by a leap second
pub const LEAP_TELEGRAM_BITS: usize = 60;

/// Always 0
pub const START_OF_MINUTE_BIT: usize = 0;

/// Summer time in effect
pub const SUMMER_TIME_BIT: usize = 17;

/// Standard time in effect
pub const STANDARD_TIME_BIT: usize = 18;

/// Always 1
pub const START_OF_TIME_BIT: usize = 20;

/// Minute BCD, weights 1, 2, 4, 8, 10, 20, 40
pub const MINUTE_BITS: Range<usize> = 21..28;

/// Even parity over the minute bits
pub const MINUTE_PARITY_BIT: usize = 28;

/// Hour BCD, weights 1, 2, 4, 8, 10, 20
pub const HOUR_BITS: Range<usize> = 29..35;

/// Even parity over the hour bits
pub const HOUR_PARITY_BIT: usize = 35;

/// Day of month BCD, weights 1, 2, 4, 8, 10, 20
pub const DAY_BITS: Range<usize> = 36..42;

/// Day of week, weights 1, 2, 4
pub const WEEKDAY_BITS: Range<usize> = 42..45;

/// Month BCD, weights 1, 2, 4, 8, 10
pub const MONTH_BITS: Range<usize> = 45..50;

/// Year BCD, weights 1, 2, 4, 8, 10, 20, 40, 80
pub const YEAR_BITS: Range<usize> = 50..58;

/// Even parity over day, weekday, month and year
pub const DATE_PARITY_BIT: usize = 58;

/// Always 0; only present in 60 bit telegrams
pub const LEAP_SECOND_BIT: usize = 59;
