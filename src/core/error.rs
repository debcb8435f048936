use std::io;
use thiserror::Error;

use super::types::TelegramField;
use crate::time::CalendarTimestamp;

/// Custom error types for the radio clock core
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No time signal observed")]
    NoSignal,

    #[error("Parity check failed for {0} field")]
    Parity(TelegramField),

    #[error("Decoded {0} field out of range")]
    OutOfRange(TelegramField),

    #[error("Telegram framing error: {0}")]
    Framing(String),

    #[error("Incomplete telegram: {0} bits")]
    TelegramLength(usize),

    #[error("Decoder desynchronized: {0}")]
    Desync(String),

    #[error("Sync not trusted: decoded {decoded}, local {local}")]
    SyncDistrust {
        decoded: CalendarTimestamp,
        local: CalendarTimestamp,
    },

    #[error("Invalid calendar date: {0}")]
    InvalidDate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Persist(String),

    #[error("Signal line error: {0}")]
    Line(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new framing error
    pub fn framing(msg: impl Into<String>) -> Self {
        Error::Framing(msg.into())
    }

    /// Creates a new desynchronization error
    pub fn desync(msg: impl Into<String>) -> Self {
        Error::Desync(msg.into())
    }

    /// Creates a new invalid date error
    pub fn invalid_date(msg: impl Into<String>) -> Self {
        Error::InvalidDate(msg.into())
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a new persistence error
    pub fn persist(msg: impl Into<String>) -> Self {
        Error::Persist(msg.into())
    }

    /// Creates a new signal line error
    pub fn line(msg: impl Into<String>) -> Self {
        Error::Line(msg.into())
    }

    /// Returns true for errors that heal themselves through continued polling.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::NoSignal
                | Error::Parity(_)
                | Error::OutOfRange(_)
                | Error::Framing(_)
                | Error::TelegramLength(_)
                | Error::Desync(_)
                | Error::SyncDistrust { .. }
        )
    }

    /// The telegram field a decode failure points at, if any
    pub fn field(&self) -> Option<TelegramField> {
        match self {
            Error::Parity(field) | Error::OutOfRange(field) => Some(*field),
            Error::Framing(_) => Some(TelegramField::Framing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::desync("test error");
        assert!(matches!(err, Error::Desync(_)));
        assert_eq!(err.to_string(), "Decoder desynchronized: test error");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::Other, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parity_error_reports_field() {
        let err = Error::Parity(TelegramField::Hour);
        assert!(err.is_transient());
        assert_eq!(err.field(), Some(TelegramField::Hour));
        assert_eq!(err.to_string(), "Parity check failed for hour field");
    }

    #[test]
    fn test_distrust_is_transient() {
        let err = Error::SyncDistrust {
            decoded: CalendarTimestamp::new(5, 12, 1, 0, 1, 24),
            local: CalendarTimestamp::new(1, 12, 1, 0, 1, 24),
        };
        assert!(err.is_transient());
        assert_eq!(err.field(), None);
        assert!(err.to_string().contains("12:05 01.01.24"));
    }
}
