//! Signal line sources
//!
//! A [`SignalLine`] delivers the demodulated receiver output as a logic level,
//! one read per decoder poll. [`SerialSignalLine`] reads a receiver wired to a
//! modem status pin of a serial port; [`SimulatedTransmitter`] synthesizes the
//! broadcast for tests and demos.

mod serial;
mod simulated;

pub use self::serial::{ModemPin, SerialSignalLine};
pub use self::simulated::SimulatedTransmitter;

use crate::core::Result;

/// Source of receiver output levels
pub trait SignalLine {
    /// Samples the current level; `true` while the carrier is reduced
    fn read_level(&mut self) -> Result<bool>;

    /// Switches receiver power, if the line controls it
    fn set_powered(&mut self, _powered: bool) -> Result<()> {
        Ok(())
    }
}

impl<L: SignalLine + ?Sized> SignalLine for Box<L> {
    fn read_level(&mut self) -> Result<bool> {
        (**self).read_level()
    }

    fn set_powered(&mut self, powered: bool) -> Result<()> {
        (**self).set_powered(powered)
    }
}
