use std::fmt;
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

use crate::core::{Error, Result};
use super::SignalLine;

/// Modem status input the receiver output is wired to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemPin {
    /// Data carrier detect
    Dcd,
    /// Clear to send
    Cts,
    /// Data set ready
    Dsr,
    /// Ring indicator
    Ri,
}

impl fmt::Display for ModemPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModemPin::Dcd => "DCD",
            ModemPin::Cts => "CTS",
            ModemPin::Dsr => "DSR",
            ModemPin::Ri => "RI",
        };
        f.write_str(name)
    }
}

/// Receiver attached to a serial port.
///
/// The receiver output drives one modem status input and the receiver is
/// powered from DTR, the usual wiring of hobbyist receiver modules.
pub struct SerialSignalLine {
    port: Box<dyn SerialPort>,
    pin: ModemPin,
}

impl SerialSignalLine {
    /// Opens `device_path` and powers the receiver
    pub fn open(device_path: &str, baud_rate: u32, pin: ModemPin) -> Result<Self> {
        let port = serialport::new(device_path, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| Error::line(format!("Failed to open {}: {}", device_path, e)))?;

        let mut line = SerialSignalLine { port, pin };
        line.set_powered(true)?;
        debug!(device = device_path, %pin, "Receiver line opened");
        Ok(line)
    }

    pub fn pin(&self) -> ModemPin {
        self.pin
    }
}

impl SignalLine for SerialSignalLine {
    fn read_level(&mut self) -> Result<bool> {
        let level = match self.pin {
            ModemPin::Dcd => self.port.read_carrier_detect(),
            ModemPin::Cts => self.port.read_clear_to_send(),
            ModemPin::Dsr => self.port.read_data_set_ready(),
            ModemPin::Ri => self.port.read_ring_indicator(),
        };
        level.map_err(|e| Error::line(format!("Failed to read {}: {}", self.pin, e)))
    }

    fn set_powered(&mut self, powered: bool) -> Result<()> {
        self.port
            .write_data_terminal_ready(powered)
            .map_err(|e| Error::line(format!("Failed to switch receiver power: {}", e)))
    }
}
