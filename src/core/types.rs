use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use crate::time::CalendarTimestamp;

/// Parity-guarded section of a telegram, reported when decoding fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TelegramField {
    /// Start-of-minute / start-of-time marker bits
    Framing,
    /// Minute BCD block and its parity bit
    Minute,
    /// Hour BCD block and its parity bit
    Hour,
    /// Day, weekday, month and year block with the shared parity bit
    Date,
}

impl TelegramField {
    /// Display corner used to signal this field on the clock face
    pub fn corner(&self) -> u8 {
        match self {
            TelegramField::Minute => 0,
            TelegramField::Hour => 1,
            TelegramField::Date => 2,
            TelegramField::Framing => 3,
        }
    }
}

impl fmt::Display for TelegramField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TelegramField::Framing => "framing",
            TelegramField::Minute => "minute",
            TelegramField::Hour => "hour",
            TelegramField::Date => "date",
        };
        f.write_str(name)
    }
}

/// Configuration for the radio telegram decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Histogram bins per second
    pub bins: usize,
    /// Polls per bin; the host polls `bins * samples_per_bin` times a second
    pub samples_per_bin: usize,
    /// Seconds over which a drift correction may be spread
    pub drift_correction_secs: u32,
    /// Pulses shorter than this are treated as glitches
    pub min_pulse_ms: u32,
    /// Longest pulse still classified as a logical 0
    pub short_pulse_max_ms: u32,
    /// Longest pulse still classified as a logical 1
    pub long_pulse_max_ms: u32,
    /// Invert the line level before accumulating
    pub signal_inverted: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            bins: super::DEFAULT_SIGNAL_BINS,
            samples_per_bin: super::DEFAULT_SAMPLES_PER_BIN,
            drift_correction_secs: super::DEFAULT_DRIFT_CORRECTION_SECS,
            min_pulse_ms: 40,
            short_pulse_max_ms: 150,
            long_pulse_max_ms: 300,
            signal_inverted: false,
        }
    }
}

impl DecoderConfig {
    /// Checks bin count and pulse thresholds for consistency
    pub fn validate(&self) -> Result<()> {
        if !(super::MIN_SIGNAL_BINS..=super::MAX_SIGNAL_BINS).contains(&self.bins) {
            return Err(Error::config(format!(
                "bins must be within {}..={}, got {}",
                super::MIN_SIGNAL_BINS,
                super::MAX_SIGNAL_BINS,
                self.bins
            )));
        }
        if self.samples_per_bin == 0 || self.polls_per_second() > super::MAX_POLLS_PER_SECOND {
            return Err(Error::config(format!(
                "polls per second must be within 1..={}, got {} bins of {} samples",
                super::MAX_POLLS_PER_SECOND,
                self.bins,
                self.samples_per_bin
            )));
        }
        if self.drift_correction_secs == 0 {
            return Err(Error::config("drift correction window must be at least 1 s"));
        }
        if !(self.min_pulse_ms < self.short_pulse_max_ms
            && self.short_pulse_max_ms < self.long_pulse_max_ms
            && self.long_pulse_max_ms < 1000)
        {
            return Err(Error::config("pulse thresholds must be increasing and below 1000 ms"));
        }
        // a single sample must not pass for a pulse
        if self.sample_ms() >= self.min_pulse_ms {
            return Err(Error::config(format!(
                "one sample spans {} ms, not below the {} ms minimum pulse; poll more often",
                self.sample_ms(),
                self.min_pulse_ms
            )));
        }
        Ok(())
    }

    /// Width of one histogram bin in milliseconds
    pub fn bin_ms(&self) -> u32 {
        1000 / self.bins as u32
    }

    /// Number of `poll` calls per second
    pub fn polls_per_second(&self) -> usize {
        self.bins * self.samples_per_bin
    }

    /// Time covered by one sample in milliseconds, rounded up
    pub fn sample_ms(&self) -> u32 {
        let polls = self.polls_per_second().max(1) as u32;
        (1000 + polls - 1) / polls
    }

    /// Period at which the host must call `poll`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(1) / self.polls_per_second().max(1) as u32
    }
}

/// Configuration for the sync quality gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Number of (decoded, local) pairs that must agree
    pub capacity: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            capacity: super::DEFAULT_GATE_CAPACITY,
        }
    }
}

impl GateConfig {
    /// Checks the ring capacity
    pub fn validate(&self) -> Result<()> {
        if self.capacity < 2 {
            return Err(Error::config("gate capacity must be at least 2"));
        }
        Ok(())
    }
}

/// Configuration for the radio clock host loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Decoder settings
    pub decoder: DecoderConfig,
    /// Quality gate settings
    pub gate: GateConfig,
    /// Manual hour shift applied to every decoded timestamp
    pub time_shift_hours: i8,
    /// Age after which the last trusted sync is considered stale
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub max_sync_age: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            decoder: DecoderConfig::default(),
            gate: GateConfig::default(),
            time_shift_hours: 0,
            max_sync_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl ClockConfig {
    /// Validates all nested settings
    pub fn validate(&self) -> Result<()> {
        self.decoder.validate()?;
        self.gate.validate()?;
        if !(-12..=12).contains(&self.time_shift_hours) {
            return Err(Error::config(format!(
                "time shift must be within -12..=12 h, got {}",
                self.time_shift_hours
            )));
        }
        if self.max_sync_age < Duration::from_secs(60) {
            return Err(Error::config("max sync age must be at least one minute"));
        }
        Ok(())
    }
}

/// Clock state the host writes to non-volatile storage after a trusted sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedClock {
    /// Most recently trusted timestamp, stored field by field
    #[serde(serialize_with = "super::serde::serialize_timestamp")]
    #[serde(deserialize_with = "super::serde::deserialize_timestamp")]
    pub timestamp: CalendarTimestamp,
    /// Receiver polarity
    pub signal_inverted: bool,
}

impl PersistedClock {
    /// Encodes the record with bincode
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| Error::persist(format!("Failed to encode clock state: {}", e)))
    }

    /// Decodes a record; the timestamp is loaded raw, see [`PersistedClock::restore`]
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| Error::persist(format!("Failed to decode clock state: {}", e)))
    }

    /// Returns the stored timestamp normalized into a valid calendar value
    pub fn restore(&self) -> CalendarTimestamp {
        let mut timestamp = self.timestamp;
        timestamp.normalize();
        timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_defaults_are_valid() {
        let config = DecoderConfig::default();
        assert_eq!(config.bins, 11);
        assert_eq!(config.drift_correction_secs, 30);
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_ms(), 90);
        assert_eq!(config.polls_per_second(), 55);
        assert_eq!(config.sample_ms(), 19);
    }

    #[test]
    fn test_decoder_config_rejects_bad_bins() {
        let config = DecoderConfig {
            bins: 3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = DecoderConfig {
            bins: 31,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decoder_config_rejects_unordered_thresholds() {
        let config = DecoderConfig {
            short_pulse_max_ms: 350,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval() {
        let config = DecoderConfig {
            bins: 10,
            samples_per_bin: 4,
            ..Default::default()
        };
        assert_eq!(config.polls_per_second(), 40);
        assert_eq!(config.poll_interval(), Duration::from_millis(25));
        assert_eq!(config.sample_ms(), 25);
    }

    #[test]
    fn test_decoder_config_rejects_coarse_sampling() {
        // one poll per bin at 4..=6 bins makes every sample longer than a pulse
        for bins in 4..=6 {
            let config = DecoderConfig {
                bins,
                samples_per_bin: 1,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::Config(_))), "bins {}", bins);
        }

        // the same bins work once each bin is sampled often enough
        let config = DecoderConfig {
            bins: 4,
            samples_per_bin: 10,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(DecoderConfig {
            bins: 4,
            ..Default::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_decoder_config_rejects_excessive_poll_rate() {
        let config = DecoderConfig {
            bins: 30,
            samples_per_bin: 40,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = DecoderConfig {
            samples_per_bin: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gate_capacity_validation() {
        assert!(GateConfig::default().validate().is_ok());
        assert!(GateConfig { capacity: 1 }.validate().is_err());
    }

    #[test]
    fn test_clock_config_time_shift_range() {
        let config = ClockConfig {
            time_shift_hours: 13,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(ClockConfig::default().validate().is_ok());
    }

    #[test]
    fn test_clock_config_from_json() {
        let json = r#"{
            "decoder": { "bins": 20, "signal_inverted": true },
            "time_shift_hours": -1,
            "max_sync_age": 3600.0
        }"#;
        let config: ClockConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.decoder.bins, 20);
        assert!(config.decoder.signal_inverted);
        assert_eq!(config.decoder.drift_correction_secs, 30);
        assert_eq!(config.gate.capacity, 2);
        assert_eq!(config.time_shift_hours, -1);
        assert_eq!(config.max_sync_age, Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_persisted_clock_roundtrip() {
        let state = PersistedClock {
            timestamp: CalendarTimestamp::new(30, 12, 29, 0, 2, 24),
            signal_inverted: true,
        };
        let bytes = state.encode().unwrap();
        assert_eq!(bytes.len(), 7);
        assert_eq!(&bytes[..6], &[30, 12, 29, 4, 2, 24]);

        let decoded = PersistedClock::decode(&bytes).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(decoded.restore(), state.timestamp);
    }

    #[test]
    fn test_persisted_clock_restores_stale_values() {
        // Feb 30th as written by an older firmware
        let bytes = [0u8, 7, 30, 0, 2, 23, 0];
        let state = PersistedClock::decode(&bytes).unwrap();
        assert_eq!(state.timestamp.date(), 30);

        let restored = state.restore();
        assert_eq!((restored.date(), restored.month()), (2, 3));
        assert_eq!(restored.day_of_week(), 4);
    }

    #[test]
    fn test_persisted_clock_rejects_short_input() {
        assert!(matches!(
            PersistedClock::decode(&[1, 2, 3]),
            Err(Error::Persist(_))
        ));
    }
}
