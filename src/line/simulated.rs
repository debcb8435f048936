use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Bernoulli;

use crate::core::{DecoderConfig, Error, Result};
use crate::protocol::{encode, Telegram, TelegramFlags};
use crate::time::CalendarTimestamp;
use super::SignalLine;

const SHORT_PULSE_MS: usize = 100;
const LONG_PULSE_MS: usize = 200;

/// Synthetic time signal broadcast.
///
/// Produces one level per decoder poll for consecutive minutes starting at a
/// given timestamp, beginning with second 0 of the telegram that announces
/// it. Pulse widths are rounded to whole samples; any configuration that
/// passes [`DecoderConfig::validate`] samples fast enough to keep 100 ms and
/// 200 ms pulses apart.
pub struct SimulatedTransmitter {
    samples_per_bin: usize,
    samples_per_second: usize,
    timestamp: CalendarTimestamp,
    flags: TelegramFlags,
    telegram: Telegram,
    /// Index of the next second to start
    second: usize,
    /// Samples left until the next second starts
    pending: usize,
    high_remaining: usize,
    inverted: bool,
    flipped_bit: Option<usize>,
    noise: Option<(Bernoulli, StdRng)>,
}

impl SimulatedTransmitter {
    /// Creates a transmitter broadcasting `start`, sampled at the poll rate
    /// of `config`
    pub fn new(start: CalendarTimestamp, config: &DecoderConfig) -> Self {
        let flags = TelegramFlags::default();
        let samples_per_bin = config.samples_per_bin.max(1);
        SimulatedTransmitter {
            samples_per_bin,
            samples_per_second: (config.bins * samples_per_bin).max(1),
            timestamp: start,
            flags,
            telegram: encode(&start, flags),
            second: 0,
            pending: 0,
            high_remaining: 0,
            inverted: false,
            flipped_bit: None,
            noise: None,
        }
    }

    /// Starts each pulse `phase` bins into the second
    pub fn with_phase(mut self, phase: usize) -> Self {
        self.pending = phase * self.samples_per_bin % self.samples_per_second;
        self
    }

    /// Emits the inverted level, as receivers with an open collector output do
    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    /// Inserts a leap second into the first minute
    pub fn with_leap_second(mut self) -> Self {
        self.flags.leap_second = true;
        self.telegram = encode(&self.timestamp, self.flags);
        self
    }

    /// Transmits bit `index` of every telegram inverted
    pub fn with_flipped_bit(mut self, index: usize) -> Self {
        self.flipped_bit = Some(index);
        self
    }

    /// Flips each sample with `probability`, reproducibly for a given seed
    pub fn with_noise(mut self, probability: f64, seed: u64) -> Result<Self> {
        let distribution = Bernoulli::new(probability)
            .map_err(|e| Error::config(format!("Invalid noise probability: {}", e)))?;
        self.noise = Some((distribution, StdRng::seed_from_u64(seed)));
        Ok(self)
    }

    /// Stretches the current second by `samples`, shifting all later pulses
    pub fn delay(&mut self, samples: usize) {
        self.pending += samples;
    }

    pub fn samples_per_second(&self) -> usize {
        self.samples_per_second
    }

    /// Minute announced by the telegram currently on air
    pub fn timestamp(&self) -> CalendarTimestamp {
        self.timestamp
    }

    /// Level of the next sample
    pub fn next_level(&mut self) -> bool {
        if self.pending == 0 {
            self.start_second();
            self.pending = self.samples_per_second;
        }
        self.pending -= 1;

        let mut level = self.high_remaining > 0;
        if level {
            self.high_remaining -= 1;
        }
        if let Some((distribution, rng)) = &mut self.noise {
            if distribution.sample(rng) {
                level = !level;
            }
        }
        level != self.inverted
    }

    fn start_second(&mut self) {
        let len = self.telegram.len();
        self.high_remaining = match self.telegram.bit(self.second) {
            Some(bit) => {
                let bit = bit != (self.flipped_bit == Some(self.second));
                self.pulse_samples(if bit { LONG_PULSE_MS } else { SHORT_PULSE_MS })
            }
            // minute marker
            None => 0,
        };

        self.second += 1;
        if self.second > len {
            self.second = 0;
            self.timestamp.advance_minute();
            self.flags.leap_second = false;
            self.telegram = encode(&self.timestamp, self.flags);
        }
    }

    fn pulse_samples(&self, ms: usize) -> usize {
        ((ms * self.samples_per_second + 500) / 1000).max(1)
    }
}

impl SignalLine for SimulatedTransmitter {
    fn read_level(&mut self) -> Result<bool> {
        Ok(self.next_level())
    }
}
