use tracing::{debug, trace, warn};

use crate::core::{DecoderConfig, Error, Result, TelegramField, MAX_POLLS_PER_SECOND};
use crate::time::CalendarTimestamp;
use super::telegram::Telegram;

/// Classification of one second of signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    /// No carrier reduction; a minute marker or a lost signal
    Silence,
    /// Short reduction, logical 0
    Zero,
    /// Long reduction, logical 1
    One,
    /// Reduction longer than any valid pulse
    Noise,
}

/// Fixed point scale of a slot's high fraction
const FRACTION_ONE: u32 = 256;

/// Statistical radio telegram decoder.
///
/// The host samples the receiver several times per bin through
/// [`poll`](Self::poll) and closes each second with
/// [`new_cycle`](Self::new_cycle), which spreads the samples over the bins of
/// that second. Each cycle measures the high mass in a one-second window of
/// the last two seconds, around the point where the pulse is expected to
/// start. Where that point lies is learned from a phase histogram summed over
/// the drift correction window, so neither a single glitch nor a single
/// missing pulse can move it, and the host needs neither interrupts nor a
/// clock locked to the transmitter.
#[derive(Debug)]
pub struct RadioTelegramDecoder {
    config: DecoderConfig,
    /// Levels polled since the last cycle, after inversion
    levels: Vec<bool>,
    /// Count of high samples per slot, previous second then current second
    high: Vec<u16>,
    /// Count of all samples per slot
    samples: Vec<u16>,
    /// High fraction per sub-second slot summed over the correction window
    phase: Vec<u32>,
    window_cycles: u32,
    offset: usize,
    locked: bool,
    telegram: Telegram,
    silent_cycles: u32,
    last_level: bool,
    last_pulse: Option<Pulse>,
    error_field: Option<TelegramField>,
    enabled: bool,
}

impl RadioTelegramDecoder {
    /// Creates a decoder after validating `config`
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        let bins = config.bins;
        Ok(RadioTelegramDecoder {
            levels: Vec::with_capacity(config.polls_per_second()),
            high: vec![0; 2 * bins],
            samples: vec![0; 2 * bins],
            phase: vec![0; bins],
            window_cycles: 0,
            offset: 0,
            locked: false,
            telegram: Telegram::new(),
            silent_cycles: 0,
            last_level: false,
            last_pulse: None,
            error_field: None,
            enabled: true,
            config,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Records one sample of the receiver output. Samples are assigned to
    /// bins by their position within the second when the cycle closes.
    pub fn poll(&mut self, level: bool) {
        if !self.enabled {
            return;
        }
        self.last_level = level;
        if self.levels.len() < MAX_POLLS_PER_SECOND {
            self.levels.push(level != self.config.signal_inverted);
        }
    }

    /// Closes the current second.
    ///
    /// Returns the decoded timestamp when this second carried the minute
    /// marker of a complete telegram, `Ok(None)` while a telegram is still
    /// being received.
    pub fn new_cycle(&mut self) -> Result<Option<CalendarTimestamp>> {
        if !self.enabled {
            return Ok(None);
        }
        self.bin_levels();
        self.accumulate_phase();

        let width_ms = self.pulse_width_ms();
        let pulse = self.classify(width_ms);
        trace!(?pulse, width_ms, offset = self.offset, bits = self.telegram.len(), "Second evaluated");

        self.window_cycles += 1;
        if self.window_cycles >= self.config.drift_correction_secs {
            self.correct_drift();
        }
        self.roll();
        self.last_pulse = Some(pulse);

        match pulse {
            Pulse::Zero | Pulse::One => {
                self.silent_cycles = 0;
                if let Err(e) = self.telegram.push(pulse == Pulse::One) {
                    debug!("Telegram overflow, resynchronizing");
                    self.clear_bits();
                    return Err(e);
                }
                Ok(None)
            }
            Pulse::Noise => {
                self.silent_cycles = 0;
                let bits = self.telegram.len();
                self.clear_bits();
                Err(Error::desync(format!("noise after {} bits", bits)))
            }
            Pulse::Silence => {
                self.silent_cycles += 1;
                if self.silent_cycles >= 2 {
                    self.clear_bits();
                    return Err(Error::NoSignal);
                }
                self.minute_marker()
            }
        }
    }

    fn minute_marker(&mut self) -> Result<Option<CalendarTimestamp>> {
        let bits = self.telegram.len();
        debug!(bits, "Minute marker");
        if bits == 0 {
            return Ok(None);
        }
        if !self.telegram.is_complete() {
            self.clear_bits();
            return Err(Error::TelegramLength(bits));
        }
        let result = self.decode();
        self.clear_bits();
        result.map(Some)
    }

    /// Decodes the telegram received so far, remembering which field failed
    pub fn decode(&mut self) -> Result<CalendarTimestamp> {
        match self.telegram.decode() {
            Ok(timestamp) => {
                self.error_field = None;
                Ok(timestamp)
            }
            Err(e) => {
                if let Error::Parity(field) = &e {
                    warn!(%field, "Telegram parity check failed");
                } else {
                    debug!(error = %e, "Telegram rejected");
                }
                self.error_field = e.field();
                Err(e)
            }
        }
    }

    /// Spreads the polled levels evenly over the bins of the current second
    fn bin_levels(&mut self) {
        let bins = self.config.bins;
        let polls = self.levels.len();
        for (i, &level) in self.levels.iter().enumerate() {
            let slot = bins + i * bins / polls;
            self.samples[slot] = self.samples[slot].saturating_add(1);
            if level {
                self.high[slot] = self.high[slot].saturating_add(1);
            }
        }
        self.levels.clear();
    }

    fn accumulate_phase(&mut self) {
        let bins = self.config.bins;
        for slot in 0..bins {
            let fraction = self.fraction(bins + slot);
            self.phase[slot] += fraction;
        }
    }

    /// High fraction of a slot, scaled to `FRACTION_ONE`
    fn fraction(&self, slot: usize) -> u32 {
        match self.samples[slot] as u32 {
            0 => 0,
            samples => self.high[slot] as u32 * FRACTION_ONE / samples,
        }
    }

    /// High mass in milliseconds from one bin before the expected pulse
    /// start to the end of the longest valid pulse. The window is centered
    /// on the pulse start, so neighbouring pulses stay outside the span.
    fn pulse_width_ms(&self) -> u32 {
        let bins = self.config.bins;
        let onset = self.offset + bins / 2;
        let tail = (self.config.long_pulse_max_ms as usize * bins + 999) / 1000;
        let last = (onset + tail).min(2 * bins - 1);
        let mass: u32 = (onset - 1..=last).map(|slot| self.fraction(slot)).sum();
        mass * 1000 / (FRACTION_ONE * bins as u32)
    }

    fn classify(&self, width_ms: u32) -> Pulse {
        if width_ms < self.config.min_pulse_ms {
            Pulse::Silence
        } else if width_ms <= self.config.short_pulse_max_ms {
            Pulse::Zero
        } else if width_ms <= self.config.long_pulse_max_ms {
            Pulse::One
        } else {
            Pulse::Noise
        }
    }

    /// Slot where the summed phase histogram rises most steeply, if the rise
    /// is backed by a pulse in at least a quarter of the window's seconds
    fn pulse_onset(&self) -> Option<usize> {
        let bins = self.config.bins;
        let (slot, rise) = (0..bins)
            .map(|slot| {
                let before = self.phase[(slot + bins - 1) % bins] as i64;
                (slot, self.phase[slot] as i64 - before)
            })
            .max_by_key(|&(_, rise)| rise)?;
        if rise * 4 < self.window_cycles as i64 * FRACTION_ONE as i64 {
            return None;
        }
        Some(slot)
    }

    /// Moves the window toward the pulse onset seen over the last correction
    /// window. The first correction jumps straight to the onset; once locked
    /// the window moves at most one bin per correction window.
    fn correct_drift(&mut self) {
        let onset = self.pulse_onset();
        let cycles = self.window_cycles;
        self.phase.fill(0);
        self.window_cycles = 0;

        let onset = match onset {
            Some(onset) => onset,
            None => {
                debug!(cycles, "No pulse onset found, phase kept");
                return;
            }
        };

        let bins = self.config.bins as i32;
        let center = ((self.offset + self.config.bins / 2) % self.config.bins) as i32;
        let mut deviation = (onset as i32 - center).rem_euclid(bins);
        if deviation > bins / 2 {
            deviation -= bins;
        }
        if deviation == 0 {
            if !self.locked {
                debug!(offset = self.offset, "Phase locked");
            }
            self.locked = true;
            return;
        }

        let step = if self.locked { deviation.signum() } else { deviation };
        let target = self.offset as i32 + step;
        self.offset = target.rem_euclid(bins) as usize;
        debug!(offset = self.offset, deviation, locked = self.locked, "Phase corrected");
        self.locked = true;
        if !(0..bins).contains(&target) {
            // the window skipped or repeated a second
            debug!("Phase wrapped across second boundary, telegram dropped");
            self.clear_bits();
        }
    }

    fn roll(&mut self) {
        let bins = self.config.bins;
        self.high.copy_within(bins.., 0);
        self.samples.copy_within(bins.., 0);
        self.high[bins..].fill(0);
        self.samples[bins..].fill(0);
    }

    /// Drops the telegram received so far
    pub fn clear_bits(&mut self) {
        self.telegram.clear();
    }

    /// Drops all accumulated samples, keeping the learned phase
    pub fn clear_bins(&mut self) {
        self.levels.clear();
        self.high.fill(0);
        self.samples.fill(0);
        self.phase.fill(0);
        self.window_cycles = 0;
    }

    /// Last sampled line level, optionally inverted
    pub fn signal(&self, invert: bool) -> bool {
        self.last_level != invert
    }

    /// Switches the receiver on or off. Switching resets all decoder state
    /// except the learned phase.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!(enabled, "Receiver switched");
            self.clear_bits();
            self.clear_bins();
            self.silent_cycles = 0;
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_signal_inverted(&mut self, inverted: bool) {
        self.config.signal_inverted = inverted;
    }

    /// Field that made the last decode fail, cleared by a successful decode
    pub fn error_field(&self) -> Option<TelegramField> {
        self.error_field
    }

    /// Start of the evaluation window in slots
    pub fn phase_offset(&self) -> usize {
        self.offset
    }

    /// True once a correction window has found the pulse onset
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// How long before the end of the current cycle the minute announced by
    /// a minute marker began, in milliseconds. The window trails the host
    /// second, so a marker is reported up to about half a second after the
    /// minute started; a negative value means it starts that much later.
    pub fn marker_lag_ms(&self) -> i32 {
        let bins = self.config.bins as i32;
        (bins - self.offset as i32 - bins / 2) * 1000 / bins
    }

    pub fn bits_received(&self) -> usize {
        self.telegram.len()
    }

    pub fn last_pulse(&self) -> Option<Pulse> {
        self.last_pulse
    }
}
