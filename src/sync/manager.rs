use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::core::{ClockConfig, Error, PersistedClock, Result};
use crate::line::SignalLine;
use crate::protocol::RadioTelegramDecoder;
use crate::time::CalendarTimestamp;
use super::gate::SyncQualityGate;

/// Outcome of one second of the radio clock
#[derive(Debug)]
pub enum SyncEvent {
    /// Telegram still being received
    Pending,
    /// Decoded timestamp trusted and committed as local time
    Committed(CalendarTimestamp),
    /// Decoded timestamp rejected by the quality gate
    Distrusted {
        decoded: CalendarTimestamp,
        local: CalendarTimestamp,
    },
    /// Decoding failed this second
    Failed(Error),
}

impl SyncEvent {
    /// The "trusted" flag handed to the display
    pub fn is_trusted(&self) -> bool {
        matches!(self, SyncEvent::Committed(_))
    }

    /// Converts a rejection into the matching error
    pub fn into_result(self) -> Result<Option<CalendarTimestamp>> {
        match self {
            SyncEvent::Pending => Ok(None),
            SyncEvent::Committed(timestamp) => Ok(Some(timestamp)),
            SyncEvent::Distrusted { decoded, local } => Err(Error::SyncDistrust { decoded, local }),
            SyncEvent::Failed(e) => Err(e),
        }
    }
}

/// Host side of the radio clock: a free-running local clock that is set from
/// decoded telegrams once the quality gate trusts them.
#[derive(Debug)]
pub struct RadioClock {
    config: ClockConfig,
    decoder: RadioTelegramDecoder,
    gate: SyncQualityGate,
    local: CalendarTimestamp,
    seconds: u8,
    last_sync: Option<CalendarTimestamp>,
}

impl RadioClock {
    /// Creates a clock starting at `local`
    pub fn new(config: ClockConfig, local: CalendarTimestamp) -> Result<Self> {
        config.validate()?;
        let decoder = RadioTelegramDecoder::new(config.decoder.clone())?;
        let gate = SyncQualityGate::new(config.gate.capacity)?;
        Ok(RadioClock {
            config,
            decoder,
            gate,
            local,
            seconds: 0,
            last_sync: None,
        })
    }

    /// Creates a clock from state saved after an earlier sync. The stored
    /// polarity overrides the configured one.
    pub fn from_persisted(mut config: ClockConfig, persisted: &PersistedClock) -> Result<Self> {
        config.decoder.signal_inverted = persisted.signal_inverted;
        Self::new(config, persisted.restore())
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn decoder(&self) -> &RadioTelegramDecoder {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut RadioTelegramDecoder {
        &mut self.decoder
    }

    pub fn gate(&self) -> &SyncQualityGate {
        &self.gate
    }

    /// Feeds one line sample to the decoder
    pub fn poll(&mut self, level: bool) {
        self.decoder.poll(level);
    }

    /// Ticks the local clock by one second and closes the decoder cycle.
    ///
    /// The decoder reports a minute marker some fraction of a second after
    /// the minute began (see [`RadioTelegramDecoder::marker_lag_ms`]); a
    /// commit rounds that lag to whole seconds, so the local clock is set to
    /// within half a second of the broadcast.
    pub fn second(&mut self) -> SyncEvent {
        self.seconds += 1;
        if self.seconds >= 60 {
            self.seconds = 0;
            self.local.advance_minute();
        }

        match self.decoder.new_cycle() {
            Ok(None) => SyncEvent::Pending,
            Ok(Some(mut decoded)) => {
                if self.config.time_shift_hours != 0 {
                    decoded.add_sub_hours_overflow(self.config.time_shift_hours);
                }
                self.gate.add_sample(decoded, self.local);
                if self.gate.samples_ok() {
                    info!(%decoded, previous = %self.local, "Radio time committed");
                    self.local = decoded;
                    self.seconds = ((self.decoder.marker_lag_ms() + 500).max(0) / 1000) as u8;
                    self.last_sync = Some(decoded);
                    SyncEvent::Committed(decoded)
                } else {
                    warn!(%decoded, local = %self.local, "Radio time not trusted yet");
                    SyncEvent::Distrusted {
                        decoded,
                        local: self.local,
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "No time this second");
                SyncEvent::Failed(e)
            }
        }
    }

    pub fn local_time(&self) -> CalendarTimestamp {
        self.local
    }

    /// Seconds into the current local minute
    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    pub fn last_sync(&self) -> Option<CalendarTimestamp> {
        self.last_sync
    }

    /// Local minutes elapsed since the last trusted sync
    pub fn minutes_since_last_sync(&self) -> Option<u32> {
        self.last_sync.map(|last| {
            self.local
                .minutes_of_century()
                .saturating_sub(last.minutes_of_century())
        })
    }

    /// True if no trusted sync happened within `max_sync_age`
    pub fn sync_overdue(&self) -> bool {
        match self.minutes_since_last_sync() {
            Some(minutes) => Duration::from_secs(minutes as u64 * 60) > self.config.max_sync_age,
            None => true,
        }
    }

    /// State to write to non-volatile storage, available after a sync
    pub fn persisted(&self) -> Option<PersistedClock> {
        self.last_sync.map(|timestamp| PersistedClock {
            timestamp,
            signal_inverted: self.decoder.config().signal_inverted,
        })
    }

    /// Runs the clock on `line` until reading the line fails
    pub async fn run<L: SignalLine>(&mut self, line: &mut L) -> Result<()> {
        self.drive(line, None, |_| {}).await
    }

    /// Runs the clock for `seconds` seconds and returns every event other
    /// than [`SyncEvent::Pending`]
    pub async fn run_for<L: SignalLine>(
        &mut self,
        line: &mut L,
        seconds: u64,
    ) -> Result<Vec<SyncEvent>> {
        let mut events = Vec::new();
        self.drive(line, Some(seconds), |event| {
            if !matches!(event, SyncEvent::Pending) {
                events.push(event);
            }
        })
        .await?;
        Ok(events)
    }

    async fn drive<L, F>(&mut self, line: &mut L, seconds: Option<u64>, mut on_event: F) -> Result<()>
    where
        L: SignalLine,
        F: FnMut(SyncEvent),
    {
        line.set_powered(true)?;

        let start = Instant::now();
        let mut poll_interval = interval_at(start, self.config.decoder.poll_interval());
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut second_interval = interval_at(start + Duration::from_secs(1), Duration::from_secs(1));

        let mut elapsed = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = second_interval.tick() => {
                    on_event(self.second());
                    elapsed += 1;
                    if seconds.map_or(false, |limit| elapsed >= limit) {
                        return Ok(());
                    }
                }
                _ = poll_interval.tick() => {
                    let level = line.read_level()?;
                    self.poll(level);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::SimulatedTransmitter;
    use tokio_test::assert_ok;

    fn new_year_noon() -> CalendarTimestamp {
        let mut ts = CalendarTimestamp::new(30, 12, 1, 0, 1, 24);
        ts.set_day_of_week(2);
        ts
    }

    fn run_seconds(
        clock: &mut RadioClock,
        tx: &mut SimulatedTransmitter,
        seconds: usize,
    ) -> Vec<SyncEvent> {
        (0..seconds)
            .map(|_| {
                for _ in 0..tx.samples_per_second() {
                    clock.poll(tx.next_level());
                }
                clock.second()
            })
            .filter(|event| !matches!(event, SyncEvent::Pending))
            .collect()
    }

    fn committed(events: &[SyncEvent]) -> Vec<CalendarTimestamp> {
        events
            .iter()
            .filter_map(|event| match event {
                SyncEvent::Committed(ts) => Some(*ts),
                _ => None,
            })
            .collect()
    }

    fn transmitter(config: &ClockConfig, start: CalendarTimestamp) -> SimulatedTransmitter {
        SimulatedTransmitter::new(start, &config.decoder).with_phase(config.decoder.bins / 2)
    }

    #[test]
    fn test_second_decode_commits() {
        let config = ClockConfig::default();
        let local = CalendarTimestamp::new(0, 7, 1, 0, 1, 24);
        let mut clock = RadioClock::new(config.clone(), local).unwrap();
        let mut tx = transmitter(&config, new_year_noon());

        let events = run_seconds(&mut clock, &mut tx, 121);
        assert_eq!(events.len(), 2);
        match &events[0] {
            SyncEvent::Distrusted { decoded, local } => {
                assert_eq!(*decoded, new_year_noon());
                assert_eq!(local.to_string(), "07:01 01.01.24");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(events[1].is_trusted());
        assert_eq!(committed(&events)[0].to_string(), "12:31 01.01.24");
        assert_eq!(clock.local_time().to_string(), "12:31 01.01.24");
        // the minute began 545 ms before the marker was reported
        assert_eq!(clock.seconds(), 1);
        assert_eq!(clock.minutes_since_last_sync(), Some(0));
        assert!(!clock.sync_overdue());
    }

    #[test]
    fn test_jump_needs_two_agreeing_minutes() {
        let config = ClockConfig::default();
        let mut clock = RadioClock::new(config.clone(), new_year_noon()).unwrap();
        let mut tx = transmitter(&config, new_year_noon());
        run_seconds(&mut clock, &mut tx, 121);
        assert_eq!(clock.last_sync().map(|ts| ts.minute()), Some(31));

        // the broadcast suddenly claims a different time of day
        let mut tx = transmitter(&config, CalendarTimestamp::new(0, 18, 1, 0, 1, 24));
        let events = run_seconds(&mut clock, &mut tx, 190);
        assert!(events.iter().any(|event| matches!(
            event,
            SyncEvent::Distrusted { decoded, .. } if decoded.hour() == 18 && decoded.minute() == 1
        )));
        assert_eq!(
            committed(&events).last().map(|ts| ts.to_string()),
            Some("18:02 01.01.24".to_string())
        );
    }

    #[test]
    fn test_time_shift_applied() {
        let config = ClockConfig {
            time_shift_hours: -1,
            ..Default::default()
        };
        let mut clock = RadioClock::new(config.clone(), new_year_noon()).unwrap();
        let mut tx = transmitter(&config, CalendarTimestamp::new(30, 0, 1, 0, 1, 24));
        let events = run_seconds(&mut clock, &mut tx, 121);
        assert_eq!(committed(&events)[0].to_string(), "23:31 31.12.23");
    }

    #[test]
    fn test_failures_are_reported() {
        let config = ClockConfig::default();
        let mut clock = RadioClock::new(config.clone(), new_year_noon()).unwrap();
        let mut tx = transmitter(&config, new_year_noon())
            .with_flipped_bit(crate::protocol::HOUR_PARITY_BIT);
        let events = run_seconds(&mut clock, &mut tx, 61);
        assert_eq!(events.len(), 1);
        let err = events.into_iter().next().unwrap().into_result().unwrap_err();
        assert!(matches!(err, Error::Parity(crate::core::TelegramField::Hour)));
        assert!(err.is_transient());
        assert!(clock.sync_overdue());
        assert_eq!(clock.persisted(), None);
    }

    #[test]
    fn test_local_clock_runs_free() {
        let mut clock = RadioClock::new(ClockConfig::default(), new_year_noon()).unwrap();
        for _ in 0..120 {
            let _ = clock.second();
        }
        assert_eq!(clock.local_time().to_string(), "12:32 01.01.24");
        assert_eq!(clock.minutes_since_last_sync(), None);
    }

    #[test]
    fn test_persisted_roundtrip() {
        let config = ClockConfig::default();
        let mut clock = RadioClock::new(config.clone(), new_year_noon()).unwrap();
        let mut tx = transmitter(&config, new_year_noon());
        run_seconds(&mut clock, &mut tx, 121);

        let persisted = clock.persisted().unwrap();
        let bytes = persisted.encode().unwrap();
        let restored = RadioClock::from_persisted(config, &PersistedClock::decode(&bytes).unwrap()).unwrap();
        assert_eq!(restored.local_time().to_string(), "12:31 01.01.24");
        assert_eq!(restored.last_sync(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_for_commits() {
        let config = ClockConfig::default();
        let mut clock = RadioClock::new(config.clone(), CalendarTimestamp::default()).unwrap();
        let mut tx = transmitter(&config, new_year_noon());

        let events = assert_ok!(clock.run_for(&mut tx, 130).await);
        assert!(matches!(events[0], SyncEvent::Distrusted { .. }));
        let committed = committed(&events);
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].to_string(), "12:31 01.01.24");
        assert_eq!(clock.last_sync(), Some(committed[0]));
        assert_eq!(clock.seconds(), 10);
    }

    struct BrokenLine;

    impl SignalLine for BrokenLine {
        fn read_level(&mut self) -> Result<bool> {
            Err(Error::line("receiver unplugged"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_line_error() {
        let mut clock = RadioClock::new(ClockConfig::default(), new_year_noon()).unwrap();
        let result = clock.run(&mut BrokenLine).await;
        assert!(matches!(result, Err(Error::Line(_))));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ClockConfig {
            time_shift_hours: 14,
            ..Default::default()
        };
        assert!(matches!(
            RadioClock::new(config, new_year_noon()),
            Err(Error::Config(_))
        ));
    }
}
