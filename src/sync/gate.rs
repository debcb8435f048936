use tracing::trace;

use crate::core::{Error, Result};
use crate::time::CalendarTimestamp;
use super::util::elapsed_minutes;

/// Cross-checks decoded timestamps against the free-running local clock.
///
/// The gate keeps the last `capacity` (decoded, local) pairs. A sync is only
/// trusted when, between every two adjacent slots, the decoded clock advanced
/// by the same number of minutes as the local clock, give or take one.
#[derive(Debug, Clone)]
pub struct SyncQualityGate {
    decoded: Vec<CalendarTimestamp>,
    local: Vec<CalendarTimestamp>,
    cursor: usize,
    filled: usize,
}

impl Default for SyncQualityGate {
    fn default() -> Self {
        SyncQualityGate::primed(crate::core::DEFAULT_GATE_CAPACITY)
    }
}

impl SyncQualityGate {
    /// Creates a gate holding `capacity` sample pairs, at least two
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 2 {
            return Err(Error::config(format!(
                "gate capacity must be at least 2, got {}",
                capacity
            )));
        }
        Ok(Self::primed(capacity))
    }

    fn primed(capacity: usize) -> Self {
        let mut gate = SyncQualityGate {
            decoded: Vec::with_capacity(capacity),
            local: Vec::with_capacity(capacity),
            cursor: 0,
            filled: 0,
        };
        for slot in 0..capacity {
            let (decoded, local) = sentinel(slot);
            gate.decoded.push(decoded);
            gate.local.push(local);
        }
        gate
    }

    /// Stores a pair in the oldest slot
    pub fn add_sample(&mut self, decoded: CalendarTimestamp, local: CalendarTimestamp) {
        self.decoded[self.cursor] = decoded;
        self.local[self.cursor] = local;
        self.cursor = (self.cursor + 1) % self.capacity();
        self.filled = (self.filled + 1).min(self.capacity());
    }

    /// True if decoded and local elapsed minutes agree for every adjacent
    /// pair of slots
    pub fn samples_ok(&self) -> bool {
        (0..self.capacity() - 1).all(|i| {
            let decoded_delta = elapsed_minutes(&self.decoded[i], &self.decoded[i + 1]);
            let local_delta = elapsed_minutes(&self.local[i], &self.local[i + 1]);
            let ok = (decoded_delta - local_delta).abs() <= 1;
            if !ok {
                trace!(slot = i, decoded_delta, local_delta, "Sample deltas disagree");
            }
            ok
        })
    }

    /// Number of real samples stored, up to the capacity
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn capacity(&self) -> usize {
        self.decoded.len()
    }

    /// Forgets all samples
    pub fn reset(&mut self) {
        *self = Self::primed(self.capacity());
    }
}

/// Implausible pair for an empty slot. Decoded sentinels differ by years from
/// slot to slot while the local ones stand still, so no pair involving a
/// sentinel can agree.
fn sentinel(slot: usize) -> (CalendarTimestamp, CalendarTimestamp) {
    let i = (slot % 90) as u8;
    (
        CalendarTimestamp::from_raw(i, i, i, i, i, i),
        CalendarTimestamp::from_raw(0, 0, 0, 0, 0, 99),
    )
}
