use crate::clock::Timestamp;

/// Default number of edge slots recorded per session.
pub const EDGE_CAPACITY: usize = 50;

/// Bounded, append-only record of event timestamps.
///
/// Events past the capacity are still counted, so an overflowing session is
/// detected without growing the log.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeLog<const N: usize = EDGE_CAPACITY> {
    slots: [Timestamp; N],
    count: usize,
}

impl<const N: usize> EdgeLog<N> {
    /// Creates an empty log.
    pub const fn new() -> Self {
        EdgeLog {
            slots: [Timestamp::ZERO; N],
            count: 0,
        }
    }

    /// Builds a log from already captured timestamps.
    pub fn from_timestamps(timestamps: &[Timestamp]) -> Self {
        let mut log = Self::new();
        for &t in timestamps {
            log.record(t);
        }
        log
    }

    /// Records one event. Stored only while there is room; always counted.
    pub fn record(&mut self, t: Timestamp) {
        if let Some(slot) = self.slots.get_mut(self.count) {
            *slot = t;
        }
        self.count = self.count.saturating_add(1);
    }

    /// Number of events observed, including those that did not fit.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Whether events were dropped for lack of room.
    pub const fn overflowed(&self) -> bool {
        self.count > N
    }

    /// The stored timestamps, oldest first.
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.slots[..self.count.min(N)]
    }

    /// Forgets all events.
    pub fn clear(&mut self) {
        self.count = 0;
    }
}

impl<const N: usize> Default for EdgeLog<N> {
    fn default() -> Self {
        Self::new()
    }
}
