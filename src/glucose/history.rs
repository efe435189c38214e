//! Fixed-capacity glucose history ring.
//!
//! One entry per *valid* reading; when full, the oldest entry is
//! overwritten. Pure data structure — no I/O, no failure modes.

/// Number of readings retained (4 hours at the default 5-minute cadence).
pub const HISTORY_CAPACITY: usize = 48;

/// One recorded reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryEntry {
    /// Glucose in mg/dL.
    pub glucose: i32,
    /// Change from the previous valid reading (0 for the first).
    pub delta: i32,
    /// Monotonic milliseconds when the entry was recorded.
    pub recorded_at_ms: u64,
}

/// Ring buffer of the most recent [`HISTORY_CAPACITY`] readings.
pub struct HistoryBuffer {
    entries: [HistoryEntry; HISTORY_CAPACITY],
    /// Next slot to write. When the buffer has wrapped this is also the
    /// index of the oldest entry.
    cursor: usize,
    count: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self {
            entries: [HistoryEntry::default(); HISTORY_CAPACITY],
            cursor: 0,
            count: 0,
        }
    }

    /// Append a reading, overwriting the oldest entry once full.
    pub fn record(&mut self, glucose: i32, delta: i32, now_ms: u64) {
        self.entries[self.cursor] = HistoryEntry {
            glucose,
            delta,
            recorded_at_ms: now_ms,
        };
        self.cursor = (self.cursor + 1) % HISTORY_CAPACITY;
        if self.count < HISTORY_CAPACITY {
            self.count += 1;
        }
    }

    /// Number of entries currently stored (≤ capacity).
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Copy out up to `max_count` entries, oldest first.
    ///
    /// When fewer than `max_count` were ever recorded, all of them are
    /// returned. When `max_count` is smaller than the stored count, the
    /// *newest* `max_count` entries are returned (still oldest-first).
    pub fn read(&self, max_count: usize) -> heapless::Vec<HistoryEntry, HISTORY_CAPACITY> {
        let mut out = heapless::Vec::new();
        let count = max_count.min(self.count);
        if count == 0 {
            return out;
        }

        let oldest = if self.count < HISTORY_CAPACITY {
            0
        } else {
            self.cursor
        };
        // Skip forward when the caller asked for fewer than we hold.
        let skip = self.count - count;
        for i in 0..count {
            let idx = (oldest + skip + i) % HISTORY_CAPACITY;
            // Capacity matches HISTORY_CAPACITY, push cannot fail.
            let _ = out.push(self.entries[idx]);
        }
        out
    }
}
