use chrono::Utc;

/// Largest identifier the crate hands out or accepts from the cache. Matches
/// the largest integer a JSON consumer can hold without losing precision.
pub const MAX_ID: i64 = 9_007_199_254_740_991;

/// Hands out client-side identifiers derived from the wall clock in
/// milliseconds. Identifiers are strictly increasing for the lifetime of the
/// clock even when the wall clock stalls or steps backwards.
#[derive(Debug, Clone, Default)]
pub struct LocalIdClock {
    last: i64,
}

impl LocalIdClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock past `id` so fresh identifiers cannot collide with
    /// it. Values above [`MAX_ID`] are ignored.
    pub fn observe(&mut self, id: i64) {
        if id > self.last && id <= MAX_ID {
            self.last = id;
        }
    }

    pub fn next_id(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let id = now.max(self.last.saturating_add(1));
        self.last = id;
        id
    }
}
