//! Injectable clock and id providers.
//!
//! # Invariants
//! - `IdGenerator::next_id` never returns the same value twice from one
//!   generator instance.
//! - The store re-draws ids that collide with stored records, allowing one
//!   draw per stored record plus a small margin, so a deterministic
//!   generator restarted over existing data skips past the ids it replays.

use crate::model::RecordId;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Source of creation timestamps.
pub trait Clock {
    /// Current time in Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        // A clock before 1970 is treated as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Source of record identifiers.
pub trait IdGenerator {
    fn next_id(&mut self) -> RecordId;
}

/// Random v4 UUID ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> RecordId {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic `<prefix><n>` ids, counting up from 1.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> RecordId {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Clock and id generator used by one store instance.
pub struct Providers {
    pub clock: Box<dyn Clock>,
    pub ids: Box<dyn IdGenerator>,
}

impl Providers {
    pub fn new(clock: impl Clock + 'static, ids: impl IdGenerator + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            ids: Box::new(ids),
        }
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::new(SystemClock, UuidIdGenerator)
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, IdGenerator, SequentialIdGenerator, SystemClock, UuidIdGenerator};
    use std::collections::HashSet;

    #[test]
    fn sequential_ids_count_up_with_prefix() {
        let mut ids = SequentialIdGenerator::new("idea-");
        assert_eq!(ids.next_id(), "idea-1");
        assert_eq!(ids.next_id(), "idea-2");
    }

    #[test]
    fn uuid_ids_do_not_repeat_within_a_tick() {
        let mut ids = UuidIdGenerator;
        let drawn: HashSet<_> = (0..256).map(|_| ids.next_id()).collect();
        assert_eq!(drawn.len(), 256);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
