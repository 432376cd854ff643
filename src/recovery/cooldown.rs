use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::types::ErrorCategory;

/// Outcome of the combined cooldown + gate admission check.
#[derive(Debug)]
pub enum Admission<T> {
    /// Global cooldown still running; carries the remaining wait.
    CoolingDown(Duration),
    /// Cooldown passed but the admission callback produced nothing (gate full).
    Saturated,
    Admitted(T),
}

/// Throttling state: one process-wide timestamp plus one per (category, strategy).
///
/// Timestamps only ever move forward.
pub struct CooldownTracker {
    global_cooldown: Duration,
    last_global: Mutex<Option<Instant>>,
    per_strategy: Mutex<HashMap<(ErrorCategory, String), Instant>>,
}

impl CooldownTracker {
    pub fn new(global_cooldown: Duration) -> Self {
        Self {
            global_cooldown,
            last_global: Mutex::new(None),
            per_strategy: Mutex::new(HashMap::new()),
        }
    }

    pub fn global_cooldown(&self) -> Duration {
        self.global_cooldown
    }

    /// Checks the global cooldown and, only if it has elapsed, runs `acquire` while still
    /// holding the cooldown lock. A cooldown rejection never calls `acquire`.
    pub fn admit<T>(&self, now: Instant, acquire: impl FnOnce() -> Option<T>) -> Admission<T> {
        let last = self.last_global.lock();
        if let Some(remaining) = remaining(*last, self.global_cooldown, now) {
            return Admission::CoolingDown(remaining);
        }
        match acquire() {
            Some(admitted) => Admission::Admitted(admitted),
            None => Admission::Saturated,
        }
    }

    pub fn global_remaining(&self, now: Instant) -> Option<Duration> {
        remaining(*self.last_global.lock(), self.global_cooldown, now)
    }

    /// Stamps completion of a recovery call.
    pub fn mark_global(&self, now: Instant) {
        let mut last = self.last_global.lock();
        *last = Some(last.map_or(now, |prev| prev.max(now)));
    }

    pub fn strategy_ready(
        &self,
        category: ErrorCategory,
        strategy: &str,
        cooldown: Option<Duration>,
        now: Instant,
    ) -> bool {
        let Some(cooldown) = cooldown else {
            return true;
        };
        let last = self
            .per_strategy
            .lock()
            .get(&(category, strategy.to_string()))
            .copied();
        remaining(last, cooldown, now).is_none()
    }

    pub fn mark_strategy(&self, category: ErrorCategory, strategy: &str, now: Instant) {
        let mut per_strategy = self.per_strategy.lock();
        per_strategy
            .entry((category, strategy.to_string()))
            .and_modify(|last| *last = (*last).max(now))
            .or_insert(now);
    }
}

fn remaining(last: Option<Instant>, cooldown: Duration, now: Instant) -> Option<Duration> {
    let last = last?;
    let elapsed = now.saturating_duration_since(last);
    (elapsed < cooldown).then(|| cooldown - elapsed)
}
