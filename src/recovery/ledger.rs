//! Bounded in-memory history of completed recoveries and the statistics derived from it.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::types::ErrorCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub error_category: ErrorCategory,
    pub success: bool,
    pub escalate: bool,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(category: ErrorCategory, success: bool, escalate: bool, duration: Duration) -> Self {
        Self {
            error_category: category,
            success,
            escalate,
            duration_ms: duration.as_millis() as u64,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub attempts: usize,
    pub successes: usize,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryStats {
    pub total_attempts: usize,
    pub successful_attempts: usize,
    pub escalated_attempts: usize,
    pub success_rate: f64,
    pub average_recovery_time_ms: f64,
    pub by_category: BTreeMap<ErrorCategory, CategoryStats>,
}

pub struct RecoveryLedger {
    max_entries: usize,
    entries: RwLock<VecDeque<LedgerEntry>>,
}

impl RecoveryLedger {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            max_entries,
            entries: RwLock::new(VecDeque::with_capacity(max_entries)),
        }
    }

    /// Appends an entry, dropping the oldest ones past the cap.
    pub fn record(&self, entry: LedgerEntry) {
        let mut entries = self.entries.write();
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    pub fn stats(&self) -> RecoveryStats {
        let entries = self.entries.read();
        let total = entries.len();
        if total == 0 {
            return RecoveryStats::default();
        }

        let successful = entries.iter().filter(|e| e.success).count();
        let escalated = entries.iter().filter(|e| e.escalate).count();
        let total_duration_ms: u64 = entries.iter().map(|e| e.duration_ms).sum();

        let mut by_category: BTreeMap<ErrorCategory, CategoryStats> = BTreeMap::new();
        for entry in entries.iter() {
            let stats = by_category.entry(entry.error_category).or_default();
            stats.attempts += 1;
            if entry.success {
                stats.successes += 1;
            }
        }
        for stats in by_category.values_mut() {
            stats.success_rate = ratio(stats.successes, stats.attempts);
        }

        RecoveryStats {
            total_attempts: total,
            successful_attempts: successful,
            escalated_attempts: escalated,
            success_rate: ratio(successful, total),
            average_recovery_time_ms: total_duration_ms as f64 / total as f64,
            by_category,
        }
    }

    /// Success ratio for one category; 0.0 when it has no entries.
    pub fn success_rate(&self, category: ErrorCategory) -> f64 {
        let entries = self.entries.read();
        let (attempts, successes) = entries
            .iter()
            .filter(|e| e.error_category == category)
            .fold((0, 0), |(attempts, successes), e| {
                (attempts + 1, successes + usize::from(e.success))
            });
        ratio(successes, attempts)
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: ErrorCategory, success: bool, ms: u64) -> LedgerEntry {
        LedgerEntry::new(category, success, !success, Duration::from_millis(ms))
    }

    #[test]
    fn test_empty_stats() {
        let ledger = RecoveryLedger::new(10);
        let stats = ledger.stats();

        assert_eq!(stats.total_attempts, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.average_recovery_time_ms, 0.0);
        assert_eq!(ledger.success_rate(ErrorCategory::Network), 0.0);
    }

    #[test]
    fn test_aggregate_stats() {
        let ledger = RecoveryLedger::new(10);
        ledger.record(entry(ErrorCategory::Network, true, 100));
        ledger.record(entry(ErrorCategory::Network, false, 300));
        ledger.record(entry(ErrorCategory::Timeout, true, 200));
        ledger.record(entry(ErrorCategory::Network, true, 400));

        let stats = ledger.stats();
        assert_eq!(stats.total_attempts, 4);
        assert_eq!(stats.successful_attempts, 3);
        assert_eq!(stats.escalated_attempts, 1);
        assert!((stats.success_rate - 0.75).abs() < f64::EPSILON);
        assert!((stats.average_recovery_time_ms - 250.0).abs() < f64::EPSILON);

        let network = &stats.by_category[&ErrorCategory::Network];
        assert_eq!(network.attempts, 3);
        assert_eq!(network.successes, 2);

        assert!((ledger.success_rate(ErrorCategory::Network) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(ledger.success_rate(ErrorCategory::Timeout), 1.0);
        assert_eq!(ledger.success_rate(ErrorCategory::Server), 0.0);
    }

    #[test]
    fn test_oldest_entries_drop_past_cap() {
        let ledger = RecoveryLedger::new(3);
        ledger.record(entry(ErrorCategory::Server, false, 1));
        for _ in 0..3 {
            ledger.record(entry(ErrorCategory::Network, true, 1));
        }

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.success_rate(ErrorCategory::Server), 0.0);
        assert!(
            ledger
                .entries()
                .iter()
                .all(|e| e.error_category == ErrorCategory::Network)
        );
    }

    #[test]
    fn test_clear() {
        let ledger = RecoveryLedger::new(5);
        ledger.record(entry(ErrorCategory::Network, true, 10));
        ledger.clear();

        assert!(ledger.is_empty());
        assert_eq!(ledger.stats().total_attempts, 0);
    }
}
