use std::cmp::Reverse;
use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::strategy::{BoxedStrategy, StrategyInfo};
use super::types::ErrorCategory;

/// Per-category strategy lists, always ordered by descending priority.
///
/// Sorting is stable, so equal priorities keep registration order. Duplicate registrations
/// are kept and both considered during selection, though a repeated name within a category
/// is logged since cooldowns are keyed by name.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: RwLock<HashMap<ErrorCategory, Vec<BoxedStrategy>>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, category: ErrorCategory, strategy: BoxedStrategy) {
        debug!(
            %category,
            strategy = strategy.name(),
            priority = strategy.priority(),
            "Registering recovery strategy"
        );

        let mut strategies = self.strategies.write();
        let list = strategies.entry(category).or_default();
        if list.iter().any(|s| s.name() == strategy.name()) {
            warn!(
                %category,
                strategy = strategy.name(),
                "Strategy name already registered for category, cooldowns will be shared"
            );
        }
        list.push(strategy);
        list.sort_by_key(|s| Reverse(s.priority()));
    }

    pub fn register_all(&self, entries: impl IntoIterator<Item = (ErrorCategory, BoxedStrategy)>) {
        for (category, strategy) in entries {
            self.register(category, strategy);
        }
    }

    /// Snapshot of the current priority-ordered list for `category`.
    pub fn list(&self, category: ErrorCategory) -> Vec<BoxedStrategy> {
        self.strategies
            .read()
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }

    pub fn describe(&self, category: ErrorCategory) -> Vec<StrategyInfo> {
        self.list(category)
            .iter()
            .map(|s| StrategyInfo::of(s.as_ref()))
            .collect()
    }

    pub fn categories(&self) -> Vec<ErrorCategory> {
        let mut categories: Vec<_> = self
            .strategies
            .read()
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(category, _)| *category)
            .collect();
        categories.sort();
        categories
    }

    pub fn count(&self, category: ErrorCategory) -> usize {
        self.strategies.read().get(&category).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.strategies.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
