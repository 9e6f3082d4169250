//! Pluggable note ordering

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use log::warn;

use super::DEFAULT_SORT_STRATEGY;
use super::annotations::Annotation;

/// Orders notes on a printed notes page
pub trait NoteSortStrategy: Send + Sync {
    fn compare(&self, a: &Annotation, b: &Annotation) -> Ordering;
}

/// Reading order: page, then top to bottom, then left to right
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionSort;

impl NoteSortStrategy for PositionSort {
    fn compare(&self, a: &Annotation, b: &Annotation) -> Ordering {
        a.page_number
            .cmp(&b.page_number)
            .then_with(|| a.rect.y.total_cmp(&b.rect.y))
            .then_with(|| a.rect.x.total_cmp(&b.rect.x))
    }
}

/// Oldest thread first, by the latest activity in each thread
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeSort;

impl NoteSortStrategy for TimeSort {
    fn compare(&self, a: &Annotation, b: &Annotation) -> Ordering {
        a.latest_activity()
            .cmp(&b.latest_activity())
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Registry of sort strategies keyed by the user's sort preference
#[derive(Clone)]
pub struct SortStrategies {
    strategies: HashMap<String, Arc<dyn NoteSortStrategy>>,
}

impl Default for SortStrategies {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SortStrategies {
    /// `position` and `time`
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut strategies = Self {
            strategies: HashMap::new(),
        };
        strategies.register("position", Arc::new(PositionSort));
        strategies.register("time", Arc::new(TimeSort));
        strategies
    }

    pub fn register(&mut self, key: impl Into<String>, strategy: Arc<dyn NoteSortStrategy>) {
        self.strategies.insert(key.into(), strategy);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<dyn NoteSortStrategy>> {
        self.strategies.get(key).cloned()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Sort `notes` with the strategy registered under `key`. Unknown keys fall
    /// back to position order.
    pub fn sort_notes(&self, key: &str, notes: &mut [Annotation]) {
        let strategy = self.get(key).unwrap_or_else(|| {
            warn!("Unknown note sort strategy {key:?}, using {DEFAULT_SORT_STRATEGY}");
            Arc::new(PositionSort)
        });

        notes.sort_by(|a, b| strategy.compare(a, b));
    }
}
