//! Per-connection subscription manager.
//!
//! Tracks which collections a WebSocket client wants events for and
//! provides server-side event filtering. A new connection receives every
//! collection; subscribing to explicit names narrows it to those names.

use std::collections::HashSet;

/// Wildcard collection name.
pub const ALL_COLLECTIONS: &str = "*";

/// Manages the collection selection of a single WebSocket connection.
#[derive(Debug)]
pub struct SubscriptionManager {
    /// Explicitly selected collections. Ignored while `subscribe_all` holds.
    collections: HashSet<String>,
    /// Whether every collection is selected.
    subscribe_all: bool,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self {
            collections: HashSet::new(),
            subscribe_all: true,
        }
    }
}

impl SubscriptionManager {
    /// Creates a manager that matches every collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds collections to the selection. `"*"` selects everything; any
    /// explicit name otherwise narrows the selection to the named set.
    pub fn subscribe(&mut self, names: &[String]) {
        let wildcard = names.iter().any(|n| n == ALL_COLLECTIONS);
        if wildcard {
            self.subscribe_all = true;
        } else if !names.is_empty() {
            self.subscribe_all = false;
        }
        self.collections.extend(
            names
                .iter()
                .filter(|n| n.as_str() != ALL_COLLECTIONS)
                .cloned(),
        );
    }

    /// Removes collections from the selection. `"*"` clears everything.
    pub fn unsubscribe(&mut self, names: &[String]) {
        if names.iter().any(|n| n == ALL_COLLECTIONS) {
            self.subscribe_all = false;
            self.collections.clear();
            return;
        }
        for name in names {
            self.collections.remove(name);
        }
    }

    /// Returns `true` if events for `collection` should be delivered.
    #[must_use]
    pub fn matches(&self, collection: &str) -> bool {
        self.subscribe_all || self.collections.contains(collection)
    }

    /// Returns the explicitly selected collections, sorted.
    #[must_use]
    pub fn selected(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns `true` if every collection is selected.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
