//! # Listener Ledger
//!
//! Bookkeeping for the event channel sub-protocol.
//!
//! `addListener(eventName)` pushes an entry; `removeListeners(count)` pops the
//! `count` most recently added entries whatever their event names. Removal is
//! by count, not by handle, so a caller that adds listeners for two different
//! events and removes one will drop the newer one. Callers must balance their
//! own add/remove counts. This mirrors the wire protocol existing callers rely
//! on and must not be changed to handle-based removal.

use parking_lot::Mutex;

/// Result of [`ListenerLedger::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addition {
    /// Listeners registered for the added event name, including this one
    pub listeners: usize,
    /// The ledger was empty before this addition
    pub first: bool,
}

/// Result of [`ListenerLedger::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// Event names of the removed entries, newest first
    pub removed: Vec<String>,
    /// Entries left in the ledger
    pub remaining: usize,
    /// More removals were requested than entries existed
    pub imbalance: bool,
}

impl Removal {
    /// The ledger went from non-empty to empty.
    pub fn emptied(&self) -> bool {
        !self.removed.is_empty() && self.remaining == 0
    }
}

/// LIFO stack of registered listeners for one module.
#[derive(Debug, Default)]
pub struct ListenerLedger {
    entries: Mutex<Vec<String>>,
}

impl ListenerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, event_name: &str) -> Addition {
        let mut entries = self.entries.lock();
        let first = entries.is_empty();
        entries.push(event_name.to_string());
        let listeners = entries.iter().filter(|e| *e == event_name).count();
        Addition { listeners, first }
    }

    /// Remove the `count` most recently added listeners.
    pub fn remove(&self, count: usize) -> Removal {
        let mut entries = self.entries.lock();
        let available = entries.len();
        let take = count.min(available);
        let removed: Vec<String> = entries.drain(available - take..).rev().collect();
        Removal {
            removed,
            remaining: entries.len(),
            imbalance: count > available,
        }
    }

    pub fn count(&self, event_name: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| *e == event_name)
            .count()
    }

    pub fn total(&self) -> usize {
        self.entries.lock().len()
    }

    /// Drop every entry, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let cleared = entries.len();
        entries.clear();
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_twice_remove_once_leaves_one() {
        let ledger = ListenerLedger::new();
        assert!(ledger.add("change").first);
        let second = ledger.add("change");
        assert!(!second.first);
        assert_eq!(second.listeners, 2);

        let removal = ledger.remove(1);
        assert_eq!(removal.removed, vec!["change".to_string()]);
        assert_eq!(removal.remaining, 1);
        assert!(!removal.imbalance);
        assert_eq!(ledger.count("change"), 1);
    }

    #[test]
    fn test_removal_is_lifo_across_event_names() {
        let ledger = ListenerLedger::new();
        ledger.add("change");
        ledger.add("didPressMenuItem");

        let removal = ledger.remove(1);
        assert_eq!(removal.removed, vec!["didPressMenuItem".to_string()]);
        assert_eq!(ledger.count("change"), 1);
        assert_eq!(ledger.count("didPressMenuItem"), 0);
    }

    #[test]
    fn test_over_removal_empties_and_flags_imbalance() {
        let ledger = ListenerLedger::new();
        ledger.add("a");
        ledger.add("b");

        let removal = ledger.remove(5);
        assert_eq!(removal.removed, vec!["b".to_string(), "a".to_string()]);
        assert_eq!(removal.remaining, 0);
        assert!(removal.imbalance);
        assert!(removal.emptied());
    }

    #[test]
    fn test_zero_removal_is_noop() {
        let ledger = ListenerLedger::new();
        ledger.add("a");
        let removal = ledger.remove(0);
        assert!(removal.removed.is_empty());
        assert!(!removal.imbalance);
        assert!(!removal.emptied());
        assert_eq!(ledger.total(), 1);
    }

    #[test]
    fn test_removal_from_empty_ledger() {
        let ledger = ListenerLedger::new();
        let removal = ledger.remove(1);
        assert!(removal.imbalance);
        assert!(!removal.emptied());
    }

    #[test]
    fn test_clear() {
        let ledger = ListenerLedger::new();
        ledger.add("a");
        ledger.add("a");
        assert_eq!(ledger.clear(), 2);
        assert_eq!(ledger.total(), 0);
    }
}
