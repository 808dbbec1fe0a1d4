//! # Queue Store
//!
//! Bounded, priority-ordered store of pending cues.
//!
//! Items are kept in drain order: descending priority, arrival order within
//! a priority band. The head is always the next cue to play. When the store
//! is full the head itself is evicted to admit the newcomer, so a burst of
//! arrivals favors recency over seniority.

use std::collections::VecDeque;

use serde::Serialize;

use crate::item::QueueItem;

/// Result of offering an item to the store.
#[derive(Debug)]
pub enum InsertOutcome {
    /// The item was accepted. `evicted` carries the cue dropped to make
    /// room, if the store was full.
    Inserted {
        /// Cue evicted from the head, if any.
        evicted: Option<QueueItem>,
    },
    /// The item was refused outright. Only a zero-capacity store rejects.
    Rejected,
}

/// Snapshot of store occupancy.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StoreStatus {
    /// Number of pending cues.
    pub length: usize,
    /// Maximum number of pending cues.
    pub capacity: usize,
}

/// Priority-ordered bounded queue of pending cues.
///
/// Not internally synchronized; the controller guards access.
#[derive(Debug)]
pub struct QueueStore {
    items: VecDeque<QueueItem>,
    capacity: usize,
}

impl QueueStore {
    /// Creates a store holding at most `capacity` cues.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Offers an item to the store.
    ///
    /// A full store first evicts its head (the cue that would have drained
    /// next), then inserts the newcomer before the first strictly
    /// lower-priority cue. Equal priorities keep arrival order.
    pub fn insert(&mut self, item: QueueItem) -> InsertOutcome {
        if self.capacity == 0 {
            return InsertOutcome::Rejected;
        }

        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };

        let position = self
            .items
            .iter()
            .position(|queued| queued.priority < item.priority)
            .unwrap_or(self.items.len());
        self.items.insert(position, item);

        InsertOutcome::Inserted { evicted }
    }

    /// Removes and returns the next cue to play.
    pub fn remove_head(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    /// Drops every pending cue, returning them in drain order.
    pub fn clear(&mut self) -> Vec<QueueItem> {
        self.items.drain(..).collect()
    }

    /// Number of pending cues.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds no cues.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates pending cues in drain order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> {
        self.items.iter()
    }

    /// Occupancy snapshot.
    pub fn status(&self) -> StoreStatus {
        StoreStatus {
            length: self.items.len(),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::CueSource;

    fn file_cue(path: &str, priority: i32) -> QueueItem {
        QueueItem::local_file(path).with_priority(priority)
    }

    fn paths(store: &QueueStore) -> Vec<String> {
        store
            .iter()
            .map(|item| match &item.source {
                CueSource::LocalFile { path } => path.clone(),
                CueSource::InlineEncoded { .. } => "<encoded>".to_string(),
            })
            .collect()
    }

    #[test]
    fn default_priorities_drain_fifo() {
        let mut store = QueueStore::new(10);
        for name in ["a.ogg", "b.ogg", "c.ogg"] {
            store.insert(file_cue(name, 0));
        }
        assert_eq!(paths(&store), vec!["a.ogg", "b.ogg", "c.ogg"]);
    }

    #[test]
    fn higher_priority_drains_first() {
        let mut store = QueueStore::new(10);
        store.insert(file_cue("a.ogg", 0));
        store.insert(file_cue("b.ogg", 5));
        store.insert(file_cue("c.ogg", 0));
        store.insert(file_cue("d.ogg", 5));

        assert_eq!(paths(&store), vec!["b.ogg", "d.ogg", "a.ogg", "c.ogg"]);
    }

    #[test]
    fn negative_priorities_sink_below_defaults() {
        let mut store = QueueStore::new(10);
        store.insert(file_cue("low.ogg", -2));
        store.insert(file_cue("normal.ogg", 0));

        assert_eq!(paths(&store), vec!["normal.ogg", "low.ogg"]);
    }

    #[test]
    fn full_store_evicts_its_head() {
        let mut store = QueueStore::new(3);
        store.insert(file_cue("a.ogg", 0));
        store.insert(file_cue("b.ogg", 0));
        store.insert(file_cue("c.ogg", 0));

        let outcome = store.insert(file_cue("d.ogg", 0));
        match outcome {
            InsertOutcome::Inserted { evicted: Some(evicted) } => {
                assert_eq!(
                    evicted.source,
                    CueSource::LocalFile { path: "a.ogg".into() }
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.len(), 3);
        assert_eq!(paths(&store), vec!["b.ogg", "c.ogg", "d.ogg"]);
    }

    #[test]
    fn eviction_drops_next_to_drain_even_when_high_priority() {
        // The head is the oldest cue in the highest band. A full store
        // sacrifices exactly that cue, whatever the newcomer's priority.
        let mut store = QueueStore::new(2);
        store.insert(file_cue("urgent.ogg", 9));
        store.insert(file_cue("background.ogg", 0));

        let outcome = store.insert(file_cue("late.ogg", 0));
        match outcome {
            InsertOutcome::Inserted { evicted: Some(evicted) } => {
                assert_eq!(evicted.priority, 9);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(paths(&store), vec!["background.ogg", "late.ogg"]);
    }

    #[test]
    fn zero_capacity_rejects_everything() {
        let mut store = QueueStore::new(0);
        assert!(matches!(
            store.insert(file_cue("a.ogg", 0)),
            InsertOutcome::Rejected
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_head_pops_in_drain_order() {
        let mut store = QueueStore::new(10);
        store.insert(file_cue("a.ogg", 0));
        store.insert(file_cue("b.ogg", 3));

        let head = store.remove_head().unwrap();
        assert_eq!(head.priority, 3);
        let next = store.remove_head().unwrap();
        assert_eq!(next.priority, 0);
        assert!(store.remove_head().is_none());
    }

    #[test]
    fn clear_returns_dropped_cues() {
        let mut store = QueueStore::new(10);
        store.insert(file_cue("a.ogg", 0));
        store.insert(file_cue("b.ogg", 0));

        let dropped = store.clear();
        assert_eq!(dropped.len(), 2);
        assert!(store.is_empty());
        assert!(store.clear().is_empty());
    }

    #[test]
    fn status_reports_occupancy() {
        let mut store = QueueStore::new(5);
        store.insert(file_cue("a.ogg", 0));
        let status = store.status();
        assert_eq!(status.length, 1);
        assert_eq!(status.capacity, 5);
    }
}
