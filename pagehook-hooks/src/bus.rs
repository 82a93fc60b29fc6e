//! In-memory event bus

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::callback::{NotificationFn, TransformFn};
use crate::host::EventBus;

struct Entry<F> {
    callback: F,
    priority: i32,
    arity: usize,
}

/// Inserts after every entry with priority <= `priority`, which keeps
/// registration order among equal priorities.
fn insert_by_priority<F>(entries: &mut Vec<Entry<F>>, entry: Entry<F>) {
    let at = entries.partition_point(|existing| existing.priority <= entry.priority);
    entries.insert(at, entry);
}

/// [`EventBus`] backed by per-trigger vectors kept in dispatch order.
#[derive(Default)]
pub struct MemoryBus {
    notifications: HashMap<String, Vec<Entry<NotificationFn>>>,
    transforms: HashMap<String, Vec<Entry<TransformFn>>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any notification is registered on `trigger`.
    pub fn has_notifications(&self, trigger: &str) -> bool {
        self.notifications
            .get(trigger)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Whether any transform is registered on `trigger`.
    pub fn has_transforms(&self, trigger: &str) -> bool {
        self.transforms
            .get(trigger)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Total number of registered callbacks of both kinds.
    pub fn len(&self) -> usize {
        self.notifications.values().map(Vec::len).sum::<usize>()
            + self.transforms.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut notifications: Vec<_> = self
            .notifications
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        notifications.sort_unstable();
        let mut transforms: Vec<_> = self
            .transforms
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        transforms.sort_unstable();
        f.debug_struct("MemoryBus")
            .field("notifications", &notifications)
            .field("transforms", &transforms)
            .finish()
    }
}

impl EventBus for MemoryBus {
    fn register_notification(
        &mut self,
        trigger: &str,
        callback: NotificationFn,
        priority: i32,
        arity: usize,
    ) -> bool {
        if trigger.is_empty() {
            debug!("Rejecting notification with empty trigger");
            return false;
        }
        trace!("Registering notification on '{}' (priority {})", trigger, priority);
        insert_by_priority(
            self.notifications.entry(trigger.to_string()).or_default(),
            Entry {
                callback,
                priority,
                arity,
            },
        );
        true
    }

    fn register_transform(
        &mut self,
        trigger: &str,
        callback: TransformFn,
        priority: i32,
        arity: usize,
    ) -> bool {
        if trigger.is_empty() {
            debug!("Rejecting transform with empty trigger");
            return false;
        }
        trace!("Registering transform on '{}' (priority {})", trigger, priority);
        insert_by_priority(
            self.transforms.entry(trigger.to_string()).or_default(),
            Entry {
                callback,
                priority,
                arity,
            },
        );
        true
    }

    fn notifications(&self, trigger: &str) -> Vec<(NotificationFn, usize)> {
        self.notifications
            .get(trigger)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| (e.callback.clone(), e.arity))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn transforms(&self, trigger: &str) -> Vec<(TransformFn, usize)> {
        self.transforms
            .get(trigger)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| (e.callback.clone(), e.arity))
                    .collect()
            })
            .unwrap_or_default()
    }
}
