//! Bounded log of settled invocations, ordered by completion.

use std::collections::VecDeque;

use uuid::Uuid;

use crate::invocation::InvocationResult;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    Settled(InvocationResult),
    Cleared,
}

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<InvocationResult>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Applies one event. Returns the entry evicted from the front, if any.
    pub fn apply(&mut self, event: HistoryEvent) -> Option<InvocationResult> {
        match event {
            HistoryEvent::Settled(result) => {
                let evicted = if self.entries.len() == self.capacity {
                    self.entries.pop_front()
                } else {
                    None
                };
                self.entries.push_back(result);
                evicted
            }
            HistoryEvent::Cleared => {
                self.entries.clear();
                None
            }
        }
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &InvocationResult> {
        self.entries.iter()
    }

    pub fn get(&self, uuid: Uuid) -> Option<&InvocationResult> {
        self.entries.iter().find(|entry| entry.uuid() == uuid)
    }

    pub fn last(&self) -> Option<&InvocationResult> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DEFAULT_HISTORY_CAPACITY, History, HistoryEvent};
    use crate::invocation::{InvocationResult, Outcome, PendingInvocation};

    fn settled(tag: usize) -> InvocationResult {
        PendingInvocation::new(format!("op-{tag}"), Vec::new()).settle(Outcome::Success(json!(tag)))
    }

    #[test]
    fn eleventh_completion_evicts_the_oldest() {
        let mut history = History::default();
        for tag in 0..DEFAULT_HISTORY_CAPACITY {
            assert!(history.apply(HistoryEvent::Settled(settled(tag))).is_none());
        }
        let evicted = history.apply(HistoryEvent::Settled(settled(10)));

        assert_eq!(evicted.map(|entry| entry.operation_id().to_string()), Some("op-0".to_string()));
        assert_eq!(history.len(), DEFAULT_HISTORY_CAPACITY);
        let ids = history
            .entries()
            .map(|entry| entry.operation_id().to_string())
            .collect::<Vec<_>>();
        let expected = (1..=10).map(|tag| format!("op-{tag}")).collect::<Vec<_>>();
        assert_eq!(ids, expected);
    }

    #[test]
    fn cleared_then_settled_appends_to_empty_history() {
        let mut history = History::new(3);
        history.apply(HistoryEvent::Settled(settled(1)));
        history.apply(HistoryEvent::Cleared);
        assert!(history.is_empty());

        let late = settled(2);
        let uuid = late.uuid();
        history.apply(HistoryEvent::Settled(late));
        assert_eq!(history.len(), 1);
        assert!(history.get(uuid).is_some());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut history = History::new(0);
        history.apply(HistoryEvent::Settled(settled(1)));
        history.apply(HistoryEvent::Settled(settled(2)));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.last().map(|entry| entry.operation_id()), Some("op-2"));
    }
}
