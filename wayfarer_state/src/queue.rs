// Copyright 2025 the Wayfarer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A bounded FIFO queue that reports evictions.
//!
//! ## Usage
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use wayfarer_state::queue::Queue;
//!
//! let evicted = Arc::new(Mutex::new(Vec::new()));
//! let mut q = Queue::new(Some(2));
//! let sink = evicted.clone();
//! q.on_evict(move |item: &char| sink.lock().unwrap().push(*item));
//!
//! q.enqueue('a');
//! q.enqueue('b');
//! q.enqueue('c');
//! assert_eq!(q.to_vec(), vec!['b', 'c']);
//! assert_eq!(*evicted.lock().unwrap(), vec!['a']);
//! ```

use std::collections::VecDeque;

type EvictListener<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Ordered sequence with an optional capacity.
///
/// Invariant: after any mutating call returns, `size() <= limit`.
pub struct Queue<T> {
    items: VecDeque<T>,
    limit: Option<usize>,
    evict_listeners: Vec<EvictListener<T>>,
}

impl<T: core::fmt::Debug> core::fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Queue")
            .field("items", &self.items)
            .field("limit", &self.limit)
            .field("evict_listeners", &self.evict_listeners.len())
            .finish()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T> Queue<T> {
    /// Create an empty queue; `None` means unbounded.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            items: VecDeque::new(),
            limit,
            evict_listeners: Vec::new(),
        }
    }

    /// Create a queue pre-filled with `items`, trimming from the head to `limit`.
    pub fn with_items(items: impl IntoIterator<Item = T>, limit: Option<usize>) -> Self {
        let mut q = Self::new(limit);
        q.items.extend(items);
        q.trim();
        q
    }

    /// Capacity, if bounded.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Register a listener called with every evicted item, in registration order.
    pub fn on_evict(&mut self, listener: impl Fn(&T) + Send + Sync + 'static) {
        self.evict_listeners.push(Box::new(listener));
    }

    /// Append `item`, evicting from the head while over capacity.
    ///
    /// Returns the enqueued item, or `None` if a zero limit evicted it at once.
    pub fn enqueue(&mut self, item: T) -> Option<&T> {
        self.items.push_back(item);
        let before = self.items.len();
        self.trim();
        // Only a zero limit can evict the item that was just pushed.
        if before > 0 && self.items.is_empty() {
            return None;
        }
        self.items.back()
    }

    fn trim(&mut self) {
        while self.limit.is_some_and(|l| self.items.len() > l) {
            if self.evict().is_none() {
                break;
            }
        }
    }

    /// Remove the head item and report it to the eviction listeners.
    pub fn evict(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        for listener in &self.evict_listeners {
            listener(&item);
        }
        Some(item)
    }

    /// Remove the head item without notifying listeners.
    pub fn dequeue(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Remove every item, returning them head first.
    pub fn clear(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    /// Number of items.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove the first item for which `pred` holds.
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let idx = self.items.iter().position(pred)?;
        self.items.remove(idx)
    }

    /// Oldest item.
    pub fn peek_head(&self) -> Option<&T> {
        self.items.front()
    }

    /// Newest item.
    pub fn peek_tail(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: PartialEq> Queue<T> {
    /// Remove the first occurrence equal to `item`.
    pub fn remove(&mut self, item: &T) -> Option<T> {
        self.remove_where(|x| x == item)
    }
}

impl<T: Clone> Queue<T> {
    /// Snapshot of the items, head first.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording(limit: Option<usize>) -> (Queue<&'static str>, Arc<Mutex<Vec<&'static str>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut q = Queue::new(limit);
        let sink = log.clone();
        q.on_evict(move |item| sink.lock().expect("not poisoned").push(*item));
        (q, log)
    }

    #[test]
    fn enqueue_past_limit_evicts_oldest() {
        let (mut q, log) = recording(Some(2));
        assert_eq!(q.enqueue("a"), Some(&"a"));
        q.enqueue("b");
        assert_eq!(q.enqueue("c"), Some(&"c"));
        assert_eq!(q.to_vec(), vec!["b", "c"]);
        assert_eq!(*log.lock().expect("not poisoned"), vec!["a"]);
        assert_eq!(q.size(), 2);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut q = Queue::new(Some(1));
        for tag in ["first", "second"] {
            let sink = order.clone();
            q.on_evict(move |item: &u8| sink.lock().expect("not poisoned").push((tag, *item)));
        }
        q.enqueue(1);
        q.enqueue(2);
        assert_eq!(
            *order.lock().expect("not poisoned"),
            vec![("first", 1), ("second", 1)]
        );
    }

    #[test]
    fn zero_limit_evicts_immediately() {
        let (mut q, log) = recording(Some(0));
        assert_eq!(q.enqueue("a"), None);
        assert!(q.is_empty());
        assert_eq!(*log.lock().expect("not poisoned"), vec!["a"]);
    }

    #[test]
    fn evict_and_dequeue_on_empty_return_none() {
        let (mut q, log) = recording(None);
        assert_eq!(q.evict(), None);
        assert_eq!(q.dequeue(), None);
        assert!(log.lock().expect("not poisoned").is_empty());
    }

    #[test]
    fn dequeue_does_not_notify_but_evict_does() {
        let (mut q, log) = recording(None);
        q.enqueue("a");
        q.enqueue("b");
        assert_eq!(q.dequeue(), Some("a"));
        assert_eq!(q.evict(), Some("b"));
        assert_eq!(*log.lock().expect("not poisoned"), vec!["b"]);
    }

    #[test]
    fn remove_excises_first_match() {
        let mut q = Queue::with_items([1, 2, 3, 2], None);
        assert_eq!(q.remove(&2), Some(2));
        assert_eq!(q.to_vec(), vec![1, 3, 2]);
        assert_eq!(q.remove(&9), None);
        assert_eq!(q.peek_head(), Some(&1));
        assert_eq!(q.peek_tail(), Some(&2));
    }

    #[test]
    fn with_items_respects_limit() {
        let q = Queue::with_items([1, 2, 3], Some(2));
        assert_eq!(q.to_vec(), vec![2, 3]);
    }

    #[test]
    fn clear_returns_items_in_order() {
        let mut q = Queue::with_items(["x", "y"], None);
        assert_eq!(q.clear(), vec!["x", "y"]);
        assert_eq!(q.size(), 0);
    }
}
