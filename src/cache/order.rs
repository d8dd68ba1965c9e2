//! Insertion Order Module
//!
//! Tracks the oldest-first insertion order of store keys.

use std::collections::VecDeque;

use crate::models::RequestKey;

// == Insertion Order ==
/// Tracks insertion order for FIFO eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// Reads never touch this structure; only writes move a key.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<RequestKey>,
}

impl InsertionOrder {
    // == Constructor ==
    /// Creates a new empty order tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push Newest ==
    /// Records a write of `key`, moving it to the newest position.
    pub fn push_newest(&mut self, key: &RequestKey) {
        self.remove(key);
        self.order.push_back(key.clone());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &RequestKey) {
        self.order.retain(|k| k != key);
    }

    // == Peek Oldest ==
    /// Returns the oldest key without removing it.
    pub fn peek_oldest(&self) -> Option<&RequestKey> {
        self.order.front()
    }

    /// Keys oldest first.
    pub fn keys(&self) -> Vec<RequestKey> {
        self.order.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FetchRequest;

    fn key(path: &str) -> RequestKey {
        FetchRequest::get(&format!("https://tile.openstreetmap.org/{}", path))
            .unwrap()
            .key()
    }

    #[test]
    fn test_order_new() {
        let order = InsertionOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
        assert!(order.peek_oldest().is_none());
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut order = InsertionOrder::new();
        order.push_newest(&key("a"));
        order.push_newest(&key("b"));
        order.push_newest(&key("c"));

        assert_eq!(order.keys(), vec![key("a"), key("b"), key("c")]);
        assert_eq!(order.peek_oldest(), Some(&key("a")));
    }

    #[test]
    fn test_repush_moves_to_newest() {
        let mut order = InsertionOrder::new();
        order.push_newest(&key("a"));
        order.push_newest(&key("b"));
        order.push_newest(&key("c"));

        order.push_newest(&key("a"));

        assert_eq!(order.len(), 3);
        assert_eq!(order.keys(), vec![key("b"), key("c"), key("a")]);
    }

    #[test]
    fn test_remove() {
        let mut order = InsertionOrder::new();
        order.push_newest(&key("a"));
        order.push_newest(&key("b"));

        order.remove(&key("a"));
        order.remove(&key("missing"));

        assert_eq!(order.keys(), vec![key("b")]);
    }

    #[test]
    fn test_clear() {
        let mut order = InsertionOrder::new();
        order.push_newest(&key("a"));
        order.clear();
        assert!(order.is_empty());
    }
}
