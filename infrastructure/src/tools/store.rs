//! Session-scoped registry of loaded DataFrames.

use super::dataframe::DataFrame;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Prefix of every id handed out by the store
pub const DATAFRAME_ID_PREFIX: &str = "dataframe_";

/// Capacity-bounded map from opaque id to [`DataFrame`].
///
/// Ids look like `dataframe_<32 hex>`. When full, inserting evicts the
/// oldest frame.
#[derive(Debug)]
pub struct DataFrameStore {
    frames: HashMap<String, DataFrame>,
    order: VecDeque<String>,
    capacity: usize,
}

impl DataFrameStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Register a frame and return its new id
    pub fn insert(&mut self, frame: DataFrame) -> String {
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                debug!("Evicting {}", oldest);
                self.frames.remove(&oldest);
            }
        }
        let id = format!("{}{}", DATAFRAME_ID_PREFIX, uuid::Uuid::new_v4().simple());
        self.order.push_back(id.clone());
        self.frames.insert(id.clone(), frame);
        id
    }

    pub fn get(&self, id: &str) -> Option<&DataFrame> {
        self.frames.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.frames.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_prefixed_and_unique() {
        let mut store = DataFrameStore::new(4);
        let a = store.insert(DataFrame::default());
        let b = store.insert(DataFrame::default());
        assert!(a.starts_with(DATAFRAME_ID_PREFIX));
        assert_eq!(a.len(), DATAFRAME_ID_PREFIX.len() + 32);
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_oldest_is_evicted_at_capacity() {
        let mut store = DataFrameStore::new(2);
        let first = store.insert(DataFrame::default());
        let second = store.insert(DataFrame::default());
        let third = store.insert(DataFrame::default());

        assert!(!store.contains(&first));
        assert!(store.contains(&second));
        assert!(store.contains(&third));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut store = DataFrameStore::new(0);
        let id = store.insert(DataFrame::default());
        assert!(store.get(&id).is_some());
        assert_eq!(store.capacity(), 1);
    }
}
