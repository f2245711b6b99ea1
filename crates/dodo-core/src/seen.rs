//! Processed-ID set: bounded memory of messages already triaged.
//!
//! Persisted through a [`PropertyStore`] as a JSON array of ids, most
//! recent first.

use std::collections::{HashSet, VecDeque};

use tracing::warn;

use crate::domain::{MessageId, StoreError};
use crate::ports::PropertyStore;

pub const PROCESSED_IDS_KEY: &str = "LAST_PROCESSED_MESSAGE_IDS";
pub const DEFAULT_CAPACITY: usize = 50;

/// Ordered, capacity-bounded set of message ids.
///
/// Inserting beyond capacity evicts the oldest entry. Membership is a hash
/// lookup; the deque only keeps the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedIdSet {
    order: VecDeque<MessageId>,
    members: HashSet<MessageId>,
    capacity: usize,
}

impl ProcessedIdSet {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a set from ids listed most recent first, dropping duplicates
    /// and anything past capacity.
    pub fn from_recent_first<I>(ids: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = MessageId>,
    {
        let mut set = Self::new(capacity);
        for id in ids {
            if set.order.len() == set.capacity {
                break;
            }
            if set.members.insert(id.clone()) {
                set.order.push_back(id);
            }
        }
        set
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.members.contains(id)
    }

    /// Records `id` as the most recent entry. Returns the evicted id, if
    /// any. Re-inserting a member moves it to the front.
    pub fn insert(&mut self, id: MessageId) -> Option<MessageId> {
        if self.members.contains(&id) {
            self.order.retain(|existing| existing != &id);
            self.order.push_front(id);
            return None;
        }
        self.members.insert(id.clone());
        self.order.push_front(id);
        if self.order.len() > self.capacity {
            let evicted = self.order.pop_back()?;
            self.members.remove(&evicted);
            return Some(evicted);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &MessageId> {
        self.order.iter()
    }

    pub fn to_json(&self) -> String {
        let ids: Vec<&str> = self.order.iter().map(MessageId::as_str).collect();
        serde_json::Value::from(ids).to_string()
    }

    /// Unparseable or non-array values load as an empty set.
    pub fn from_json(raw: &str, capacity: usize) -> Self {
        match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            Ok(values) => Self::from_recent_first(
                values
                    .into_iter()
                    .filter_map(|v| v.as_str().map(MessageId::new)),
                capacity,
            ),
            Err(err) => {
                warn!(error = %err, "stored processed ids are not a JSON array, starting empty");
                Self::new(capacity)
            }
        }
    }
}

/// Loads and saves a [`ProcessedIdSet`] under [`PROCESSED_IDS_KEY`].
pub struct SeenStore<'a> {
    properties: &'a dyn PropertyStore,
    capacity: usize,
}

impl<'a> SeenStore<'a> {
    pub fn new(properties: &'a dyn PropertyStore, capacity: usize) -> Self {
        Self {
            properties,
            capacity,
        }
    }

    pub async fn load(&self) -> Result<ProcessedIdSet, StoreError> {
        match self.properties.get(PROCESSED_IDS_KEY).await? {
            Some(raw) => Ok(ProcessedIdSet::from_json(&raw, self.capacity)),
            None => Ok(ProcessedIdSet::new(self.capacity)),
        }
    }

    pub async fn save(&self, set: &ProcessedIdSet) -> Result<(), StoreError> {
        self.properties.set(PROCESSED_IDS_KEY, &set.to_json()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryProperties;

    fn ids(set: &ProcessedIdSet) -> Vec<&str> {
        set.iter().map(MessageId::as_str).collect()
    }

    #[test]
    fn full_set_evicts_exactly_the_oldest() {
        let mut set = ProcessedIdSet::new(DEFAULT_CAPACITY);
        for i in 0..DEFAULT_CAPACITY {
            assert_eq!(set.insert(MessageId::new(format!("m{i}"))), None);
        }
        assert_eq!(set.len(), 50);

        let evicted = set.insert(MessageId::new("new"));
        assert_eq!(evicted, Some(MessageId::new("m0")));
        assert_eq!(set.len(), 50);
        assert!(set.contains(&MessageId::new("new")));
        assert!(!set.contains(&MessageId::new("m0")));
        assert!(set.contains(&MessageId::new("m1")));
        assert_eq!(ids(&set)[0], "new");
    }

    #[test]
    fn reinsert_moves_to_front_without_growing() {
        let mut set = ProcessedIdSet::new(3);
        for id in ["a", "b", "c"] {
            set.insert(MessageId::new(id));
        }
        assert_eq!(set.insert(MessageId::new("a")), None);
        assert_eq!(ids(&set), vec!["a", "c", "b"]);
    }

    #[test]
    fn json_is_most_recent_first() {
        let mut set = ProcessedIdSet::new(5);
        set.insert(MessageId::new("old"));
        set.insert(MessageId::new("new"));
        assert_eq!(set.to_json(), r#"["new","old"]"#);
    }

    #[test]
    fn stored_list_is_deduped_and_truncated() {
        let set = ProcessedIdSet::from_json(r#"["a","b","a",7,"c","d"]"#, 3);
        assert_eq!(ids(&set), vec!["a", "b", "c"]);
    }

    #[test]
    fn garbage_loads_empty() {
        assert!(ProcessedIdSet::from_json("not json", 5).is_empty());
        assert!(ProcessedIdSet::from_json(r#"{"a":1}"#, 5).is_empty());
    }

    #[tokio::test]
    async fn seen_store_round_trips_through_properties() {
        let props = InMemoryProperties::new();
        let store = SeenStore::new(&props, 10);
        assert!(store.load().await.unwrap().is_empty());

        let mut set = store.load().await.unwrap();
        set.insert(MessageId::new("m1"));
        store.save(&set).await.unwrap();

        assert_eq!(
            props.get(PROCESSED_IDS_KEY).await.unwrap().as_deref(),
            Some(r#"["m1"]"#)
        );
        assert!(store.load().await.unwrap().contains(&MessageId::new("m1")));
    }
}
