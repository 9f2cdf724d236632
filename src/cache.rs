use crate::errors::AppResult;
use crate::models::{CollectionDescriptor, CollectionKind};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Compute-once map. Each key owns a cell; the first caller for a key runs
/// the initializer while concurrent callers for the same key wait on it.
/// A failed initializer leaves the cell empty so the next call retries.
/// Entries are never evicted.
pub struct KeyedCache<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for KeyedCache<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let slots = self.slots.lock().await;
        slots.get(key).and_then(|slot| slot.get().cloned())
    }

    pub async fn get_or_try_init<F, Fut>(&self, key: K, init: F) -> AppResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<V>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry(key).or_default().clone()
        };
        slot.get_or_try_init(init).await.cloned()
    }

    pub async fn len(&self) -> usize {
        let slots = self.slots.lock().await;
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Process-lifetime state shared by every operation of one notebook: the
/// resolved collection of each kind, the page id of each day's note, and the
/// id of each daily note this process submitted a create for.
/// Dropping the owner is the only way to invalidate it.
#[derive(Default)]
pub struct StoreCache {
    pub collections: KeyedCache<CollectionKind, CollectionDescriptor>,
    pub daily_notes: KeyedCache<String, String>,
    pub created_daily_notes: KeyedCache<String, String>,
}

impl StoreCache {
    pub fn new() -> Self {
        Self::default()
    }
}
