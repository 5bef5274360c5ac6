use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Query results keyed by query and parameters.
///
/// Entries are dropped explicitly after writes; the optional max age only
/// bounds how stale a reader can get when another process writes the store.
#[derive(Debug)]
pub struct QueryCache<K, V> {
    max_age: Option<Duration>,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> QueryCache<K, V> {
    pub fn new(max_age: Option<Duration>) -> Self {
        QueryCache {
            max_age,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let (stored_at, value) = self.entries.get(key)?;
        match self.max_age {
            Some(age) if stored_at.elapsed() > age => None,
            _ => Some(value.clone()),
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_invalidation() {
        let mut cache: QueryCache<(String, String), usize> = QueryCache::new(None);
        let key = ("Alice".to_string(), "March".to_string());
        cache.insert(key.clone(), 3);
        assert_eq!(cache.get(&key), Some(3));
        cache.invalidate(&key);
        assert_eq!(cache.get(&key), None);

        cache.insert(key.clone(), 4);
        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn max_age_expires_entries() {
        let mut cache: QueryCache<&str, u8> = QueryCache::new(Some(Duration::ZERO));
        cache.insert("k", 1);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(cache.get(&"k"), None);
    }
}
