//! Keyed write-once cache with per-key coalescing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

type Pending<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

enum Slot<T, E> {
    Ready(T),
    Pending(Pending<T, E>),
}

/// Write-once values keyed by string.
///
/// Concurrent initializations of the same key share one run of the
/// initializer, and every waiter sees its outcome, success or failure. A
/// failed run leaves the key empty, so the next caller runs it again.
/// Entries are never evicted.
pub struct KeyedCache<T, E> {
    slots: Mutex<HashMap<String, Slot<T, E>>>,
}

impl<T, E> Default for KeyedCache<T, E> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T, E> KeyedCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, running `init` unless a value is cached or a run is
    /// already in flight.
    pub async fn get_or_try_init<F, Fut>(&self, key: &str, init: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let pending = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            match slots.get(key) {
                Some(Slot::Ready(value)) => return Ok(value.clone()),
                Some(Slot::Pending(pending)) => pending.clone(),
                None => {
                    let pending = init().boxed().shared();
                    slots.insert(key.to_string(), Slot::Pending(pending.clone()));
                    pending
                }
            }
        };

        // The map lock is not held across the await; waiters poll the shared run
        let result = pending.clone().await;

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(Slot::Pending(current)) = slots.get(key)
            && current.ptr_eq(&pending)
        {
            match &result {
                Ok(value) => {
                    slots.insert(key.to_string(), Slot::Ready(value.clone()));
                }
                Err(_) => {
                    slots.remove(key);
                }
            }
        }
        result
    }

    /// Cached value, without initializing.
    pub fn get(&self, key: &str) -> Option<T> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match slots.get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Check if a value is cached for `key`.
    pub fn contains(&self, key: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(slots.get(key), Some(Slot::Ready(_)))
    }

    /// Keys with a cached value, sorted.
    pub fn keys(&self) -> Vec<String> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn counted<T: Send + 'static>(
        runs: &Arc<AtomicUsize>,
        out: Result<T, String>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<T, String>> {
        let runs = Arc::clone(runs);
        move || {
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                out
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_concurrent_inits_coalesce() {
        let cache: KeyedCache<u32, String> = KeyedCache::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let (a, b) = tokio::join!(
            cache.get_or_try_init("k", counted(&runs, Ok(7))),
            cache.get_or_try_init("k", counted(&runs, Ok(8)))
        );
        assert_eq!((a, b), (Ok(7), Ok(7)));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_failures_coalesce() {
        let cache: KeyedCache<u32, String> = KeyedCache::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let (a, b) = tokio::join!(
            cache.get_or_try_init("k", counted(&runs, Err("offline".to_string()))),
            cache.get_or_try_init("k", counted(&runs, Err("offline".to_string())))
        );
        assert_eq!(a, Err("offline".to_string()));
        assert_eq!(b, Err("offline".to_string()));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!cache.contains("k"));
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache: KeyedCache<u32, &str> = KeyedCache::new();
        let failed = cache
            .get_or_try_init("k", || async { Err::<u32, _>("offline") })
            .await;
        assert_eq!(failed, Err("offline"));
        assert!(!cache.contains("k"));

        let ok = cache.get_or_try_init("k", || async { Ok::<_, &str>(1) }).await;
        assert_eq!(ok, Ok(1));
        assert_eq!(cache.keys(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache: KeyedCache<u32, ()> = KeyedCache::new();
        let _ = cache.get_or_try_init("a", || async { Ok::<_, ()>(1) }).await;
        let _ = cache.get_or_try_init("b", || async { Err::<u32, _>(()) }).await;
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
    }
}
