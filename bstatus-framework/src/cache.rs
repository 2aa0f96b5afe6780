//! Short-lived memoization of expensive samples.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tokio::time::Instant;

/// Default lifetime of a cached sample.
pub const DEFAULT_TTL: Duration = Duration::from_millis(100);

/// A sample and the instant it resolved.
type Slot<V> = Arc<OnceCell<(Instant, V)>>;

/// Memoizes sampler results per kind for a short TTL.
///
/// The TTL runs from the moment a sample resolves. While a sample is in
/// flight every caller awaits the same cell, however long the query takes.
pub struct SnapshotCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> SnapshotCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `kind`, sampling if it has expired.
    pub async fn get_or_sample<F, Fut>(&self, kind: K, sample: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        self.get_or_sample_with_ttl(kind, self.ttl, sample).await
    }

    /// Like [`get_or_sample`](Self::get_or_sample) with an explicit TTL.
    pub async fn get_or_sample_with_ttl<F, Fut>(&self, kind: K, ttl: Duration, sample: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut entries = self.entries.lock();
            let fresh = |slot: &Slot<V>| match slot.get() {
                Some((resolved, _)) => resolved.elapsed() < ttl,
                None => true,
            };
            match entries.get(&kind) {
                Some(slot) if fresh(slot) => slot.clone(),
                _ => {
                    tracing::trace!("Snapshot expired, sampling");
                    let slot: Slot<V> = Arc::new(OnceCell::new());
                    entries.insert(kind, slot.clone());
                    slot
                }
            }
        };

        let (_, value) = cell
            .get_or_init(|| async move {
                let value = sample().await;
                (Instant::now(), value)
            })
            .await;
        value.clone()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<K, V> Default for SnapshotCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
