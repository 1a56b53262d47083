use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use std::hash::Hash;
use std::time::Duration;

use crate::domain::{Client, ClientId};
use crate::ports::Cache;

/// Most clients kept at once; a freelancer's book rarely gets near it.
pub const CLIENT_CACHE_CAPACITY: u64 = 1_000;

pub struct MokaCacheAdapter<K, V> {
    inner: MokaCache<K, V>,
}

impl<K, V> MokaCacheAdapter<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();

        Self { inner: cache }
    }
}

impl MokaCacheAdapter<ClientId, Client> {
    /// Client records by id, dropped `ttl_seconds` after they were fetched
    /// or saved.
    pub fn for_clients(ttl_seconds: u64) -> Self {
        Self::new(Duration::from_secs(ttl_seconds), CLIENT_CACHE_CAPACITY)
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for MokaCacheAdapter<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }
}
