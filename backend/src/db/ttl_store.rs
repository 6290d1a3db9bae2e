//! Key-value storage whose entries expire on their own.
//!
//! Production uses Redis; the in-process store backs local runs without a
//! Redis URL and the test suites.

use async_trait::async_trait;
use bb8_redis::redis::{self, AsyncCommands};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::db::redis::RedisPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TtlStore: Send + Sync {
    async fn set_with_expiry(&self, key: &str, value: &str, ttl_seconds: u64)
        -> anyhow::Result<()>;
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    /// Returns whether a live key was removed.
    async fn delete(&self, key: &str) -> anyhow::Result<bool>;
    /// Atomically adds one to a counter, creating it at 1 when absent, and
    /// refreshes its expiry. Returns the new value.
    async fn increment(&self, key: &str, ttl_seconds: u64) -> anyhow::Result<u64>;
}

pub struct RedisTtlStore {
    pool: RedisPool,
}

impl RedisTtlStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TtlStore for RedisTtlStore {
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<()> {
        tracing::debug!(namespace = key_namespace(key), ttl_seconds, "redis SET EX");
        let mut conn = self.pool.get().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        tracing::debug!(namespace = key_namespace(key), "redis GET");
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> anyhow::Result<bool> {
        tracing::debug!(namespace = key_namespace(key), "redis DEL");
        let mut conn = self.pool.get().await?;
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn increment(&self, key: &str, ttl_seconds: u64) -> anyhow::Result<u64> {
        tracing::debug!(namespace = key_namespace(key), ttl_seconds, "redis INCR");
        let mut conn = self.pool.get().await?;
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, ttl_seconds as i64)
            .ignore()
            .query_async(&mut *conn)
            .await?;
        Ok(count)
    }
}

// Keys embed emails and reset tokens, so only the prefix is logged.
fn key_namespace(key: &str) -> &str {
    key.split_once(':').map(|(prefix, _)| prefix).unwrap_or("")
}

#[derive(Default)]
pub struct MemoryTtlStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryTtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, HashMap<String, (String, Instant)>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("in-process TTL store lock poisoned"))
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> anyhow::Result<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_seconds);
        self.lock()?
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut entries = self.lock()?;
        let expired = match entries.get(key) {
            Some((_, deadline)) => Instant::now() >= *deadline,
            None => return Ok(None),
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<bool> {
        let removed = self.lock()?.remove(key);
        Ok(matches!(removed, Some((_, deadline)) if Instant::now() < deadline))
    }

    async fn increment(&self, key: &str, ttl_seconds: u64) -> anyhow::Result<u64> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let current = match entries.get(key) {
            Some((value, deadline)) if now < *deadline => value
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("value is not an integer"))?,
            _ => 0,
        };
        let next = current + 1;
        entries.insert(
            key.to_string(),
            (next.to_string(), now + Duration::from_secs(ttl_seconds)),
        );
        Ok(next)
    }
}
