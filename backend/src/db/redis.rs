use anyhow::{bail, Context};
use bb8::Pool;
use bb8_redis::{redis, RedisConnectionManager};
use std::time::Duration;

use crate::config::Config;

pub type RedisPool = Pool<RedisConnectionManager>;

/// Connects the pool backing the TTL store. `None` means no Redis URL was
/// configured and the caller should fall back to the in-process store.
///
/// The pool is checked with a `PING` so a bad URL fails at startup rather
/// than on the first password reset.
pub async fn create_redis_pool(config: &Config) -> anyhow::Result<Option<RedisPool>> {
    let Some(url) = config.redis_url.as_deref() else {
        tracing::info!("Redis URL not set, using in-process TTL store");
        return Ok(None);
    };
    let target = redacted_url(url);
    let timeout = Duration::from_secs(config.redis_connect_timeout);

    let manager = RedisConnectionManager::new(url)
        .with_context(|| format!("Invalid REDIS_URL {target}"))?;
    let pool = Pool::builder()
        .max_size(config.redis_pool_size)
        .connection_timeout(timeout)
        .build(manager)
        .await
        .with_context(|| format!("Failed to build Redis pool for {target}"))?;

    ping(&pool)
        .await
        .with_context(|| format!("Redis at {target} is not answering"))?;

    tracing::info!(
        redis = %target,
        pool_size = config.redis_pool_size,
        connect_timeout_secs = config.redis_connect_timeout,
        "Redis TTL store ready"
    );
    Ok(Some(pool))
}

async fn ping(pool: &RedisPool) -> anyhow::Result<()> {
    let mut conn = pool.get().await?;
    let reply: String = redis::cmd("PING").query_async(&mut *conn).await?;
    if reply != "PONG" {
        bail!("unexpected PING reply {reply:?}");
    }
    Ok(())
}

/// Drops any `user:password@` part so the URL can be logged.
fn redacted_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return "<unparsed>".into();
    };
    match rest.rsplit_once('@') {
        Some((_, host)) => format!("{scheme}://***@{host}"),
        None => url.to_string(),
    }
}
