use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use tokio::time::timeout;

use crate::{
    KvStoreError, Result,
    store::KvStore,
};

/// Compare-and-swap as a server-side script. ARGV[3] is the new TTL in
/// milliseconds, or -1 to store without expiry.
const CAS_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  if ARGV[3] == '-1' then
    redis.call('SET', KEYS[1], ARGV[2])
  else
    redis.call('SET', KEYS[1], ARGV[2], 'PX', ARGV[3])
  end
  return 1
else
  return 0
end
"#;

/// Compare-and-delete as a server-side script.
const CAD_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  return redis.call('DEL', KEYS[1])
else
  return 0
end
"#;

/// Redis-backed key-value store.
///
/// Uses `redis::aio::ConnectionManager` for pooled async operations with
/// automatic reconnection. Keys are namespaced with a prefix so independent
/// deployments can share one Redis instance. `set_if_absent` maps to
/// `SET NX PX`; compare-and-swap and compare-and-delete run as Lua scripts
/// so the read and the write are atomic on the server.
#[derive(Clone)]
pub struct RedisKvStore {
    conn: ConnectionManager,
    prefix: String,
    cas_script: Arc<Script>,
    cad_script: Arc<Script>,
}

impl RedisKvStore {
    /// Connects to Redis with a default timeout of 3 seconds.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `prefix` - Key prefix for namespace isolation (e.g., "orders")
    pub async fn connect(url: &str, prefix: &str) -> Result<Self> {
        Self::with_timeout(url, prefix, Duration::from_secs(3)).await
    }

    /// Connects to Redis, bounding the connection attempt by `connection_timeout`.
    pub async fn with_timeout(
        url: &str,
        prefix: &str,
        connection_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::open(url)?;

        let conn = timeout(connection_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| KvStoreError::ConnectTimeout {
                url: url.to_string(),
                timeout: connection_timeout,
            })??;

        tracing::debug!(url, prefix, "connected to redis");

        Ok(Self {
            conn,
            prefix: prefix.to_string(),
            cas_script: Arc::new(Script::new(CAS_SCRIPT)),
            cad_script: Arc::new(Script::new(CAD_SCRIPT)),
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    // PX requires a positive integer
    (ttl.as_millis() as u64).max(1)
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<bool> {
        let mut conn = self.conn.clone();
        let key = self.namespaced(key);

        let mut cmd = redis::cmd("SET");
        cmd.arg(&key).arg(value).arg("NX");
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }

        let reply: Option<String> = cmd.query_async(&mut conn).await?;
        Ok(reply.is_some())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &[u8],
        new: &[u8],
        ttl: Option<Duration>,
    ) -> Result<bool> {
        let mut conn = self.conn.clone();
        let ttl_arg: i64 = ttl.map(|t| ttl_millis(t) as i64).unwrap_or(-1);

        let replaced: i64 = self
            .cas_script
            .key(self.namespaced(key))
            .arg(expected)
            .arg(new)
            .arg(ttl_arg)
            .invoke_async(&mut conn)
            .await?;
        Ok(replaced == 1)
    }

    async fn compare_and_delete(&self, key: &str, expected: &[u8]) -> Result<bool> {
        let mut conn = self.conn.clone();

        let deleted: i64 = self
            .cad_script
            .key(self.namespaced(key))
            .arg(expected)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }

    async fn increment(&self, key: &str, ttl: Option<Duration>) -> Result<i64> {
        let mut conn = self.conn.clone();
        let key = self.namespaced(key);

        let count: i64 = conn.incr(&key, 1).await?;
        if count == 1
            && let Some(ttl) = ttl
        {
            let _: i64 = conn.pexpire(&key, ttl_millis(ttl) as i64).await?;
        }
        Ok(count)
    }

    async fn time_to_live(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.conn.clone();

        // PTTL returns -2 for a missing key and -1 for a key without expiry
        let pttl: i64 = redis::cmd("PTTL")
            .arg(self.namespaced(key))
            .query_async(&mut conn)
            .await?;

        if pttl < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_millis(pttl as u64)))
        }
    }
}
