//! Redis Query Cache
//!
//! Production [`QueryCache`] backend over a multiplexed Redis connection.
//! The connection manager transparently reconnects after broken connections,
//! so a Redis restart degrades reads to cache misses instead of wedging the
//! query path.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client};

use crate::cache::{CacheError, QueryCache};

impl From<::redis::RedisError> for CacheError {
    fn from(e: ::redis::RedisError) -> Self {
        CacheError::Backend(e.to_string())
    }
}

pub struct RedisQueryCache {
    conn: ConnectionManager,
}

impl RedisQueryCache {
    /// Connect to `url` (`redis://[:password@]host:port/db`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(CacheError::from)?;
        let conn = client.get_connection_manager().await?;
        debug!("connected to redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl QueryCache for RedisQueryCache {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry; clamp to one second.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn invalidate(&self, prefix: &str) -> Result<u64, CacheError> {
        let pattern = format!("{}*", prefix);

        let mut scan_conn = self.conn.clone();
        let keys: Vec<String> = {
            let mut iter = scan_conn.scan_match::<_, String>(&pattern).await?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.clone();
        let deleted: u64 = conn.del(&keys).await?;
        Ok(deleted)
    }

    async fn health(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let pong: String = ::redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Backend(format!(
                "unexpected PING reply: {}",
                pong
            )))
        }
    }
}
