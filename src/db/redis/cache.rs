use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The top-rated recipe listing
    TopRated,
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::TopRated => write!(f, "recipes:top-rated"),
        }
    }
}

/// Creates a Redis client for caching
///
/// Establishes a connection to Redis for fast data caching.
/// Uses connection pooling via the connection-manager feature.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Work item for the background cache writer
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CacheCommand {
    Set { key: String, value: String, ttl: u64 },
    Invalidate { key: String },
}

/// Cache handler for storing and retrieving data from Redis
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheCommand>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task, which flushes pending commands
    /// to Redis before exiting.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache instance with a background writer task
    ///
    /// Writes and invalidations are queued to the task so that cache traffic never
    /// holds up an API response.
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        let handle = CacheWriterHandle { shutdown_tx };

        (cache, handle)
    }

    /// Background task that applies queued cache commands
    ///
    /// On shutdown signal, drains everything still queued before exiting.
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheCommand>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(command) = write_rx.recv() => {
                    if let Err(e) = Self::apply(&client, command).await {
                        tracing::error!(error = %e, "Failed to apply Redis cache command");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining commands");

                    while let Ok(command) = write_rx.try_recv() {
                        if let Err(e) = Self::apply(&client, command).await {
                            tracing::error!(error = %e, "Failed to flush cache command during shutdown");
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn apply(client: &Client, command: CacheCommand) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        match command {
            CacheCommand::Set { key, value, ttl } => {
                let _: () = conn.set_ex(key, value, ttl).await?;
            }
            CacheCommand::Invalidate { key } => {
                let _: () = conn.del(key).await?;
            }
        }
        Ok(())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` if the key is absent or expired.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a write of `value` under `key`; returns without waiting for Redis.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        self.send(CacheCommand::Set {
            key: key.to_string(),
            value: json,
            ttl,
        });
    }

    /// Queues removal of `key`
    pub fn invalidate(&self, key: &CacheKey) {
        tracing::debug!(key = %key, "Invalidating cache entry");
        self.send(CacheCommand::Invalidate {
            key: key.to_string(),
        });
    }

    /// A cache whose commands land in the returned receiver instead of Redis
    #[cfg(test)]
    pub(crate) fn queued() -> (Self, mpsc::UnboundedReceiver<CacheCommand>) {
        let redis_client = Client::open("redis://127.0.0.1:6379").expect("valid redis url");
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        (Self { redis_client, write_tx }, write_rx)
    }

    fn send(&self, command: CacheCommand) {
        if let Err(e) = self.write_tx.send(command) {
            tracing::error!(error = %e, "Failed to queue cache command");
        }
    }
}
