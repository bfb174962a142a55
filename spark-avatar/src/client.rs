use std::sync::Arc;

use moka::sync::Cache;
use tokio::sync::oneshot;
use tracing::debug;

use crate::{
    batcher::{Batcher, PendingRequest, QueueTx},
    transport::AvatarTransport,
    AvatarConfig, AvatarError, AvatarRecord,
};

type CacheKey = (String, u32);

/// Looks up avatar urls, coalescing concurrent lookups into bulk requests.
///
/// Every client owns its own batcher task and cache. Clones are handles to
/// the same instance. Must be created inside a Tokio runtime.
#[derive(Clone)]
pub struct AvatarClient {
    queue: QueueTx,
    cache: Cache<CacheKey, AvatarRecord>,
    default_size: u32,
}

impl AvatarClient {
    pub fn new<T: AvatarTransport>(transport: T, config: AvatarConfig) -> Self {
        Self::with_shared_transport(Arc::new(transport), config)
    }

    pub fn with_shared_transport<T: AvatarTransport>(
        transport: Arc<T>,
        config: AvatarConfig,
    ) -> Self {
        let cache = Cache::builder().time_to_live(config.cache_ttl()).build();

        Self {
            queue: Batcher::spawn(transport, &config),
            cache,
            default_size: config.default_avatar_size,
        }
    }

    /// Resolves the url of `user_id`'s avatar closest to `size`.
    ///
    /// `None` uses the configured default size.
    pub async fn retrieve_avatar_url(
        &self,
        user_id: &str,
        size: Option<u32>,
    ) -> Result<String, AvatarError> {
        self.retrieve_avatar(user_id, size)
            .await
            .map(|record| record.url)
    }

    /// Like [`Self::retrieve_avatar_url`], but returns the whole record,
    /// including the actual size of the image.
    pub async fn retrieve_avatar(
        &self,
        user_id: &str,
        size: Option<u32>,
    ) -> Result<AvatarRecord, AvatarError> {
        if user_id.trim().is_empty() {
            return Err(AvatarError::MissingUser);
        }

        let size = match size {
            Some(0) => return Err(AvatarError::InvalidSize),
            Some(size) => size,
            None => self.default_size,
        };

        let key = (user_id.to_string(), size);
        if let Some(record) = self.cache.get(&key) {
            debug!(user_id, size, "Avatar url served from cache");
            return Ok(record);
        }

        let (reply, response) = oneshot::channel();
        self.queue
            .send(PendingRequest {
                user_id: key.0.clone(),
                size,
                reply,
            })
            .map_err(|_| AvatarError::BatcherClosed)?;

        let record = response.await.map_err(|_| AvatarError::BatcherClosed)??;
        self.cache.insert(key, record.clone());

        Ok(record)
    }

    /// Drops every cached size for `user_id`.
    pub fn invalidate_user(&self, user_id: &str) {
        let keys = self
            .cache
            .iter()
            .filter(|(key, _)| key.0 == user_id)
            .map(|(key, _)| key)
            .collect::<Vec<_>>();

        for key in keys {
            self.cache.invalidate(key.as_ref());
        }
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}
