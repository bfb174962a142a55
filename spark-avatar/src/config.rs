use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Batching and caching knobs for [`crate::AvatarClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Milliseconds of inactivity after which an open batch is sent.
    pub batcher_wait: u64,
    /// Number of distinct requests that sends a batch immediately.
    pub batcher_max_calls: usize,
    /// Upper bound, in milliseconds, on how long a batch stays open.
    pub batcher_max_wait: u64,
    /// Seconds a resolved avatar url stays cached.
    pub cache_expiration: u64,
    /// Size used when a caller does not ask for one.
    pub default_avatar_size: u32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            batcher_wait: 100,
            batcher_max_calls: 100,
            batcher_max_wait: 1500,
            cache_expiration: 60 * 60,
            default_avatar_size: 80,
        }
    }
}

impl AvatarConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.batcher_wait)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.batcher_max_wait)
    }

    pub fn max_calls(&self) -> usize {
        self.batcher_max_calls.max(1)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expiration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AvatarConfig = serde_json::from_str(r#"{"batcher_wait": 1500}"#).unwrap();

        assert_eq!(config.wait(), Duration::from_millis(1500));
        assert_eq!(config.max_calls(), 100);
        assert_eq!(config.default_avatar_size, 80);
    }

    #[test]
    fn zero_max_calls_still_allows_one_request_per_batch() {
        let config = AvatarConfig {
            batcher_max_calls: 0,
            ..Default::default()
        };

        assert_eq!(config.max_calls(), 1);
    }
}
