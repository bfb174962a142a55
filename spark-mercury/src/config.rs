use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MercuryConfig {
    /// WebSocket url of the Mercury registration, e.g. `wss://mercury.example.com/v1/apps/wx2/registrations`.
    pub url: String,
    /// Milliseconds between keep-alive pings. Zero is treated as one.
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    /// Milliseconds to wait for a pong before the connection is dropped.
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout: u64,
}

fn default_ping_interval() -> u64 {
    15_000
}

fn default_pong_timeout() -> u64 {
    14_000
}

impl MercuryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ping_interval: default_ping_interval(),
            pong_timeout: default_pong_timeout(),
        }
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval.max(1))
    }

    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout)
    }
}
