//! Mock transport for testing.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;

use super::AvatarTransport;
use crate::{AvatarError, AvatarLookupItem, AvatarLookupResponse};

/// Transport that answers every lookup with the same canned result.
#[derive(Clone)]
pub struct MockAvatarTransport {
    result: Arc<Result<AvatarLookupResponse, AvatarError>>,
    call_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<AvatarLookupItem>>>>,
}

impl MockAvatarTransport {
    /// Create a mock that always answers with `response`.
    pub fn returning(response: AvatarLookupResponse) -> Self {
        Self::with_result(Ok(response))
    }

    /// Create a mock that always fails with `error`.
    pub fn failing(error: AvatarError) -> Self {
        Self::with_result(Err(error))
    }

    /// Create a mock from a JSON response body, as the service would send it.
    pub fn from_json(body: serde_json::Value) -> Self {
        let response = serde_json::from_value(body)
            .map_err(|e| AvatarError::Parsing(e.to_string()));
        Self::with_result(response)
    }

    fn with_result(result: Result<AvatarLookupResponse, AvatarError>) -> Self {
        Self {
            result: Arc::new(result),
            call_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times `lookup` was called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Payloads of every lookup, in call order.
    pub fn requests(&self) -> Vec<Vec<AvatarLookupItem>> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AvatarTransport for MockAvatarTransport {
    async fn lookup(
        &self,
        items: &[AvatarLookupItem],
    ) -> Result<AvatarLookupResponse, AvatarError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(items.to_vec());
        }
        (*self.result).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_tracks_calls_and_payloads() {
        let transport = MockAvatarTransport::returning(AvatarLookupResponse::default());
        let items = vec![AvatarLookupItem {
            uuid: "a".to_string(),
            sizes: vec![80],
        }];

        transport.lookup(&items).await.unwrap();
        transport.lookup(&items).await.unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(transport.requests(), vec![items.clone(), items]);
    }

    #[tokio::test]
    async fn failing_mock_returns_error() {
        let transport = MockAvatarTransport::failing(AvatarError::Transport("down".to_string()));

        assert_eq!(
            transport.lookup(&[]).await.unwrap_err(),
            AvatarError::Transport("down".to_string())
        );
    }
}
