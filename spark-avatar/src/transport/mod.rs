//! Outbound side of the avatar client.
//!
//! The batcher only knows about [`AvatarTransport`]; the HTTP implementation
//! talks to the avatar service and the mock is used in tests.

mod http;
#[cfg(test)]
mod mock;

use async_trait::async_trait;

pub use http::HttpAvatarTransport;
#[cfg(test)]
pub(crate) use mock::MockAvatarTransport;

use crate::{AvatarError, AvatarLookupItem, AvatarLookupResponse};

/// Performs one bulk avatar lookup.
#[async_trait]
pub trait AvatarTransport: Send + Sync + 'static {
    async fn lookup(
        &self,
        items: &[AvatarLookupItem],
    ) -> Result<AvatarLookupResponse, AvatarError>;
}
