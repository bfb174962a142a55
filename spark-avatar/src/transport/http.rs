use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use tracing::instrument;

use super::AvatarTransport;
use crate::{AvatarError, AvatarLookupItem, AvatarLookupResponse, AvatarURL};

const LOOKUP_PATH: &str = "/profiles/urls";
const TRACKING_ID_HEADER: &str = "TrackingID";

/// Avatar service client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpAvatarTransport {
    client: Client,
    lookup_url: AvatarURL,
    access_token: String,
}

impl HttpAvatarTransport {
    pub fn new(avatar_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), avatar_url, access_token)
    }

    pub fn with_client(
        client: Client,
        avatar_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            lookup_url: AvatarURL::new(avatar_url).append_path(LOOKUP_PATH),
            access_token: access_token.into(),
        }
    }

    fn tracking_id() -> String {
        format!("spark-rs_{}", uuid::Uuid::new_v4())
    }
}

#[async_trait]
impl AvatarTransport for HttpAvatarTransport {
    #[instrument(name = "HttpAvatarTransport::lookup", skip(self, items), fields(users = items.len()))]
    async fn lookup(
        &self,
        items: &[AvatarLookupItem],
    ) -> Result<AvatarLookupResponse, AvatarError> {
        let resp = self
            .client
            .post(self.lookup_url.as_ref())
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(TRACKING_ID_HEADER, Self::tracking_id())
            .json(items)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AvatarError::Unauthorized);
        }

        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(AvatarError::Http {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<AvatarLookupResponse>().await.map_err(|e| {
            AvatarError::Parsing(format!("Failed to parse avatar response as JSON: {}", e))
        })
    }
}
