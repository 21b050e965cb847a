//! SNS subscription confirmation
//!
//! Before SNS delivers SES notifications it posts a `SubscriptionConfirmation`
//! whose `SubscribeURL` must be fetched once. The URL comes from an
//! unauthenticated request, so only HTTPS endpoints on AWS hosts are fetched.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use url::Url;

use crate::errors::BounceError;

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait SnsConfirmer: Send + Sync {
    async fn confirm(&self, subscribe_url: &Url) -> Result<(), BounceError>;
}

/// Accept only `https://*.amazonaws.com/...` subscription URLs
pub fn validate_subscribe_url(raw: &str) -> Result<Url, BounceError> {
    let url = Url::parse(raw).map_err(|e| BounceError::InvalidSubscribeUrl(e.to_string()))?;

    if url.scheme() != "https" {
        return Err(BounceError::InvalidSubscribeUrl(format!(
            "scheme '{}' is not https",
            url.scheme()
        )));
    }

    let host = url.host_str().unwrap_or_default();
    if !host.ends_with(".amazonaws.com") {
        return Err(BounceError::InvalidSubscribeUrl(format!(
            "host '{}' is not an AWS endpoint",
            host
        )));
    }

    Ok(url)
}

pub struct ReqwestSnsConfirmer {
    client: reqwest::Client,
}

impl ReqwestSnsConfirmer {
    /// Build the HTTP client; confirmation requests time out after 10 s.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(CONFIRM_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SnsConfirmer for ReqwestSnsConfirmer {
    async fn confirm(&self, subscribe_url: &Url) -> Result<(), BounceError> {
        self.client
            .get(subscribe_url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| BounceError::Confirmation(e.to_string()))?;

        info!(
            host = subscribe_url.host_str().unwrap_or_default(),
            "Confirmed SNS subscription"
        );
        Ok(())
    }
}
