// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use reqwest::StatusCode;
use tracing::debug;

use crate::domain::adapter::AdapterError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Pooled HTTP client shared by all site adapters.
///
/// Status handling maps onto the retry taxonomy: 429 and 5xx are worth
/// retrying, other non-success statuses are not.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<String, AdapterError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| AdapterError::Fatal(format!("invalid url {url}: {e}")))?;
        debug!(url, "fetching");
        let response = self.client.get(parsed).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(AdapterError::Transient(format!("{url} answered {status}")));
        }
        if !status.is_success() {
            return Err(AdapterError::Fatal(format!("{url} answered {status}")));
        }

        Ok(response.text().await?)
    }
}
