// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::models::{RawItem, SiteQuery};

/// Adapter-level error taxonomy.
///
/// Transient and timeout errors are retried within the batch; a fatal
/// error means the site's page structure changed and the site is skipped
/// for the remainder of the batch.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("transient error: {0}")]
    Transient(String),
    #[error("site structure changed: {0}")]
    Fatal(String),
    #[error("timeout")]
    Timeout,
    #[error("cancelled")]
    Cancelled,
}

impl AdapterError {
    pub fn is_retryable(&self) -> bool {
        match self {
            AdapterError::Request(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            AdapterError::Transient(_) | AdapterError::Timeout => true,
            AdapterError::Fatal(_) | AdapterError::Cancelled => false,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, AdapterError::Fatal(_))
    }
}

/// The site-specific collaborator consumed by the crawl orchestrator.
///
/// One independent implementation per marketplace; how a page is obtained
/// (plain fetch, rendered browser) is opaque to the orchestrator.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Stable site identifier ("divar", "bama", ...).
    fn name(&self) -> &'static str;

    /// Render the site's search URL from the query's filter vocabulary.
    fn build_search_url(&self, filters: &BTreeMap<String, Value>) -> Result<String, AdapterError>;

    /// Obtain the raw content behind a URL.
    async fn fetch(&self, url: &str) -> Result<String, AdapterError>;

    /// Parse raw content into listings. An unrecognizable page is a fatal
    /// error; an empty result list is not.
    fn extract_items(&self, content: &str) -> Result<Vec<RawItem>, AdapterError>;

    /// One full search round-trip for one query.
    async fn search(&self, query: &SiteQuery) -> Result<Vec<RawItem>, AdapterError> {
        let url = self.build_search_url(&query.filters)?;
        tracing::debug!(site = self.name(), %url, "searching");
        let content = self.fetch(&url).await?;
        self.extract_items(&content)
    }
}
