// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A listing as one site adapter extracted it. Site-specific shape; only
/// title, url and some price representation are expected to be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItem {
    /// Site-local identifier when the page exposes one.
    pub item_id: Option<String>,
    pub title: String,
    pub url: String,
    /// Price in millions, when the adapter could parse it.
    pub price: Option<f64>,
    pub price_text: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub images: Vec<String>,
    pub thumbnail: Option<String>,
    pub properties: BTreeMap<String, Value>,
    /// Adapter's trust in its own extraction; normalizer default applies
    /// when absent.
    pub confidence: Option<f64>,
}

/// A raw item together with the crawl context the orchestrator attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedItem {
    pub source_site: String,
    pub goal_id: u32,
    pub crawled_at: DateTime<Utc>,
    pub raw: RawItem,
}

/// Error taxonomy for crawl-level failures. Extraction ambiguity never
/// reaches this level; it degrades scores instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlErrorKind {
    Transient,
    Fatal,
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlErrorRecord {
    pub site: String,
    pub goal_id: u32,
    pub kind: CrawlErrorKind,
    pub message: String,
}

/// Everything one site task reported back: its own slot in the batch
/// accumulator, owned exclusively until completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteReport {
    pub items: Vec<FetchedItem>,
    pub errors: Vec<CrawlErrorRecord>,
    pub elapsed_ms: u64,
}

/// Fan-in of all site reports for one batch.
///
/// `success` stays true as long as the batch itself completed; individual
/// site failures live in the per-site error lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlBatchResult {
    pub success: bool,
    pub per_site: BTreeMap<String, SiteReport>,
    pub total_items: usize,
    pub elapsed_ms: u64,
}

impl CrawlBatchResult {
    pub fn all_errors(&self) -> Vec<CrawlErrorRecord> {
        self.per_site.values().flat_map(|r| r.errors.iter().cloned()).collect()
    }
}

/// The cross-site, deduplicated, scored form of one listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedItem {
    /// Site-prefixed, stable per source id/URL so repeated crawls of the
    /// same listing collapse to the same identity.
    pub item_id: String,
    pub source_site: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub properties: BTreeMap<String, Value>,
    pub crawled_at: DateTime<Utc>,
    pub goal_id: u32,
    pub confidence_score: f64,
    pub completeness_score: f64,
}

/// Informational quality band; does not affect ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBucket {
    High,
    Medium,
    Low,
}

impl NormalizedItem {
    pub fn quality_bucket(&self) -> QualityBucket {
        if self.completeness_score >= 0.8 {
            QualityBucket::High
        } else if self.completeness_score >= 0.4 {
            QualityBucket::Medium
        } else {
            QualityBucket::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_bucket_boundaries() {
        let mut item = NormalizedItem {
            item_id: "divar-1".into(),
            source_site: "divar".into(),
            title: "t".into(),
            description: None,
            url: "https://example.com".into(),
            price: None,
            price_text: None,
            location: None,
            city: None,
            district: None,
            images: vec![],
            thumbnail: None,
            properties: BTreeMap::new(),
            crawled_at: Utc::now(),
            goal_id: 1,
            confidence_score: 1.0,
            completeness_score: 0.8,
        };
        assert_eq!(item.quality_bucket(), QualityBucket::High);
        item.completeness_score = 0.4;
        assert_eq!(item.quality_bucket(), QualityBucket::Medium);
        item.completeness_score = 0.39;
        assert_eq!(item.quality_bucket(), QualityBucket::Low);
    }
}
