// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Cross-site result normalization.
//!
//! Takes the raw fan-in of a crawl batch and produces one report:
//! stable item identities, duplicates collapsed, text cleaned, every item
//! scored for confidence and completeness, sorted best first.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::models::{CrawlBatchResult, CrawlErrorRecord, FetchedItem, NormalizedItem};

/// Confidence assumed when an adapter did not score its own extraction.
const DEFAULT_CONFIDENCE: f64 = 1.0;

/// Two titles from different sites at or above this similarity are counted
/// as likely cross-postings. Informational only; cross-site matches are
/// never removed, identity is strictly per-site.
const CROSS_SITE_TITLE_SIMILARITY: f64 = 0.92;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Final search report handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub success: bool,
    pub total_items: usize,
    pub items: Vec<NormalizedItem>,
    /// Distinct source sites that contributed at least one item.
    pub sources: Vec<String>,
    pub timestamp: String,
    pub errors: Vec<CrawlErrorRecord>,
    pub metadata: ReportMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub normalization_applied: bool,
    pub duplicates_removed: usize,
    /// Pairs of items on different sites whose titles look like the same
    /// underlying listing.
    pub cross_site_title_matches: usize,
}

pub struct DataNormalizer;

impl DataNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalizes one crawl batch. Idempotent: feeding the resulting items
    /// through again changes nothing, because identities are stable and
    /// dedup keeps a single winner per identity.
    pub fn normalize(&self, batch: &CrawlBatchResult) -> SearchReport {
        let fetched: Vec<&FetchedItem> =
            batch.per_site.values().flat_map(|r| r.items.iter()).collect();
        let input_count = fetched.len();

        // Winner per (site, item_id): higher completeness, then more recent.
        // Each identity keeps the arrival index of its first sighting so
        // the sort below can break ties by emission order.
        let mut winners: HashMap<(String, String), (usize, NormalizedItem)> = HashMap::new();
        for (arrival, item) in fetched.into_iter().enumerate() {
            let normalized = normalize_item(item);
            let key = (normalized.source_site.clone(), normalized.item_id.clone());
            match winners.get_mut(&key) {
                Some((_, existing))
                    if existing.completeness_score > normalized.completeness_score
                        || (existing.completeness_score == normalized.completeness_score
                            && existing.crawled_at >= normalized.crawled_at) => {}
                Some(slot) => slot.1 = normalized,
                None => {
                    winners.insert(key, (arrival, normalized));
                }
            }
        }

        let mut ordered: Vec<(usize, NormalizedItem)> = winners.into_values().collect();
        ordered.sort_by_key(|(arrival, _)| *arrival);
        let mut items: Vec<NormalizedItem> = ordered.into_iter().map(|(_, i)| i).collect();
        // Stable sort: equal scores keep arrival order.
        items.sort_by(|a, b| {
            b.confidence_score
                .total_cmp(&a.confidence_score)
                .then(b.completeness_score.total_cmp(&a.completeness_score))
        });

        let duplicates_removed = input_count - items.len();
        let cross_site_title_matches = count_cross_site_matches(&items);
        let sources: BTreeSet<String> = items.iter().map(|i| i.source_site.clone()).collect();

        debug!(
            input_count,
            kept = items.len(),
            duplicates_removed,
            "normalized crawl batch"
        );

        SearchReport {
            success: batch.success,
            total_items: items.len(),
            items,
            sources: sources.into_iter().collect(),
            timestamp: Utc::now().to_rfc3339(),
            errors: batch.all_errors(),
            metadata: ReportMetadata {
                normalization_applied: true,
                duplicates_removed,
                cross_site_title_matches,
            },
        }
    }

    /// Writes a report as pretty-printed JSON.
    pub fn save_report(&self, report: &SearchReport, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), items = report.total_items, "saved search report");
        Ok(())
    }
}

impl Default for DataNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_item(item: &FetchedItem) -> NormalizedItem {
    let raw = &item.raw;
    let item_id = match raw.item_id.as_deref().filter(|s| !s.is_empty()) {
        Some(id) => format!("{}-{id}", item.source_site),
        None => format!("{}-{}", item.source_site, url_fingerprint(&raw.url)),
    };

    NormalizedItem {
        item_id,
        source_site: item.source_site.clone(),
        title: collapse_whitespace(&raw.title),
        description: raw.description.as_deref().map(collapse_whitespace),
        url: raw.url.clone(),
        price: raw.price,
        price_text: raw.price_text.clone(),
        location: raw.location.as_deref().map(collapse_whitespace),
        city: raw.city.clone(),
        district: raw.district.clone(),
        images: raw.images.clone(),
        thumbnail: raw.thumbnail.clone(),
        properties: raw.properties.clone(),
        crawled_at: item.crawled_at,
        goal_id: item.goal_id,
        confidence_score: raw.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        completeness_score: completeness(raw),
    }
}

/// Field-weighted completeness on a 0-10 scale, normalized to 0-1. The
/// weights sum to 8, so 0.8 is the best an item can score; the headroom is
/// reserved for fields no site currently fills.
fn completeness(raw: &crate::domain::models::RawItem) -> f64 {
    let mut score = 0.0;
    if !raw.title.is_empty() {
        score += 1.0;
    }
    if !raw.url.is_empty() {
        score += 1.0;
    }
    if raw.price.is_some() || raw.price_text.is_some() {
        score += 1.5;
    }
    if raw.location.is_some() {
        score += 1.0;
    }
    if !raw.images.is_empty() {
        score += 1.0;
    }
    if raw.description.is_some() {
        score += 0.5;
    }
    if raw.city.is_some() {
        score += 0.5;
    }
    if raw.district.is_some() {
        score += 0.5;
    }
    if !raw.properties.is_empty() {
        score += 1.0;
    }
    (score / 10.0_f64).min(1.0)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn url_fingerprint(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(digest)[..12].to_string()
}

fn count_cross_site_matches(items: &[NormalizedItem]) -> usize {
    let mut matches = 0;
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            if a.source_site != b.source_site
                && strsim::jaro_winkler(&a.title, &b.title) >= CROSS_SITE_TITLE_SIMILARITY
            {
                matches += 1;
            }
        }
    }
    matches
}
