// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Adapter for divar.ir, the largest general classifieds site. Serves
//! apartment rent, apartment purchase and vehicle searches.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::domain::adapter::{AdapterError, SiteAdapter};
use crate::domain::models::RawItem;
use crate::sites::fetcher::HttpFetcher;
use crate::sites::parse;

const DEFAULT_BASE_URL: &str = "https://divar.ir";
const EXTRACTION_CONFIDENCE: f64 = 0.9;

static CARD: Lazy<Selector> = Lazy::new(|| parse::selector("div.kt-post-card"));
static TITLE: Lazy<Selector> = Lazy::new(|| parse::selector("h2.kt-post-card__title"));
static LINK: Lazy<Selector> = Lazy::new(|| parse::selector("a[href]"));
static PRICE: Lazy<Selector> = Lazy::new(|| parse::selector("div.kt-post-card__description"));
static LOCATION: Lazy<Selector> =
    Lazy::new(|| parse::selector("span.kt-post-card__bottom-description"));
static IMAGE: Lazy<Selector> = Lazy::new(|| parse::selector("img[src]"));

pub struct DivarAdapter {
    fetcher: Arc<HttpFetcher>,
    base_url: String,
}

impl DivarAdapter {
    pub fn new(fetcher: Arc<HttpFetcher>, base_url: Option<&str>) -> Self {
        Self {
            fetcher,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SiteAdapter for DivarAdapter {
    fn name(&self) -> &'static str {
        "divar"
    }

    fn build_search_url(&self, filters: &BTreeMap<String, Value>) -> Result<String, AdapterError> {
        let category = filters
            .get("category")
            .and_then(|v| v.as_str())
            .unwrap_or("apartment-rent");

        let mut url = format!("{}/s/tehran/{category}", self.base_url);

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(min) = filters.get("price_min").and_then(|v| v.as_f64()) {
            params.push(("price-min", format!("{}", (min * 1_000_000.0) as i64)));
        }
        if let Some(max) = filters.get("price_max").and_then(|v| v.as_f64()) {
            params.push(("price-max", format!("{}", (max * 1_000_000.0) as i64)));
        }
        if filters.get("rent_type").and_then(|v| v.as_str()) == Some("full_deposit") {
            params.push(("rent-type", "full_deposit".to_string()));
        }

        if !params.is_empty() {
            let query = serde_urlencoded::to_string(&params)
                .map_err(|e| AdapterError::Fatal(format!("query encoding failed: {e}")))?;
            url.push('?');
            url.push_str(&query);
        }
        Ok(url)
    }

    async fn fetch(&self, url: &str) -> Result<String, AdapterError> {
        self.fetcher.fetch(url).await
    }

    fn extract_items(&self, content: &str) -> Result<Vec<RawItem>, AdapterError> {
        let document = Html::parse_document(content);
        let mut items = Vec::new();

        for card in document.select(&CARD) {
            let title = match parse::text_of(card, &TITLE) {
                Some(t) if !t.is_empty() => t,
                _ => continue,
            };
            let Some(href) = parse::attr_of(card, &LINK, "href") else {
                continue;
            };

            let price_text = parse::text_of(card, &PRICE);
            let location = parse::text_of(card, &LOCATION);
            let thumbnail = parse::attr_of(card, &IMAGE, "src").map(|s| s.to_string());

            items.push(RawItem {
                item_id: parse::id_from_href(href),
                title,
                url: format!("{}{href}", self.base_url),
                price: price_text.as_deref().and_then(parse::parse_price_to_millions),
                price_text,
                description: None,
                location: location.clone(),
                city: Some("تهران".to_string()),
                district: location,
                images: thumbnail.iter().cloned().collect(),
                thumbnail,
                properties: BTreeMap::new(),
                confidence: Some(EXTRACTION_CONFIDENCE),
            });
        }

        Ok(items)
    }
}
