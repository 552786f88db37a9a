// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Adapter for digikala.com product search.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::{json, Value};

use crate::domain::adapter::{AdapterError, SiteAdapter};
use crate::domain::models::RawItem;
use crate::sites::fetcher::HttpFetcher;
use crate::sites::parse;

const DEFAULT_BASE_URL: &str = "https://www.digikala.com";
const EXTRACTION_CONFIDENCE: f64 = 0.9;

static CARD: Lazy<Selector> = Lazy::new(|| parse::selector("article.c-product-box"));
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| parse::selector("h3.c-product-box__title a[href]"));
static PRICE: Lazy<Selector> = Lazy::new(|| parse::selector("div.c-product-box__price"));
static IMAGE: Lazy<Selector> = Lazy::new(|| parse::selector("img[src]"));

pub struct DigikalaAdapter {
    fetcher: Arc<HttpFetcher>,
    base_url: String,
}

impl DigikalaAdapter {
    pub fn new(fetcher: Arc<HttpFetcher>, base_url: Option<&str>) -> Self {
        Self {
            fetcher,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SiteAdapter for DigikalaAdapter {
    fn name(&self) -> &'static str {
        "digikala"
    }

    fn build_search_url(&self, filters: &BTreeMap<String, Value>) -> Result<String, AdapterError> {
        let mut url = format!("{}/search/", self.base_url);
        if let Some(product) = filters.get("product_name").and_then(|v| v.as_str()) {
            url.push_str(&product.replace(' ', "-"));
        }

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(min) = filters.get("price_min").and_then(|v| v.as_f64()) {
            params.push(("price-min", format!("{}", (min * 1_000_000.0) as i64)));
        }
        if let Some(max) = filters.get("price_max").and_then(|v| v.as_f64()) {
            params.push(("price-max", format!("{}", (max * 1_000_000.0) as i64)));
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
            let Some(link) = card.select(&TITLE_LINK).next() else {
                continue;
            };
            let title = parse::clean_text(&link.text().collect::<String>());
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if title.is_empty() {
                continue;
            }

            let price_text = parse::text_of(card, &PRICE);
            let thumbnail = parse::attr_of(card, &IMAGE, "src").map(|s| s.to_string());

            let mut properties = BTreeMap::new();
            properties.insert("product_type".to_string(), json!("electronics"));

            items.push(RawItem {
                item_id: parse::id_from_href(href),
                title,
                url: format!("{}{href}", self.base_url),
                price: price_text.as_deref().and_then(parse::parse_price_to_millions),
                price_text,
                description: None,
                location: None,
                city: None,
                district: None,
                images: thumbnail.iter().cloned().collect(),
                thumbnail,
                properties,
                confidence: Some(EXTRACTION_CONFIDENCE),
            });
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> DigikalaAdapter {
        DigikalaAdapter::new(Arc::new(HttpFetcher::new().unwrap()), None)
    }

    #[test]
    fn search_url_slugs_product_name() {
        let mut filters = BTreeMap::new();
        filters.insert("product_name".to_string(), json!("laptop asus"));
        filters.insert("price_max".to_string(), json!(80.0));

        let url = adapter().build_search_url(&filters).unwrap();
        assert!(url.starts_with("https://www.digikala.com/search/laptop-asus?"));
        assert!(url.contains("price-max=80000000"));
    }

    #[test]
    fn extracts_product_cards() {
        let html = r#"
            <article class="c-product-box">
              <h3 class="c-product-box__title"><a href="/product/dkp-112233">لپ تاپ ایسوس</a></h3>
              <div class="c-product-box__price">۴۵ میلیون تومان</div>
              <img src="https://dkstatics.com/laptop.jpg">
            </article>
        "#;
        let items = adapter().extract_items(html).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id.as_deref(), Some("dkp-112233"));
        assert_eq!(items[0].price, Some(45.0));
        assert_eq!(items[0].properties["product_type"], json!("electronics"));
    }
}
