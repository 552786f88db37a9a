// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! End-to-end pipeline tests: natural-language request in, normalized
//! search report out, with the marketplace sites played by wiremock.

use std::time::Duration;

use bazaryab::config::settings::{Settings, SiteSettings};
use bazaryab::crawl::CancelToken;
use bazaryab::domain::models::CrawlErrorKind;
use bazaryab::engine::{AssistantEngine, SearchRequest};
use bazaryab::sites;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIVAR_RESULTS: &str = r#"
<html><body>
  <div class="kt-post-card">
    <a href="/v/apartment/aaa111">
      <h2 class="kt-post-card__title">آپارتمان ۷۵ متری اکباتان فاز یک</h2>
      <div class="kt-post-card__description">۵۸۰ میلیون تومان</div>
      <span class="kt-post-card__bottom-description">اکباتان</span>
      <img src="https://s.divar.ir/aaa.jpg">
    </a>
  </div>
  <div class="kt-post-card">
    <a href="/v/apartment/bbb222">
      <h2 class="kt-post-card__title">آپارتمان ۸۰ متری اکباتان فاز دو</h2>
      <div class="kt-post-card__description">۶۰۰ میلیون تومان</div>
      <span class="kt-post-card__bottom-description">اکباتان</span>
    </a>
  </div>
  <div class="kt-post-card">
    <a href="/v/apartment/ccc333">
      <h2 class="kt-post-card__title">سوییت ۶۰ متری اکباتان</h2>
      <div class="kt-post-card__description">۴۹۰ میلیون تومان</div>
    </a>
  </div>
</body></html>
"#;

fn settings_for(divar: &MockServer, sheypoor: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.crawl.min_delay_ms = 0;
    settings.crawl.max_retries = 0;
    settings.crawl.request_timeout_secs = 1;
    settings.sites.insert(
        "divar".to_string(),
        SiteSettings { base_url: Some(divar.uri()), ..SiteSettings::default() },
    );
    settings.sites.insert(
        "sheypoor".to_string(),
        SiteSettings { base_url: Some(sheypoor.uri()), ..SiteSettings::default() },
    );
    settings
}

fn engine_for(settings: Settings) -> AssistantEngine {
    let adapters = sites::build_adapters(&settings).expect("adapter roster builds");
    AssistantEngine::with_adapters(adapters, settings)
}

#[tokio::test]
async fn search_request_produces_normalized_report_despite_slow_site() {
    let divar = MockServer::start().await;
    let sheypoor = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s/tehran/apartment-rent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DIVAR_RESULTS))
        .mount(&divar)
        .await;
    // Sheypoor answers, but far slower than the request timeout allows.
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html></html>")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&sheypoor)
        .await;

    let engine = engine_for(settings_for(&divar, &sheypoor));
    let request = SearchRequest::from_text(
        "I have 600 million tomans and want to rent an apartment in Tehran, preferably Ekbatan",
    );

    let response = engine.handle(&request, &CancelToken::new()).await;

    assert!(!response.requires_clarification);
    let query = response.query.expect("structured query");
    assert_eq!(query.user_profile.liquidity, 600.0);
    assert_eq!(query.search_goals.len(), 1);
    assert!(query.search_goals[0].target_location.contains("Ekbatan")
        || query.search_goals[0].target_location.contains("اکباتان"));
    assert_eq!(query.search_goals[0].max_price, Some(600.0));

    let report = response.report.expect("search report");
    assert!(report.success);
    assert_eq!(report.total_items, 3);
    assert_eq!(report.sources, vec!["divar"]);
    assert!(report.items.iter().all(|i| i.item_id.starts_with("divar-")));

    // The slow site shows up as a timeout error, not as a failed batch.
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].site, "sheypoor");
    assert_eq!(response.errors[0].kind, CrawlErrorKind::Timeout);
}

#[tokio::test]
async fn repeated_listings_collapse_to_one() {
    let divar = MockServer::start().await;
    let sheypoor = MockServer::start().await;

    let duplicated = format!(
        "<html><body>{card}{card}</body></html>",
        card = r#"
          <div class="kt-post-card">
            <a href="/v/apartment/same999">
              <h2 class="kt-post-card__title">آپارتمان تکراری</h2>
              <div class="kt-post-card__description">۵۰۰ میلیون تومان</div>
            </a>
          </div>"#
    );
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(duplicated))
        .mount(&divar)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&sheypoor)
        .await;

    let engine = engine_for(settings_for(&divar, &sheypoor));
    let response = engine
        .handle(
            &SearchRequest::from_text("I have 500 million and want to rent an apartment in Ekbatan"),
            &CancelToken::new(),
        )
        .await;

    let report = response.report.expect("search report");
    assert_eq!(report.total_items, 1);
    assert_eq!(report.items[0].item_id, "divar-same999");
    assert_eq!(report.metadata.duplicates_removed, 1);
}

#[tokio::test]
async fn cancelled_request_returns_partial_report() {
    let divar = MockServer::start().await;
    let sheypoor = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DIVAR_RESULTS))
        .mount(&divar)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&sheypoor)
        .await;

    let engine = engine_for(settings_for(&divar, &sheypoor));
    let cancel = CancelToken::new();
    cancel.cancel();

    let response = engine
        .handle(
            &SearchRequest::from_text("I have 600 million and want to rent an apartment in Ekbatan"),
            &cancel,
        )
        .await;

    // The pipeline still answers; no site was contacted.
    let report = response.report.expect("search report");
    assert_eq!(report.total_items, 0);
    assert!(!response.errors.is_empty());
    assert!(response.errors.iter().all(|e| e.kind == CrawlErrorKind::Cancelled));
    assert!(divar.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn vague_request_never_touches_the_network() {
    let divar = MockServer::start().await;
    let sheypoor = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DIVAR_RESULTS))
        .mount(&divar)
        .await;

    let engine = engine_for(settings_for(&divar, &sheypoor));
    let response = engine
        .handle(&SearchRequest::from_text("hello there"), &CancelToken::new())
        .await;

    assert!(response.requires_clarification);
    assert!(!response.clarification_questions.is_empty());
    assert!(response.report.is_none());
    assert!(divar.received_requests().await.unwrap().is_empty());
}
