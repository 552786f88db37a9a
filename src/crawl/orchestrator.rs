// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Parallel multi-site crawl orchestration.
//!
//! Queries are grouped by site. Each site runs as one task that works
//! through its queries sequentially under that site's rate limiter, and
//! sites run concurrently up to `crawl.max_concurrent_sites`. Every site
//! task owns its own report slot; fan-in happens once at the end, so site
//! tasks never contend over shared result state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::{watch, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::crawl::rate_limit::SiteRateLimiter;
use crate::crawl::retry::RetryPolicy;
use crate::domain::adapter::{AdapterError, SiteAdapter};
use crate::domain::models::{
    CrawlBatchResult, CrawlErrorKind, CrawlErrorRecord, FetchedItem, RawItem, SiteQuery,
    SiteReport,
};

/// Cooperative cancellation handle. Cancelling stops new work; results
/// already collected survive in the batch report.
#[derive(Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    fn watch(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CrawlOrchestrator {
    adapters: HashMap<String, Arc<dyn SiteAdapter>>,
    limiters: HashMap<String, SiteRateLimiter>,
    settings: Settings,
    /// Cross-batch failure counts per site, for health reporting.
    failures: Arc<DashMap<String, u32>>,
}

impl CrawlOrchestrator {
    pub fn new(adapters: Vec<Arc<dyn SiteAdapter>>, settings: Settings) -> Self {
        let mut adapter_map = HashMap::new();
        let mut limiters = HashMap::new();
        for adapter in adapters {
            let name = adapter.name().to_string();
            limiters.insert(name.clone(), SiteRateLimiter::new(settings.min_delay(&name)));
            adapter_map.insert(name, adapter);
        }
        Self {
            adapters: adapter_map,
            limiters,
            settings,
            failures: Arc::new(DashMap::new()),
        }
    }

    /// Total errors recorded for a site across all batches so far.
    pub fn failure_count(&self, site: &str) -> u32 {
        self.failures.get(site).map(|v| *v).unwrap_or(0)
    }

    /// Runs one batch of queries and fans the per-site reports into a
    /// single result. Always returns; site failures become error records,
    /// never panics or early exits.
    ///
    /// Site groups run concurrently up to `crawl.max_concurrent_sites`;
    /// setting it to 1 runs the groups strictly one after another, which
    /// is the easiest way to read a batch's logs in order.
    pub async fn crawl_batch(
        &self,
        queries: &[SiteQuery],
        cancel: &CancelToken,
    ) -> CrawlBatchResult {
        let started = Instant::now();

        let mut by_site: BTreeMap<String, Vec<SiteQuery>> = BTreeMap::new();
        for query in queries {
            by_site.entry(query.site.clone()).or_default().push(query.clone());
        }

        info!(
            sites = by_site.len(),
            queries = queries.len(),
            "starting crawl batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.crawl.max_concurrent_sites.max(1)));
        let site_tasks = by_site.into_iter().map(|(site, site_queries)| {
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            async move {
                let _permit = semaphore.acquire().await.ok();
                let report = self.crawl_site(&site, &site_queries, &cancel).await;
                (site, report)
            }
        });

        let per_site: BTreeMap<String, SiteReport> = join_all(site_tasks).await.into_iter().collect();

        let total_items = per_site.values().map(|r| r.items.len()).sum();
        let result = CrawlBatchResult {
            success: true,
            per_site,
            total_items,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            total_items,
            errors = result.all_errors().len(),
            elapsed_ms = result.elapsed_ms,
            "crawl batch finished"
        );
        result
    }

    async fn crawl_site(
        &self,
        site: &str,
        queries: &[SiteQuery],
        cancel: &CancelToken,
    ) -> SiteReport {
        let started = Instant::now();
        let mut report = SiteReport::default();

        let Some(adapter) = self.adapters.get(site) else {
            self.record_failure(site);
            report.errors.push(CrawlErrorRecord {
                site: site.to_string(),
                goal_id: queries.first().map(|q| q.goal_id).unwrap_or(0),
                kind: CrawlErrorKind::Fatal,
                message: format!("no adapter registered for site '{site}'"),
            });
            report.elapsed_ms = started.elapsed().as_millis() as u64;
            return report;
        };

        let limiter = self.limiters.get(site);
        let policy = RetryPolicy::with_max_retries(self.settings.max_retries(site));
        let request_timeout = self.settings.request_timeout(site);

        for query in queries {
            if cancel.is_cancelled() {
                report.errors.push(CrawlErrorRecord {
                    site: site.to_string(),
                    goal_id: query.goal_id,
                    kind: CrawlErrorKind::Cancelled,
                    message: "crawl cancelled before query ran".to_string(),
                });
                break;
            }

            if let Some(limiter) = limiter {
                limiter.acquire().await;
            }

            match self
                .run_with_retry(adapter.as_ref(), query, &policy, request_timeout, cancel)
                .await
            {
                Ok(raw_items) => {
                    debug!(site, goal_id = query.goal_id, count = raw_items.len(), "query succeeded");
                    let crawled_at = Utc::now();
                    report.items.extend(raw_items.into_iter().map(|raw| FetchedItem {
                        source_site: site.to_string(),
                        goal_id: query.goal_id,
                        crawled_at,
                        raw,
                    }));
                }
                Err(err) => {
                    self.record_failure(site);
                    let kind = error_kind(&err);
                    warn!(site, goal_id = query.goal_id, error = %err, ?kind, "query failed");
                    report.errors.push(CrawlErrorRecord {
                        site: site.to_string(),
                        goal_id: query.goal_id,
                        kind,
                        message: err.to_string(),
                    });
                    // A fatal response (blocked, bad credentials, 4xx) will
                    // not get better for the next query on this site, and a
                    // cancelled batch runs nothing further.
                    if kind == CrawlErrorKind::Fatal || kind == CrawlErrorKind::Cancelled {
                        break;
                    }
                }
            }
        }

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        report
    }

    async fn run_with_retry(
        &self,
        adapter: &dyn SiteAdapter,
        query: &SiteQuery,
        policy: &RetryPolicy,
        request_timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Vec<RawItem>, AdapterError> {
        let mut attempt = 0u32;
        let mut cancelled = cancel.watch();
        loop {
            // The in-flight call races the cancel signal; cancelling does
            // not wait for the adapter or the timeout to run out.
            let result = tokio::select! {
                outcome = timeout(request_timeout, adapter.search(query)) => match outcome {
                    Ok(inner) => inner,
                    Err(_) => Err(AdapterError::Timeout),
                },
                _ = cancelled.wait_for(|flag| *flag) => Err(AdapterError::Cancelled),
            };

            match result {
                Ok(items) => return Ok(items),
                Err(err)
                    if err.is_retryable()
                        && policy.should_retry(attempt)
                        && !cancel.is_cancelled() =>
                {
                    attempt += 1;
                    let backoff = policy.calculate_backoff(attempt);
                    debug!(
                        site = adapter.name(),
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "retrying after transient failure"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = cancelled.wait_for(|flag| *flag) => return Err(err),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn record_failure(&self, site: &str) {
        *self.failures.entry(site.to_string()).or_insert(0) += 1;
    }
}

fn error_kind(err: &AdapterError) -> CrawlErrorKind {
    match err {
        AdapterError::Timeout => CrawlErrorKind::Timeout,
        AdapterError::Cancelled => CrawlErrorKind::Cancelled,
        e if e.is_fatal() => CrawlErrorKind::Fatal,
        _ => CrawlErrorKind::Transient,
    }
}
