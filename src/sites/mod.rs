// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Site adapters for the supported marketplaces, plus the shared HTTP
//! fetcher and HTML parsing helpers they build on.

pub mod bama;
pub mod digikala;
pub mod divar;
pub mod fetcher;
pub mod parse;
pub mod sheypoor;
pub mod torob;

use std::sync::Arc;

use crate::config::Settings;
use crate::domain::adapter::{AdapterError, SiteAdapter};

pub use fetcher::HttpFetcher;

/// Builds the full adapter roster, honoring per-site base URL overrides.
pub fn build_adapters(settings: &Settings) -> Result<Vec<Arc<dyn SiteAdapter>>, AdapterError> {
    let fetcher = Arc::new(HttpFetcher::new()?);
    Ok(vec![
        Arc::new(divar::DivarAdapter::new(Arc::clone(&fetcher), settings.base_url("divar"))),
        Arc::new(sheypoor::SheypoorAdapter::new(
            Arc::clone(&fetcher),
            settings.base_url("sheypoor"),
        )),
        Arc::new(bama::BamaAdapter::new(Arc::clone(&fetcher), settings.base_url("bama"))),
        Arc::new(digikala::DigikalaAdapter::new(
            Arc::clone(&fetcher),
            settings.base_url("digikala"),
        )),
        Arc::new(torob::TorobAdapter::new(Arc::clone(&fetcher), settings.base_url("torob"))),
    ])
}
