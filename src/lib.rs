// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// Configuration module
///
/// Application settings, defaults and per-site overrides
pub mod config;

/// Crawl module
///
/// Rate-limited, retrying, cancellable multi-site crawl orchestration
pub mod crawl;

/// Domain module
///
/// Core entities, result models and the site adapter contract
pub mod domain;

/// Engine module
///
/// The request pipeline from natural-language text to a search report
pub mod engine;

/// Language understanding module
///
/// Entity extraction, intent classification and profile/goal building
pub mod nlu;

/// Normalization module
///
/// Cross-site dedup, scoring and report assembly
pub mod normalize;

/// Query module
///
/// Expansion of search goals into per-site query filters
pub mod query;

/// Sites module
///
/// Marketplace adapters plus the shared HTTP fetcher
pub mod sites;

/// Utility module
///
/// Telemetry and other shared helpers
pub mod utils;
