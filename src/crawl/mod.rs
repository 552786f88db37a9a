// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod orchestrator;
pub mod rate_limit;
pub mod retry;

pub use orchestrator::{CancelToken, CrawlOrchestrator};
pub use rate_limit::SiteRateLimiter;
pub use retry::RetryPolicy;
