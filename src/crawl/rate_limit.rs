// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Paces requests to one site so consecutive calls are at least
/// `min_delay` apart. A zero delay disables pacing entirely.
pub struct SiteRateLimiter {
    limiter: Option<DefaultDirectRateLimiter>,
}

impl SiteRateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        let limiter = Quota::with_period(min_delay).map(RateLimiter::direct);
        Self { limiter }
    }

    /// Waits until the next request may go out.
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}
