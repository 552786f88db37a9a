// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One goal expanded for one target marketplace, carrying that site's
/// filter vocabulary. Pure data; the orchestrator groups these by site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteQuery {
    pub site: String,
    pub goal_id: u32,
    /// Site-facing search label ("rent", "purchase", "lease", "general").
    pub search_type: String,
    /// Scalar filters keyed by the site's own field names. BTreeMap keeps
    /// serialization order deterministic across runs.
    pub filters: BTreeMap<String, Value>,
    /// high=3, medium=2, low=1.
    pub priority: u8,
}

impl SiteQuery {
    pub fn filter_f64(&self, key: &str) -> Option<f64> {
        self.filters.get(key).and_then(Value::as_f64)
    }

    pub fn filter_str(&self, key: &str) -> Option<&str> {
        self.filters.get(key).and_then(Value::as_str)
    }
}
