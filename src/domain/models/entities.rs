// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::domain::models::profile::GoalType;

/// A monetary amount found in the request text.
///
/// Values are always normalized to millions of tomans, regardless of the
/// scale word the rule matched. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyEntity {
    /// Amount in millions of tomans.
    pub value_millions: f64,
    /// The exact text slice the rule matched.
    pub raw_text: String,
    /// Per-rule confidence, reduced when the number carried no scale word.
    pub confidence: f64,
    /// Byte offset of the match start in the original text.
    pub span_start: usize,
    /// Byte offset one past the match end.
    pub span_end: usize,
}

/// Goal-type markers derived from the request vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTypeInfo {
    pub goal_type: Option<GoalType>,
    /// Site-facing label, e.g. "full_deposit" for رهن کامل.
    pub search_type: String,
    pub is_rent: bool,
    pub is_purchase: bool,
    pub is_lease: bool,
}

/// Everything the extractor pulled out of one request.
///
/// Absence of an entity type is an empty/zero value, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntitySet {
    /// All money mentions in match order.
    pub money: Vec<MoneyEntity>,
    /// Gazetteer hits in first-seen order.
    pub locations: Vec<LocationEntity>,
    /// Amount claimed by the loan-keyword association, millions.
    pub loan_amount: f64,
    /// Months until the loan is available; 0 means immediately.
    pub loan_availability_months: u32,
    /// Amount claimed by the payment-keyword association, millions.
    pub monthly_payment: f64,
    /// Highest-valued money entity not claimed by loan/payment association.
    pub primary_liquidity: f64,
    pub search_type: SearchTypeInfo,
    /// Fallback phrase like "if I can't ... which area" was present.
    pub wants_alternative_area: bool,
}

/// A gazetteer match. `name` is the surface form found in the text,
/// `city` the canonical city it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntity {
    pub name: String,
    pub city: String,
    pub is_city: bool,
}
