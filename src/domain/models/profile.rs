// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of search goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    ResidentialRent,
    ResidentialPurchase,
    VehiclePurchaseOrLease,
    Electronics,
    Other,
}

impl GoalType {
    pub fn is_residential(&self) -> bool {
        matches!(self, GoalType::ResidentialRent | GoalType::ResidentialPurchase)
    }
}

/// Where the money for a goal comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetSource {
    #[serde(rename = "liquidity")]
    Liquidity,
    #[serde(rename = "loan")]
    Loan,
    #[serde(rename = "liquidity+loan")]
    LiquidityPlusLoan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Integer rank carried on site queries: high=3, medium=2, low=1.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

/// The user's financial profile for one request. All amounts in millions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub liquidity: f64,
    pub loan_amount: f64,
    pub loan_availability_months: u32,
    pub max_monthly_payment: f64,
    pub existing_obligations: f64,
}

impl UserProfile {
    pub fn total_budget(&self) -> f64 {
        self.liquidity + self.loan_amount
    }

    /// Monthly headroom after obligations, clamped so it is never
    /// reported negative.
    pub fn effective_monthly_budget(&self) -> f64 {
        (self.max_monthly_payment - self.existing_obligations).max(0.0)
    }
}

/// One discrete user objective with its own budget and location constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchGoal {
    /// Unique within a request, contiguous from 1 in mention order.
    pub goal_id: u32,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    /// Target location, or "Any" when the goal is not location-bound.
    pub target_location: String,
    pub budget_source: BudgetSource,
    pub priority: Priority,
    /// Site-facing search label (e.g. "rent", "full_deposit").
    pub search_type: String,
    pub min_price: Option<f64>,
    /// Price cap in millions; defaults to the profile's total budget.
    pub max_price: Option<f64>,
    pub max_monthly_lease_payment: Option<f64>,
}

/// The structured outcome of understanding one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub user_profile: UserProfile,
    pub search_goals: Vec<SearchGoal>,
    pub is_multi_goal: bool,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_budget_is_liquidity_plus_loan() {
        let profile = UserProfile {
            liquidity: 600.0,
            loan_amount: 200.0,
            ..Default::default()
        };
        assert_eq!(profile.total_budget(), 800.0);
    }

    #[test]
    fn effective_monthly_budget_never_negative() {
        let profile = UserProfile {
            max_monthly_payment: 10.0,
            existing_obligations: 15.0,
            ..Default::default()
        };
        assert_eq!(profile.effective_monthly_budget(), 0.0);
    }

    #[test]
    fn goal_type_serializes_snake_case() {
        let json = serde_json::to_string(&GoalType::ResidentialRent).unwrap();
        assert_eq!(json, "\"residential_rent\"");
        let json = serde_json::to_string(&GoalType::VehiclePurchaseOrLease).unwrap();
        assert_eq!(json, "\"vehicle_purchase_or_lease\"");
    }

    #[test]
    fn budget_source_combined_rename() {
        let json = serde_json::to_string(&BudgetSource::LiquidityPlusLoan).unwrap();
        assert_eq!(json, "\"liquidity+loan\"");
    }

    #[test]
    fn priority_ranks() {
        assert_eq!(Priority::High.rank(), 3);
        assert_eq!(Priority::Medium.rank(), 2);
        assert_eq!(Priority::Low.rank(), 1);
    }
}
