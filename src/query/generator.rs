// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Expands search goals into per-site queries.
//!
//! Pure transform, no I/O. One goal becomes one `SiteQuery` per site that
//! can serve the goal's type, with filters spelled in that site's field
//! vocabulary. All prices stay in millions; adapters convert to absolute
//! currency only when a URL wants it.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::domain::models::{GoalType, SearchGoal, SiteQuery, UserProfile};

/// Fixed site iteration order; keeps query emission deterministic.
pub const SITE_ORDER: &[&str] = &["divar", "sheypoor", "bama", "digikala", "torob"];

/// Price floor heuristic: search from 80% of the cap up, unless the goal
/// carries its own floor.
const PRICE_FLOOR_RATIO: f64 = 0.8;

/// Static capability table: which goal types each site can serve.
fn site_supports(site: &str, goal_type: GoalType) -> bool {
    use GoalType::*;
    match site {
        "divar" | "sheypoor" => {
            matches!(goal_type, ResidentialRent | ResidentialPurchase | VehiclePurchaseOrLease)
        }
        "bama" => matches!(goal_type, VehiclePurchaseOrLease),
        "digikala" | "torob" => matches!(goal_type, Electronics | Other),
        _ => false,
    }
}

/// Per-site field names for category and location filters.
struct SiteFieldMap {
    category_key: &'static str,
    location_key: Option<&'static str>,
}

fn field_map(site: &str) -> SiteFieldMap {
    match site {
        "divar" | "sheypoor" => {
            SiteFieldMap { category_key: "category", location_key: Some("location") }
        }
        "bama" => SiteFieldMap { category_key: "search_type", location_key: None },
        _ => SiteFieldMap { category_key: "category", location_key: None },
    }
}

pub struct QueryGenerator;

impl QueryGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Emit one query per (goal, capable site) pair, highest priority first.
    pub fn generate(&self, _profile: &UserProfile, goals: &[SearchGoal]) -> Vec<SiteQuery> {
        let mut queries: Vec<SiteQuery> = Vec::new();
        for goal in goals {
            for &site in SITE_ORDER {
                if site_supports(site, goal.goal_type) {
                    queries.push(self.build_site_query(site, goal));
                }
            }
        }
        // Stable: queries of equal priority keep goal mention order.
        queries.sort_by(|a, b| b.priority.cmp(&a.priority));
        queries
    }

    fn build_site_query(&self, site: &str, goal: &SearchGoal) -> SiteQuery {
        let map = field_map(site);
        let mut filters: BTreeMap<String, Value> = BTreeMap::new();

        if let Some(max_price) = goal.max_price {
            filters.insert("price_max".to_string(), json!(max_price));
            let min_price = goal.min_price.unwrap_or(max_price * PRICE_FLOOR_RATIO);
            filters.insert("price_min".to_string(), json!(min_price));
        } else if let Some(min_price) = goal.min_price {
            filters.insert("price_min".to_string(), json!(min_price));
        }

        if let Some(key) = map.location_key {
            if goal.target_location != "Any" {
                filters.insert(key.to_string(), json!(goal.target_location));
            }
        }

        match goal.goal_type {
            GoalType::ResidentialRent => {
                filters.insert(map.category_key.to_string(), json!("apartment-rent"));
                filters.insert("rent_type".to_string(), json!(goal.search_type));
            }
            GoalType::ResidentialPurchase => {
                filters.insert(map.category_key.to_string(), json!("apartment-sell"));
            }
            GoalType::VehiclePurchaseOrLease => {
                let label = if goal.max_monthly_lease_payment.is_some() { "lease" } else { "purchase" };
                filters.insert(map.category_key.to_string(), json!(if site == "bama" {
                    label.to_string()
                } else {
                    "cars".to_string()
                }));
                if let Some(lease) = goal.max_monthly_lease_payment {
                    filters.insert("lease_monthly_max".to_string(), json!(lease));
                }
            }
            GoalType::Electronics => {
                filters.insert(map.category_key.to_string(), json!("electronics"));
            }
            GoalType::Other => {
                filters.insert(map.category_key.to_string(), json!("general"));
            }
        }

        SiteQuery {
            site: site.to_string(),
            goal_id: goal.goal_id,
            search_type: search_type_label(site, goal),
            filters,
            priority: goal.priority.rank(),
        }
    }
}

impl Default for QueryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn search_type_label(site: &str, goal: &SearchGoal) -> String {
    match goal.goal_type {
        GoalType::ResidentialRent => "rent".to_string(),
        GoalType::ResidentialPurchase => "purchase".to_string(),
        GoalType::VehiclePurchaseOrLease => {
            if site == "bama" && goal.max_monthly_lease_payment.is_some() {
                "lease".to_string()
            } else {
                "purchase".to_string()
            }
        }
        GoalType::Electronics | GoalType::Other => "general".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BudgetSource, Priority};

    fn rent_goal(id: u32, location: &str, max_price: Option<f64>) -> SearchGoal {
        SearchGoal {
            goal_id: id,
            goal_type: GoalType::ResidentialRent,
            target_location: location.to_string(),
            budget_source: BudgetSource::Liquidity,
            priority: Priority::High,
            search_type: "deposit_rent".to_string(),
            min_price: None,
            max_price,
            max_monthly_lease_payment: None,
        }
    }

    #[test]
    fn one_query_per_capable_site() {
        let goals = vec![rent_goal(1, "Ekbatan", Some(600.0))];
        let queries = QueryGenerator::new().generate(&UserProfile::default(), &goals);
        let sites: Vec<&str> = queries.iter().map(|q| q.site.as_str()).collect();
        // Only the two housing-capable sites serve a rent goal.
        assert_eq!(sites, vec!["divar", "sheypoor"]);
        assert!(queries.iter().all(|q| q.goal_id == 1));
    }

    #[test]
    fn price_floor_is_80_percent_of_cap() {
        let goals = vec![rent_goal(1, "Ekbatan", Some(600.0))];
        let queries = QueryGenerator::new().generate(&UserProfile::default(), &goals);
        assert_eq!(queries[0].filter_f64("price_max"), Some(600.0));
        assert_eq!(queries[0].filter_f64("price_min"), Some(480.0));
    }

    #[test]
    fn explicit_floor_wins_over_heuristic() {
        let mut goal = rent_goal(1, "Ekbatan", Some(600.0));
        goal.min_price = Some(100.0);
        let queries = QueryGenerator::new().generate(&UserProfile::default(), &[goal]);
        assert_eq!(queries[0].filter_f64("price_min"), Some(100.0));
    }

    #[test]
    fn no_budget_means_no_price_filters() {
        let goals = vec![rent_goal(1, "Ekbatan", None)];
        let queries = QueryGenerator::new().generate(&UserProfile::default(), &goals);
        assert!(queries[0].filter_f64("price_max").is_none());
        assert!(queries[0].filter_f64("price_min").is_none());
    }

    #[test]
    fn vehicle_goal_reaches_bama_with_lease_filter() {
        let goal = SearchGoal {
            goal_id: 1,
            goal_type: GoalType::VehiclePurchaseOrLease,
            target_location: "Any".to_string(),
            budget_source: BudgetSource::Liquidity,
            priority: Priority::High,
            search_type: "lease".to_string(),
            min_price: None,
            max_price: Some(500.0),
            max_monthly_lease_payment: Some(15.0),
        };
        let queries = QueryGenerator::new().generate(&UserProfile::default(), &[goal]);
        let bama = queries.iter().find(|q| q.site == "bama").unwrap();
        assert_eq!(bama.search_type, "lease");
        assert_eq!(bama.filter_f64("lease_monthly_max"), Some(15.0));
        assert_eq!(bama.filter_str("search_type"), Some("lease"));
        // Location-free goal carries no location filter anywhere.
        assert!(queries.iter().all(|q| q.filter_str("location").is_none()));
    }

    #[test]
    fn priority_maps_to_integer_rank() {
        let mut low = rent_goal(2, "Vanak", Some(600.0));
        low.priority = Priority::Low;
        let goals = vec![rent_goal(1, "Ekbatan", Some(600.0)), low];
        let queries = QueryGenerator::new().generate(&UserProfile::default(), &goals);
        assert!(queries.iter().take(2).all(|q| q.priority == 3));
        assert!(queries.iter().skip(2).all(|q| q.priority == 1));
    }

    #[test]
    fn electronics_goal_targets_product_sites() {
        let goal = SearchGoal {
            goal_id: 1,
            goal_type: GoalType::Electronics,
            target_location: "Any".to_string(),
            budget_source: BudgetSource::Liquidity,
            priority: Priority::High,
            search_type: "general".to_string(),
            min_price: None,
            max_price: Some(80.0),
            max_monthly_lease_payment: None,
        };
        let queries = QueryGenerator::new().generate(&UserProfile::default(), &[goal]);
        let sites: Vec<&str> = queries.iter().map(|q| q.site.as_str()).collect();
        assert_eq!(sites, vec!["digikala", "torob"]);
    }
}
