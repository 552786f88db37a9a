// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Turns an extracted entity set into a user profile and an ordered list
//! of search goals. Deterministic: identical entities always produce
//! identical goal ids and ordering.

use crate::domain::models::{
    BudgetSource, EntitySet, GoalType, LocationEntity, Priority, SearchGoal, UserProfile,
};

pub struct ProfileGoalBuilder;

impl ProfileGoalBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, entities: &EntitySet) -> (UserProfile, Vec<SearchGoal>) {
        let profile = UserProfile {
            liquidity: entities.primary_liquidity,
            loan_amount: entities.loan_amount,
            loan_availability_months: entities.loan_availability_months,
            max_monthly_payment: entities.monthly_payment,
            existing_obligations: 0.0,
        };

        let goals = self.build_goals(entities, &profile);
        (profile, goals)
    }

    fn build_goals(&self, entities: &EntitySet, profile: &UserProfile) -> Vec<SearchGoal> {
        let goal_type = entities.search_type.goal_type.unwrap_or(GoalType::Other);
        let budget_source = budget_source(profile);
        let max_price = (profile.total_budget() > 0.0).then(|| profile.total_budget());
        let search_type = entities.search_type.search_type.clone();

        let mut goals = Vec::new();
        let mut next_id = 1u32;
        let mut push = |goals: &mut Vec<SearchGoal>, target: String, priority, lease: Option<f64>| {
            goals.push(SearchGoal {
                goal_id: next_id,
                goal_type,
                target_location: target,
                budget_source,
                priority,
                search_type: search_type.clone(),
                min_price: None,
                max_price,
                max_monthly_lease_payment: lease,
            });
            next_id += 1;
        };

        match goal_type {
            GoalType::ResidentialRent | GoalType::ResidentialPurchase => {
                let targets = residential_targets(&entities.locations);
                if targets.is_empty() {
                    push(&mut goals, "Any".to_string(), Priority::High, None);
                } else {
                    for (idx, name) in targets.iter().enumerate() {
                        let priority = if idx == 0 { Priority::High } else { Priority::Medium };
                        push(&mut goals, name.clone(), priority, None);
                    }
                }
                // A "if I can't ... which area" fallback adds one generic
                // alternative-area goal at medium priority.
                if entities.wants_alternative_area {
                    if let Some(city) = entities.locations.first().map(|l| l.city.clone()) {
                        push(
                            &mut goals,
                            format!("suitable alternative area in {city}"),
                            Priority::Medium,
                            None,
                        );
                    }
                }
            }
            GoalType::VehiclePurchaseOrLease => {
                let lease = (entities.monthly_payment > 0.0).then_some(entities.monthly_payment);
                push(&mut goals, "Any".to_string(), Priority::High, lease);
            }
            GoalType::Electronics | GoalType::Other => {
                let target = entities
                    .locations
                    .first()
                    .map(|l| l.name.clone())
                    .unwrap_or_else(|| "Any".to_string());
                push(&mut goals, target, Priority::High, None);
            }
        }

        goals
    }
}

impl Default for ProfileGoalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn budget_source(profile: &UserProfile) -> BudgetSource {
    if profile.loan_amount > 0.0 && profile.liquidity > 0.0 {
        BudgetSource::LiquidityPlusLoan
    } else if profile.loan_amount > 0.0 {
        BudgetSource::Loan
    } else {
        BudgetSource::Liquidity
    }
}

/// Housing goals target districts when any district was mentioned; bare
/// city mentions only matter when no district narrows them down.
fn residential_targets(locations: &[LocationEntity]) -> Vec<String> {
    let districts: Vec<String> =
        locations.iter().filter(|l| !l.is_city).map(|l| l.name.clone()).collect();
    if !districts.is_empty() {
        districts
    } else {
        locations.iter().map(|l| l.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlu::{EntityExtractor, PatternTables};
    use std::sync::Arc;

    fn build(text: &str) -> (UserProfile, Vec<SearchGoal>) {
        let extractor = EntityExtractor::new(Arc::new(PatternTables::new()));
        ProfileGoalBuilder::new().build(&extractor.extract_all(text))
    }

    #[test]
    fn total_budget_conserved() {
        let (profile, _) = build("600 million cash plus a 200 million loan, rent in Tehran");
        assert_eq!(profile.liquidity, 600.0);
        assert_eq!(profile.loan_amount, 200.0);
        assert_eq!(profile.total_budget(), 800.0);
    }

    #[test]
    fn city_plus_district_yields_one_goal() {
        let (profile, goals) = build("600 million cash, want to rent an apartment in Tehran Ekbatan");
        assert_eq!(profile.liquidity, 600.0);
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].goal_id, 1);
        assert_eq!(goals[0].goal_type, GoalType::ResidentialRent);
        assert!(goals[0].target_location.contains("Ekbatan"));
        assert_eq!(goals[0].priority, Priority::High);
        assert_eq!(goals[0].max_price, Some(600.0));
    }

    #[test]
    fn goal_ids_are_contiguous_from_one() {
        let (_, goals) = build("rent in Ekbatan or Vanak or Gisha, 500 million");
        let ids: Vec<u32> = goals.iter().map(|g| g.goal_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn priority_non_increasing_with_mention_order() {
        let (_, goals) = build("rent in Ekbatan or Vanak, 500 million");
        assert_eq!(goals[0].priority, Priority::High);
        assert_eq!(goals[1].priority, Priority::Medium);
        assert!(goals[0].priority.rank() >= goals[1].priority.rank());
    }

    #[test]
    fn fallback_phrase_adds_alternative_area_goal() {
        let (_, goals) =
            build("500 million, rent in Ekbatan and Vanak, if I can't, which area is good?");
        let last = goals.last().unwrap();
        assert!(last.target_location.contains("suitable alternative area in Tehran"));
        assert_eq!(last.priority, Priority::Medium);
        assert!(goals.len() > 2);
    }

    #[test]
    fn vehicle_goal_targets_any_with_lease_cap() {
        let (_, goals) = build("buy a car, can pay 15 million monthly");
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].goal_type, GoalType::VehiclePurchaseOrLease);
        assert_eq!(goals[0].target_location, "Any");
        assert_eq!(goals[0].max_monthly_lease_payment, Some(15.0));
    }

    #[test]
    fn budget_source_reflects_loan_mix() {
        let (_, goals) = build("600 million cash and a 200 million loan, rent in Vanak");
        assert_eq!(goals[0].budget_source, BudgetSource::LiquidityPlusLoan);

        let (_, goals) = build("a 200 million loan, rent in Vanak");
        assert_eq!(goals[0].budget_source, BudgetSource::Loan);

        let (_, goals) = build("600 million cash, rent in Vanak");
        assert_eq!(goals[0].budget_source, BudgetSource::Liquidity);
    }

    #[test]
    fn same_input_same_goals() {
        let a = build("rent in Ekbatan or Vanak, 500 million");
        let b = build("rent in Ekbatan or Vanak, 500 million");
        assert_eq!(a.1, b.1);
    }
}
