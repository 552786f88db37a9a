// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Typed entity extraction over free-form request text.
//!
//! Pure and deterministic given the same pattern tables: no I/O, and it
//! never fails. A missing entity type comes back as an empty/zero value.

use std::sync::Arc;

use deunicode::deunicode;
use tracing::debug;

use crate::domain::models::{EntitySet, LocationEntity, MoneyEntity, SearchTypeInfo};
use crate::domain::models::profile::GoalType;
use crate::nlu::patterns::{PatternTables, AMBIGUITY_PENALTY, SCALED_RULE_CONFIDENCE};

pub struct EntityExtractor {
    tables: Arc<PatternTables>,
}

/// Candidate money match before overlap resolution.
struct MoneyCandidate {
    start: usize,
    end: usize,
    value: f64,
    confidence: f64,
    rule_idx: usize,
}

impl EntityExtractor {
    pub fn new(tables: Arc<PatternTables>) -> Self {
        Self { tables }
    }

    /// Extract every entity type from `text`.
    pub fn extract_all(&self, text: &str) -> EntitySet {
        let lower = text.to_lowercase();

        let money = self.extract_money(text);
        let locations = self.extract_locations(text);
        let search_type = self.extract_search_type(&lower);

        // Loan association runs first and claims its entity; the payment
        // association then picks the nearest among what remains.
        let mut claimed = vec![false; money.len()];
        let (loan_amount, loan_availability_months) =
            self.extract_loan(text, &lower, &money, &mut claimed);
        let monthly_payment = self.associate_nearest(&lower, self.tables.payment_keywords, &money, &mut claimed);

        let primary_liquidity = money
            .iter()
            .zip(&claimed)
            .filter(|(_, claimed)| !**claimed)
            .map(|(m, _)| m.value_millions)
            .fold(0.0, f64::max);

        let wants_alternative_area =
            self.tables.fallback_phrases.iter().any(|p| lower.contains(p));

        debug!(
            money = money.len(),
            locations = locations.len(),
            loan_amount,
            monthly_payment,
            "entities extracted"
        );

        EntitySet {
            money,
            locations,
            loan_amount,
            loan_availability_months,
            monthly_payment,
            primary_liquidity,
            search_type,
            wants_alternative_area,
        }
    }

    /// Apply the ordered money rules, then resolve overlaps by preferring
    /// the longest match at a given start offset, then rule order.
    fn extract_money(&self, text: &str) -> Vec<MoneyEntity> {
        let mut candidates: Vec<MoneyCandidate> = Vec::new();

        for (rule_idx, rule) in self.tables.money_rules.iter().enumerate() {
            for caps in rule.regex.captures_iter(text) {
                let whole = caps.get(0).expect("regex match has group 0");
                let Some(value) = caps.get(1).and_then(|m| parse_number(m.as_str())) else {
                    continue;
                };
                let confidence = if rule.has_scale_word {
                    SCALED_RULE_CONFIDENCE
                } else {
                    SCALED_RULE_CONFIDENCE - AMBIGUITY_PENALTY
                };
                candidates.push(MoneyCandidate {
                    start: whole.start(),
                    end: whole.end(),
                    value: value * rule.scale,
                    confidence,
                    rule_idx,
                });
            }
        }

        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a.rule_idx.cmp(&b.rule_idx))
        });

        let mut entities = Vec::new();
        let mut covered_until = 0usize;
        for c in candidates {
            if c.start < covered_until {
                continue;
            }
            covered_until = c.end;
            entities.push(MoneyEntity {
                value_millions: c.value,
                raw_text: text[c.start..c.end].to_string(),
                confidence: c.confidence,
                span_start: c.start,
                span_end: c.end,
            });
        }
        entities
    }

    /// Gazetteer scan preserving first-seen order. Presence only, no
    /// confidence scoring.
    ///
    /// Matching runs against a per-char lowercased copy whose byte offsets
    /// are mapped back onto `text`, since lowercasing can change a char's
    /// byte length (e.g. 'İ' expands to two chars).
    fn extract_locations(&self, text: &str) -> Vec<LocationEntity> {
        let mut lower = String::with_capacity(text.len());
        // For every byte of `lower`, the byte span of the original char
        // it came from.
        let mut spans: Vec<(usize, usize)> = Vec::with_capacity(text.len());
        for (start, ch) in text.char_indices() {
            let end = start + ch.len_utf8();
            for low in ch.to_lowercase() {
                let before = lower.len();
                lower.push(low);
                for _ in before..lower.len() {
                    spans.push((start, end));
                }
            }
        }

        let mut hits: Vec<(usize, LocationEntity)> = Vec::new();
        for entry in self.tables.gazetteer {
            let earliest = entry
                .surfaces
                .iter()
                .filter_map(|s| lower.find(s).map(|pos| (pos, s.len())))
                .min_by_key(|(pos, _)| *pos);
            if let Some((pos, len)) = earliest {
                let name_start = spans[pos].0;
                let name_end = spans[pos + len - 1].1;
                hits.push((
                    name_start,
                    LocationEntity {
                        name: text[name_start..name_end].to_string(),
                        city: entry.city.to_string(),
                        is_city: entry.is_city,
                    },
                ));
            }
        }
        hits.sort_by_key(|(pos, _)| *pos);
        hits.into_iter().map(|(_, loc)| loc).collect()
    }

    fn extract_loan(
        &self,
        text: &str,
        lower: &str,
        money: &[MoneyEntity],
        claimed: &mut [bool],
    ) -> (f64, u32) {
        let loan_amount = self.associate_nearest(lower, self.tables.loan_keywords, money, claimed);

        let loan_mentioned = self.tables.loan_keywords.iter().any(|k| lower.contains(k));
        let months = if loan_mentioned {
            self.tables
                .months_regex
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| parse_number(m.as_str()))
                .map(|n| n as u32)
                .unwrap_or(0)
        } else {
            0
        };

        (loan_amount, months)
    }

    /// Nearest-money-to-keyword heuristic: among all (keyword occurrence,
    /// unclaimed entity) pairs within the bounded window, claim the closest
    /// pair's entity. Known to misassociate in adjacent/ambiguous phrasing.
    fn associate_nearest(
        &self,
        lower: &str,
        keywords: &[&str],
        money: &[MoneyEntity],
        claimed: &mut [bool],
    ) -> f64 {
        let window = self.tables.association_window;
        let mut best: Option<(usize, usize)> = None; // (distance, entity index)

        for keyword in keywords {
            let mut search_from = 0;
            while let Some(rel) = lower[search_from..].find(keyword) {
                let kw_start = search_from + rel;
                let kw_end = kw_start + keyword.len();
                for (idx, entity) in money.iter().enumerate() {
                    if claimed[idx] {
                        continue;
                    }
                    let distance = if entity.span_end <= kw_start {
                        kw_start - entity.span_end
                    } else if entity.span_start >= kw_end {
                        entity.span_start - kw_end
                    } else {
                        0
                    };
                    if distance <= window && best.is_none_or(|(d, _)| distance < d) {
                        best = Some((distance, idx));
                    }
                }
                search_from = kw_end;
            }
        }

        match best {
            Some((_, idx)) => {
                claimed[idx] = true;
                money[idx].value_millions
            }
            None => 0.0,
        }
    }

    /// Keyword table lookup with fixed rule priority:
    /// rent > purchase > lease > electronics > other.
    fn extract_search_type(&self, lower: &str) -> SearchTypeInfo {
        let t = &self.tables;
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        let is_rent = has(t.rent_keywords);
        let is_purchase = has(t.purchase_keywords);
        let is_lease = has(t.lease_keywords);
        let is_vehicle = has(t.vehicle_keywords);
        let is_electronics = has(t.electronics_keywords);

        let (goal_type, search_type) = if is_rent {
            let label = if has(t.full_deposit_phrases) { "full_deposit" } else { "deposit_rent" };
            (Some(GoalType::ResidentialRent), label)
        } else if is_purchase {
            if is_vehicle {
                (Some(GoalType::VehiclePurchaseOrLease), "purchase")
            } else if is_electronics {
                (Some(GoalType::Electronics), "purchase")
            } else {
                (Some(GoalType::ResidentialPurchase), "purchase")
            }
        } else if is_lease {
            (Some(GoalType::VehiclePurchaseOrLease), "lease")
        } else if is_electronics {
            (Some(GoalType::Electronics), "general")
        } else {
            (None, "general")
        };

        SearchTypeInfo {
            goal_type,
            search_type: search_type.to_string(),
            is_rent,
            is_purchase,
            is_lease,
        }
    }
}

/// Parse a number that may carry Persian digits and thousand separators.
fn parse_number(raw: &str) -> Option<f64> {
    let folded = deunicode(raw).replace(',', "");
    folded.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new(Arc::new(PatternTables::new()))
    }

    #[test]
    fn million_value_round_trips_exactly() {
        let set = extractor().extract_all("I have 600 million cash");
        assert_eq!(set.money.len(), 1);
        assert_eq!(set.money[0].value_millions, 600.0);
        assert_eq!(set.money[0].confidence, SCALED_RULE_CONFIDENCE);
        assert_eq!(set.primary_liquidity, 600.0);
    }

    #[test]
    fn scale_words_normalize_to_millions() {
        let set = extractor().extract_all("2 billion or 500 thousand");
        let values: Vec<f64> = set.money.iter().map(|m| m.value_millions).collect();
        assert_eq!(values, vec![2000.0, 0.5]);
    }

    #[test]
    fn persian_digits_and_units() {
        let set = extractor().extract_all("۶۰۰ میلیون تومان نقد دارم");
        assert_eq!(set.money.len(), 1);
        assert_eq!(set.money[0].value_millions, 600.0);
    }

    #[test]
    fn bare_amount_gets_ambiguity_penalty() {
        let set = extractor().extract_all("قیمتش 470000 تومان بود");
        assert_eq!(set.money.len(), 1);
        assert!((set.money[0].value_millions - 0.47).abs() < 1e-9);
        assert_eq!(set.money[0].confidence, SCALED_RULE_CONFIDENCE - AMBIGUITY_PENALTY);
    }

    #[test]
    fn longest_match_wins_at_same_offset() {
        // "600 million toman" must yield one entity from the million rule,
        // not an extra bare-currency match.
        let set = extractor().extract_all("600 million toman");
        assert_eq!(set.money.len(), 1);
        assert_eq!(set.money[0].value_millions, 600.0);
    }

    #[test]
    fn loan_association_claims_nearest() {
        let set = extractor().extract_all("600 million cash and a 200 million loan");
        assert_eq!(set.loan_amount, 200.0);
        assert_eq!(set.primary_liquidity, 600.0);
    }

    #[test]
    fn loan_months_default_to_zero() {
        let set = extractor().extract_all("a 200 million loan");
        assert_eq!(set.loan_amount, 200.0);
        assert_eq!(set.loan_availability_months, 0);
    }

    #[test]
    fn loan_months_extracted() {
        let set = extractor().extract_all("a 200 million loan available in 6 months");
        assert_eq!(set.loan_amount, 200.0);
        assert_eq!(set.loan_availability_months, 6);
    }

    #[test]
    fn loan_claims_before_monthly_payment() {
        // Both keywords compete; loan wins its entity first, payment takes
        // the remaining one.
        let set = extractor().extract_all("a 300 million loan, paying 5 million monthly");
        assert_eq!(set.loan_amount, 300.0);
        assert_eq!(set.monthly_payment, 5.0);
        assert_eq!(set.primary_liquidity, 0.0);
    }

    #[test]
    fn locations_preserve_first_seen_order() {
        let set = extractor().extract_all("maybe Vanak, or Tehran near Ekbatan");
        let names: Vec<&str> = set.locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Vanak", "Tehran", "Ekbatan"]);
        assert!(set.locations[0].city == "Tehran");
    }

    #[test]
    fn persian_locations() {
        let set = extractor().extract_all("در تهران منطقه اکباتان");
        let names: Vec<&str> = set.locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["تهران", "اکباتان"]);
    }

    #[test]
    fn width_changing_lowercase_keeps_location_spans_valid() {
        // 'İ' lowercases to two chars, shifting every later byte offset in
        // the lowercased text. Spans must still land on the original text.
        let set = extractor().extract_all("İstanbul? نه، تهران نزدیک اکباتان");
        let names: Vec<&str> = set.locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["تهران", "اکباتان"]);
    }

    #[test]
    fn rent_beats_purchase_in_rule_order() {
        let set = extractor().extract_all("want to rent or buy an apartment");
        assert_eq!(set.search_type.goal_type, Some(GoalType::ResidentialRent));
        assert!(set.search_type.is_rent);
        assert!(set.search_type.is_purchase);
    }

    #[test]
    fn vehicle_purchase_detected() {
        let set = extractor().extract_all("buy a car with 500 million");
        assert_eq!(set.search_type.goal_type, Some(GoalType::VehiclePurchaseOrLease));
    }

    #[test]
    fn full_deposit_label() {
        let set = extractor().extract_all("دنبال رهن کامل هستم");
        assert_eq!(set.search_type.search_type, "full_deposit");
    }

    #[test]
    fn extraction_never_fails_on_empty_input() {
        let set = extractor().extract_all("");
        assert!(set.money.is_empty());
        assert!(set.locations.is_empty());
        assert_eq!(set.primary_liquidity, 0.0);
        assert_eq!(set.search_type.goal_type, None);
    }

    #[test]
    fn fallback_phrase_detected() {
        let set = extractor().extract_all("rent in Ekbatan, if I can't, which area do you suggest?");
        assert!(set.wants_alternative_area);
    }
}
