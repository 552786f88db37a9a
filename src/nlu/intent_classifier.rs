// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Keyword/pattern intent scoring.
//!
//! Two rule sets vote: plain keywords (small fixed weights) and regex
//! patterns (each worth more than any single keyword). The two normalized
//! scores are merged half and half.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::nlu::patterns::PatternTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Search,
    Advice,
    Calculate,
}

/// Tie-break priority: search > advice > calculate.
const INTENT_ORDER: [Intent; 3] = [Intent::Search, Intent::Advice, Intent::Calculate];

/// Winning score below this asks for clarification.
const CLARIFICATION_THRESHOLD: f64 = 0.3;
/// So does a top-two gap smaller than this.
const CLARIFICATION_MARGIN: f64 = 0.05;

/// Matched keyword weight mass at which the keyword score saturates.
const KEYWORD_SATURATION: f64 = 3.0;
/// Matched pattern weight mass at which the pattern score saturates; one
/// strong pattern is a full signal.
const PATTERN_SATURATION: f64 = 2.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f64,
    pub requires_clarification: bool,
}

pub struct IntentClassifier {
    tables: Arc<PatternTables>,
}

impl IntentClassifier {
    pub fn new(tables: Arc<PatternTables>) -> Self {
        Self { tables }
    }

    pub fn classify(&self, text: &str) -> IntentResult {
        if text.trim().len() < 2 {
            return IntentResult {
                intent: Intent::Search,
                confidence: 0.0,
                requires_clarification: true,
            };
        }

        let lower = text.to_lowercase();
        let scores: Vec<(Intent, f64)> = INTENT_ORDER
            .iter()
            .map(|&intent| (intent, self.final_score(intent, text, &lower)))
            .collect();

        // INTENT_ORDER iteration with strict `>` makes ties resolve to the
        // earlier (higher-priority) intent.
        let mut winner = scores[0];
        for &candidate in &scores[1..] {
            if candidate.1 > winner.1 {
                winner = candidate;
            }
        }

        let runner_up = scores
            .iter()
            .filter(|(intent, _)| *intent != winner.0)
            .map(|(_, score)| *score)
            .fold(0.0, f64::max);

        let requires_clarification = winner.1 < CLARIFICATION_THRESHOLD
            || (winner.1 - runner_up) < CLARIFICATION_MARGIN;

        IntentResult {
            intent: winner.0,
            confidence: winner.1,
            requires_clarification,
        }
    }

    /// Questions to send back when the request was too ambiguous to act on.
    pub fn clarification_questions(&self, intent: Intent, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut questions = Vec::new();
        match intent {
            Intent::Search => {
                let has_money = self
                    .tables
                    .money_rules
                    .iter()
                    .any(|r| r.regex.is_match(text));
                if !has_money {
                    questions.push("What is your budget?".to_string());
                }
                let has_location = self.tables.gazetteer.iter().any(|entry| {
                    entry.surfaces.iter().any(|s| lower.contains(s))
                });
                if !has_location {
                    questions.push("Which area should we search in?".to_string());
                }
            }
            Intent::Advice => {
                questions.push("What topic do you need advice on?".to_string());
            }
            Intent::Calculate => {
                questions.push("What would you like to calculate?".to_string());
            }
        }
        if questions.is_empty() {
            questions.push("Could you describe your request in more detail?".to_string());
        }
        questions
    }

    /// 0.5 * normalized keyword score + 0.5 * normalized pattern score.
    fn final_score(&self, intent: Intent, text: &str, lower: &str) -> f64 {
        let keyword_mass: f64 = self
            .tables
            .intent_keywords
            .iter()
            .filter(|k| k.intent == intent && lower.contains(k.word))
            .map(|k| k.weight)
            .sum();
        let pattern_mass: f64 = self
            .tables
            .intent_patterns
            .iter()
            .filter(|p| p.intent == intent && p.regex.is_match(text))
            .map(|p| p.weight)
            .sum();

        let keyword_score = (keyword_mass / KEYWORD_SATURATION).clamp(0.0, 1.0);
        let pattern_score = (pattern_mass / PATTERN_SATURATION).clamp(0.0, 1.0);
        0.5 * keyword_score + 0.5 * pattern_score
    }
}
