// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! The assistant engine: one natural-language request in, one response
//! out. Wires intent classification, entity extraction, profile/goal
//! building, query generation, the crawl orchestrator and the normalizer
//! into a single pipeline.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Settings;
use crate::crawl::{CancelToken, CrawlOrchestrator};
use crate::domain::adapter::{AdapterError, SiteAdapter};
use crate::domain::models::{CrawlErrorRecord, StructuredQuery};
use crate::nlu::{EntityExtractor, Intent, IntentClassifier, PatternTables, ProfileGoalBuilder};
use crate::normalize::{DataNormalizer, SearchReport};
use crate::query::QueryGenerator;
use crate::sites;

/// Weight of the intent score in the blended request confidence.
const INTENT_CONFIDENCE_WEIGHT: f64 = 0.4;
/// Weight of entity presence in the blended request confidence.
const ENTITY_CONFIDENCE_WEIGHT: f64 = 0.6;
/// Applied when no budget signal of any kind was found.
const INCOMPLETE_PROFILE_PENALTY: f64 = 0.7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl SearchRequest {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into(), session_id: None, context: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub success: bool,
    pub intent: Intent,
    pub confidence: f64,
    pub requires_clarification: bool,
    pub clarification_questions: Vec<String>,
    /// Human-readable summary of what happened.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<StructuredQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SearchReport>,
    pub errors: Vec<CrawlErrorRecord>,
}

pub struct AssistantEngine {
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    builder: ProfileGoalBuilder,
    generator: QueryGenerator,
    orchestrator: CrawlOrchestrator,
    normalizer: DataNormalizer,
}

impl AssistantEngine {
    /// Builds an engine with the full marketplace adapter roster.
    pub fn new(settings: Settings) -> Result<Self, AdapterError> {
        let adapters = sites::build_adapters(&settings)?;
        Ok(Self::with_adapters(adapters, settings))
    }

    /// Builds an engine over an explicit adapter set, used by tests and by
    /// callers that want a restricted roster.
    pub fn with_adapters(adapters: Vec<Arc<dyn SiteAdapter>>, settings: Settings) -> Self {
        let tables = Arc::new(PatternTables::new());
        Self {
            classifier: IntentClassifier::new(Arc::clone(&tables)),
            extractor: EntityExtractor::new(tables),
            builder: ProfileGoalBuilder::new(),
            generator: QueryGenerator::new(),
            orchestrator: CrawlOrchestrator::new(adapters, settings),
            normalizer: DataNormalizer::new(),
        }
    }

    /// Runs the full pipeline for one request.
    pub async fn handle(&self, request: &SearchRequest, cancel: &CancelToken) -> AssistantResponse {
        info!(text_len = request.text.len(), "handling request");
        let intent_result = self.classifier.classify(&request.text);
        debug!(intent = ?intent_result.intent, confidence = intent_result.confidence, "classified");

        if intent_result.requires_clarification {
            let questions =
                self.classifier.clarification_questions(intent_result.intent, &request.text);
            return AssistantResponse {
                success: true,
                intent: intent_result.intent,
                confidence: intent_result.confidence,
                requires_clarification: true,
                clarification_questions: questions,
                message: "I need a bit more information before I can search.".to_string(),
                query: None,
                report: None,
                errors: Vec::new(),
            };
        }

        if intent_result.intent != Intent::Search {
            return self.non_search_response(intent_result.intent, intent_result.confidence);
        }

        let entities = self.extractor.extract_all(&request.text);
        let (profile, goals) = self.builder.build(&entities);

        let entity_confidence = entity_presence_score(&entities);
        let mut confidence = INTENT_CONFIDENCE_WEIGHT * intent_result.confidence
            + ENTITY_CONFIDENCE_WEIGHT * entity_confidence;
        if profile.total_budget() <= 0.0 && profile.max_monthly_payment <= 0.0 {
            confidence *= INCOMPLETE_PROFILE_PENALTY;
        }

        let query = StructuredQuery {
            is_multi_goal: goals.len() > 1,
            confidence,
            timestamp: Utc::now(),
            user_profile: profile,
            search_goals: goals,
        };

        let site_queries = self.generator.generate(&query.user_profile, &query.search_goals);
        let batch = self.orchestrator.crawl_batch(&site_queries, cancel).await;
        let report = self.normalizer.normalize(&batch);

        let message = summarize(&report, &query);
        let errors = report.errors.clone();

        AssistantResponse {
            success: report.success,
            intent: Intent::Search,
            confidence,
            requires_clarification: false,
            clarification_questions: Vec::new(),
            message,
            query: Some(query),
            report: Some(report),
            errors,
        }
    }

    fn non_search_response(&self, intent: Intent, confidence: f64) -> AssistantResponse {
        let message = match intent {
            Intent::Advice => {
                "That sounds like a request for advice. I can compare areas and budgets \
                 once you tell me what you are weighing."
            }
            Intent::Calculate => {
                "That sounds like a calculation. Tell me your income, savings and any \
                 loan terms and I can estimate what fits."
            }
            Intent::Search => unreachable!("search handled by the main path"),
        };
        AssistantResponse {
            success: true,
            intent,
            confidence,
            requires_clarification: false,
            clarification_questions: Vec::new(),
            message: message.to_string(),
            query: None,
            report: None,
            errors: Vec::new(),
        }
    }
}

/// How much of the extraction we would want to see actually showed up.
fn entity_presence_score(entities: &crate::domain::models::EntitySet) -> f64 {
    let mut score = 0.0;
    if entities.primary_liquidity > 0.0
        || entities.loan_amount > 0.0
        || entities.monthly_payment > 0.0
    {
        score += 0.4;
    }
    if !entities.locations.is_empty() {
        score += 0.3;
    }
    if entities.search_type.goal_type.is_some() {
        score += 0.3;
    }
    score
}

fn summarize(report: &SearchReport, query: &StructuredQuery) -> String {
    let goals = query.search_goals.len();
    let mut message = if report.total_items == 0 {
        format!("No listings matched your {goals} search goal(s) right now.")
    } else {
        format!(
            "Found {} listing(s) across {} site(s) for your {} search goal(s).",
            report.total_items,
            report.sources.len(),
            goals
        )
    };
    if !report.errors.is_empty() {
        message.push_str(&format!(" {} site quer(ies) failed along the way.", report.errors.len()));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AssistantEngine {
        AssistantEngine::with_adapters(Vec::new(), Settings::default())
    }

    #[tokio::test]
    async fn vague_request_asks_for_clarification() {
        let response = engine()
            .handle(&SearchRequest::from_text("hmm"), &CancelToken::new())
            .await;
        assert!(response.requires_clarification);
        assert!(!response.clarification_questions.is_empty());
        assert!(response.query.is_none());
        assert!(response.report.is_none());
    }

    #[tokio::test]
    async fn advice_request_short_circuits_before_crawling() {
        let response = engine()
            .handle(
                &SearchRequest::from_text("Which area should I pick, any advice?"),
                &CancelToken::new(),
            )
            .await;
        assert_eq!(response.intent, Intent::Advice);
        assert!(response.report.is_none());
        assert!(response.message.contains("advice"));
    }

    #[tokio::test]
    async fn search_request_builds_structured_query() {
        let response = engine()
            .handle(
                &SearchRequest::from_text(
                    "I have 600 million and want to rent an apartment in Ekbatan",
                ),
                &CancelToken::new(),
            )
            .await;

        assert_eq!(response.intent, Intent::Search);
        assert!(!response.requires_clarification);
        let query = response.query.expect("structured query present");
        assert_eq!(query.user_profile.liquidity, 600.0);
        assert_eq!(query.search_goals.len(), 1);
        assert!(!query.is_multi_goal);
        assert!(query.confidence > 0.5);
        // No adapters were registered, so every site query failed fatally,
        // but a report still came back.
        let report = response.report.expect("report present");
        assert_eq!(report.total_items, 0);
        assert!(!response.errors.is_empty());
    }

    #[tokio::test]
    async fn missing_budget_lowers_confidence() {
        let e = engine();
        let with_budget = e
            .handle(
                &SearchRequest::from_text(
                    "I have 600 million and want to rent an apartment in Ekbatan",
                ),
                &CancelToken::new(),
            )
            .await;
        let without_budget = e
            .handle(
                &SearchRequest::from_text("I want to rent an apartment in Ekbatan"),
                &CancelToken::new(),
            )
            .await;

        assert!(with_budget.confidence > without_budget.confidence);
    }

    #[tokio::test]
    async fn multi_goal_flag_tracks_goal_count() {
        let response = engine()
            .handle(
                &SearchRequest::from_text(
                    "I have 500 million and want to rent in Ekbatan or Vanak",
                ),
                &CancelToken::new(),
            )
            .await;
        let query = response.query.expect("structured query present");
        assert!(query.search_goals.len() > 1);
        assert!(query.is_multi_goal);
    }
}
