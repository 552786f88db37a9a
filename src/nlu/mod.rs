// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod entity_extractor;
pub mod intent_classifier;
pub mod patterns;
pub mod profile_builder;

pub use entity_extractor::EntityExtractor;
pub use intent_classifier::{Intent, IntentClassifier, IntentResult};
pub use patterns::PatternTables;
pub use profile_builder::ProfileGoalBuilder;
