// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod entities;
pub mod listing;
pub mod profile;
pub mod query;

pub use entities::{EntitySet, LocationEntity, MoneyEntity, SearchTypeInfo};
pub use listing::{
    CrawlBatchResult, CrawlErrorKind, CrawlErrorRecord, FetchedItem, NormalizedItem, QualityBucket,
    RawItem, SiteReport,
};
pub use profile::{BudgetSource, GoalType, Priority, SearchGoal, StructuredQuery, UserProfile};
pub use query::SiteQuery;
