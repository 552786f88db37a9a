// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod settings;

pub use settings::{CrawlSettings, Settings, SiteSettings};
