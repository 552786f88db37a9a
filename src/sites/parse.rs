// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! HTML extraction helpers shared by all site adapters.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number pattern"));

/// Parses a compile-time selector. Only call with literals that are known
/// to be valid CSS.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid css selector literal")
}

/// Collapsed, trimmed text content of the first match under `element`.
pub fn text_of(element: ElementRef<'_>, sel: &Selector) -> Option<String> {
    element.select(sel).next().map(|e| clean_text(&e.text().collect::<String>()))
}

/// Attribute value of the first match under `element`.
pub fn attr_of<'a>(element: ElementRef<'a>, sel: &Selector, attr: &str) -> Option<&'a str> {
    element.select(sel).next().and_then(|e| e.value().attr(attr))
}

/// Collapses runs of whitespace and decodes leftover entities.
pub fn clean_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Last path segment of a listing href, used as the site-local id.
pub fn id_from_href(href: &str) -> Option<String> {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Parses a displayed price into millions of tomans.
///
/// Handles Persian digits, thousands separators (both `,` and `،`) and the
/// scale words miliard (x1000) and hezar (/1000). A bare number is taken
/// to already be in millions, which is how the sites display prices.
pub fn parse_price_to_millions(price_text: &str) -> Option<f64> {
    let folded = deunicode::deunicode(price_text);
    let stripped = folded.replace([',', ' '], "");

    let value: f64 = NUMBER_RE.find(&stripped)?.as_str().parse().ok()?;

    if price_text.contains("میلیارد") || price_text.contains("بیلیون") {
        Some(value * 1000.0)
    } else if price_text.contains("هزار") {
        Some(value / 1000.0)
    } else {
        Some(value)
    }
}
