// Copyright (c) 2025 Bazaryab Contributors
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! Static pattern and keyword tables for request understanding.
//!
//! All tables are immutable, compiled once at startup and passed into the
//! extractor/classifier constructors. The vocabulary is bilingual: the
//! marketplaces are Persian, but requests arrive in Persian or English.

use regex::Regex;

use crate::nlu::intent_classifier::Intent;

/// Digit class covering ASCII and Persian digits.
const NUM: &str = r"[0-9\u{6F0}-\u{6F9}]+(?:,[0-9\u{6F0}-\u{6F9}]{3})*(?:\.[0-9\u{6F0}-\u{6F9}]+)?";

/// One ordered money-extraction rule. `scale` converts the captured
/// number to the million-unit base.
pub struct MoneyRule {
    pub regex: Regex,
    pub scale: f64,
    /// False for the bare-currency rule; triggers the ambiguity penalty.
    pub has_scale_word: bool,
}

/// One gazetteer entry: all surface forms plus the canonical city it
/// belongs to. Matching is case-insensitive on the surfaces.
pub struct GazetteerEntry {
    pub surfaces: &'static [&'static str],
    pub city: &'static str,
    pub is_city: bool,
}

pub struct IntentKeyword {
    pub intent: Intent,
    pub word: &'static str,
    pub weight: f64,
}

pub struct IntentPattern {
    pub intent: Intent,
    pub regex: Regex,
    pub weight: f64,
}

pub struct PatternTables {
    /// Largest scale unit first: billion, million, thousand, bare currency.
    pub money_rules: Vec<MoneyRule>,
    pub months_regex: Regex,
    pub loan_keywords: &'static [&'static str],
    pub payment_keywords: &'static [&'static str],
    /// Byte window for nearest-money-to-keyword association.
    pub association_window: usize,
    pub gazetteer: &'static [GazetteerEntry],
    pub fallback_phrases: &'static [&'static str],
    pub rent_keywords: &'static [&'static str],
    pub full_deposit_phrases: &'static [&'static str],
    pub purchase_keywords: &'static [&'static str],
    pub lease_keywords: &'static [&'static str],
    pub vehicle_keywords: &'static [&'static str],
    pub electronics_keywords: &'static [&'static str],
    pub intent_keywords: Vec<IntentKeyword>,
    pub intent_patterns: Vec<IntentPattern>,
}

/// Fixed confidence for rules that matched an explicit scale word.
pub const SCALED_RULE_CONFIDENCE: f64 = 0.9;
/// Subtracted when a number carries no scale word.
pub const AMBIGUITY_PENALTY: f64 = 0.25;

static GAZETTEER: &[GazetteerEntry] = &[
    GazetteerEntry { surfaces: &["تهران", "tehran"], city: "Tehran", is_city: true },
    GazetteerEntry { surfaces: &["کرج", "karaj"], city: "Karaj", is_city: true },
    GazetteerEntry { surfaces: &["اکباتان", "ekbatan"], city: "Tehran", is_city: false },
    GazetteerEntry { surfaces: &["ولیعصر", "valiasr"], city: "Tehran", is_city: false },
    GazetteerEntry { surfaces: &["تجریش", "tajrish"], city: "Tehran", is_city: false },
    GazetteerEntry { surfaces: &["ونک", "vanak"], city: "Tehran", is_city: false },
    GazetteerEntry { surfaces: &["پاسداران", "pasdaran"], city: "Tehran", is_city: false },
    GazetteerEntry {
        surfaces: &["شهرک غرب", "shahrak-e gharb", "shahrak gharb"],
        city: "Tehran",
        is_city: false,
    },
    GazetteerEntry {
        surfaces: &["سعادت آباد", "saadat abad", "saadatabad"],
        city: "Tehran",
        is_city: false,
    },
    GazetteerEntry { surfaces: &["میرداماد", "mirdamad"], city: "Tehran", is_city: false },
    GazetteerEntry { surfaces: &["گیشا", "gisha"], city: "Tehran", is_city: false },
    GazetteerEntry { surfaces: &["جنت آباد", "jannat abad"], city: "Tehran", is_city: false },
];

impl PatternTables {
    pub fn new() -> Self {
        let money_rules = vec![
            MoneyRule {
                regex: Regex::new(&format!(r"(?i)({NUM})\s*(?:میلیارد|بیلیون|billion|bn)\b"))
                    .expect("billion rule"),
                scale: 1000.0,
                has_scale_word: true,
            },
            MoneyRule {
                regex: Regex::new(&format!(r"(?i)({NUM})\s*(?:میلیون|ملیون|million|mil|m)\b"))
                    .expect("million rule"),
                scale: 1.0,
                has_scale_word: true,
            },
            MoneyRule {
                regex: Regex::new(&format!(r"(?i)({NUM})\s*(?:هزار|thousand|k)\b"))
                    .expect("thousand rule"),
                scale: 0.001,
                has_scale_word: true,
            },
            // Bare currency amount: interpreted as whole tomans.
            MoneyRule {
                regex: Regex::new(&format!(r"(?i)({NUM})\s*(?:تومان|تومن|toman)"))
                    .expect("bare currency rule"),
                scale: 1e-6,
                has_scale_word: false,
            },
        ];

        let months_regex = Regex::new(&format!(
            r"(?i)({NUM})\s*(?:ماه(?:\s*(?:دیگه|دیگر|آینده|بعد))?|months?)\b"
        ))
        .expect("months rule");

        let kw = |intent, word| IntentKeyword { intent, word, weight: 1.0 };
        let intent_keywords = vec![
            kw(Intent::Search, "می‌خواهم"),
            kw(Intent::Search, "میخوام"),
            kw(Intent::Search, "جستجو"),
            kw(Intent::Search, "پیدا"),
            kw(Intent::Search, "خرید"),
            kw(Intent::Search, "تهیه"),
            kw(Intent::Search, "بگیرم"),
            kw(Intent::Search, "ببینم"),
            kw(Intent::Search, "want"),
            kw(Intent::Search, "need"),
            kw(Intent::Search, "find"),
            kw(Intent::Search, "search"),
            kw(Intent::Search, "buy"),
            kw(Intent::Search, "rent"),
            kw(Intent::Search, "looking"),
            kw(Intent::Advice, "پیشنهاد"),
            kw(Intent::Advice, "راهنمایی"),
            kw(Intent::Advice, "مشاوره"),
            kw(Intent::Advice, "کمک"),
            kw(Intent::Advice, "بهترین"),
            kw(Intent::Advice, "بهتره"),
            kw(Intent::Advice, "advice"),
            kw(Intent::Advice, "suggest"),
            kw(Intent::Advice, "recommend"),
            kw(Intent::Advice, "should"),
            kw(Intent::Advice, "better"),
            kw(Intent::Calculate, "محاسبه"),
            kw(Intent::Calculate, "حساب"),
            kw(Intent::Calculate, "چقدر"),
            kw(Intent::Calculate, "میتونم"),
            kw(Intent::Calculate, "توانایی"),
            kw(Intent::Calculate, "قدرت خرید"),
            kw(Intent::Calculate, "calculate"),
            kw(Intent::Calculate, "afford"),
            kw(Intent::Calculate, "how much"),
        ];

        let pat = |intent, src: &str| IntentPattern {
            intent,
            regex: Regex::new(src).expect("intent pattern"),
            weight: 2.0,
        };
        let intent_patterns = vec![
            pat(Intent::Search, r"(?i)(?:want|need|looking)\s+to\s+(?:find|buy|rent|get|lease)"),
            pat(Intent::Search, r"می‌?خوا(?:هم|م)\s+\S+"),
            pat(Intent::Search, r"(?i)\bi\s+have\s+[0-9\u{6F0}-\u{6F9}]"),
            pat(Intent::Advice, r"(?i)(?:what|which)\s+\w+.*\b(?:should|better|best)\b"),
            pat(Intent::Advice, r"بهترین\s+\S+\s+برای"),
            pat(Intent::Calculate, r"(?i)how\s+much\s+can\s+i\s+\w+"),
            pat(Intent::Calculate, r"(?i)can\s+i\s+afford"),
            pat(Intent::Calculate, r"چقدر\s+می‌?تو(?:نم|انم)"),
        ];

        Self {
            money_rules,
            months_regex,
            loan_keywords: &["وام", "قرض", "تسهیلات", "اعتبار", "loan", "mortgage", "financing"],
            payment_keywords: &[
                "ماهی",
                "ماهانه",
                "قسط",
                "اقساط",
                "لیزینگ",
                "monthly",
                "installment",
                "per month",
                "a month",
            ],
            association_window: 50,
            gazetteer: GAZETTEER,
            fallback_phrases: &[
                "اگه نشد",
                "اگر نشد",
                "کدوم منطقه",
                "کدام منطقه",
                "if i can't",
                "if that doesn't work",
                "which area",
            ],
            rent_keywords: &["رهن", "اجاره", "rent"],
            full_deposit_phrases: &["رهن کامل", "full deposit"],
            purchase_keywords: &["خرید", "تهیه", "بگیرم", "بگیریم", "buy", "purchase"],
            lease_keywords: &["لیزینگ", "اقساط", "lease"],
            vehicle_keywords: &["ماشین", "خودرو", "اتومبیل", "car", "vehicle", "automobile"],
            electronics_keywords: &[
                "لپ تاپ",
                "لپتاپ",
                "موبایل",
                "گوشی",
                "تبلت",
                "laptop",
                "phone",
                "mobile",
                "tablet",
            ],
            intent_keywords,
            intent_patterns,
        }
    }
}

impl Default for PatternTables {
    fn default() -> Self {
        Self::new()
    }
}
