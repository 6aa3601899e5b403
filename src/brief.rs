//! Brief analysis: derives campaign metadata from free text.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::campaign::{CampaignContext, Urgency};

/// Derives a [`CampaignContext`] from a raw brief.
pub trait BriefAnalyzer: Send + Sync {
    fn analyze(&self, brief: &str) -> CampaignContext;
}

static URGENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(urgent|asap|immediately|this week|tomorrow)\b").expect("valid regex")
});

static SCHEDULED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(q[1-4]|next month|this month|summer|winter|spring|autumn|fall|holiday)\b")
        .expect("valid regex")
});

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9\-]+").expect("valid regex"));

const CAMPAIGN_TYPES: &[(&str, &[&str])] = &[
    ("product_launch", &["launch", "introduce", "debut", "unveil", "new product"]),
    ("rebrand", &["rebrand", "rebranding", "new identity", "reposition"]),
    ("event", &["event", "festival", "conference", "summit", "opening"]),
    ("seasonal_promotion", &["sale", "discount", "promotion", "black friday", "holiday"]),
    ("community", &["community", "nonprofit", "charity", "volunteer"]),
];

const TARGET_MARKETS: &[(&str, &[&str])] = &[
    ("gen_z", &["gen z", "genz", "students", "teens"]),
    ("millennials", &["millennial", "millennials", "young professionals"]),
    ("families", &["families", "family", "parents", "kids"]),
    ("b2b", &["b2b", "enterprise", "businesses", "smb"]),
    ("luxury", &["luxury", "premium", "high-end", "affluent"]),
    ("eco_conscious", &["eco", "sustainable", "green", "climate"]),
];

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "into", "our", "your", "their",
    "will", "should", "about", "have", "has", "are", "was", "were", "campaign", "launch",
    "want", "need", "make", "more", "than", "next", "over",
];

const MAX_KEYWORDS: usize = 8;

/// Keyword and pattern heuristics over the brief text.
#[derive(Debug, Default, Clone)]
pub struct KeywordBriefAnalyzer;

impl KeywordBriefAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn classify(text: &str, table: &[(&'static str, &[&str])], default: &str) -> String {
        table
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| text.contains(n)))
            .map(|(label, _)| label.to_string())
            .unwrap_or_else(|| default.to_string())
    }

    fn urgency(brief: &str) -> Urgency {
        if URGENT.is_match(brief) {
            Urgency::High
        } else if SCHEDULED.is_match(brief) {
            Urgency::Medium
        } else {
            Urgency::Normal
        }
    }

    /// Most frequent non-stopword terms, ties broken by first appearance.
    fn keywords(brief: &str) -> Vec<String> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        for (position, word) in WORD.find_iter(brief).enumerate() {
            let word = word.as_str().to_lowercase();
            if word.len() <= 3 || STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            counts.entry(word).or_insert((0, position)).0 += 1;
        }
        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
        ranked
            .into_iter()
            .take(MAX_KEYWORDS)
            .map(|(word, _)| word)
            .collect()
    }
}

impl BriefAnalyzer for KeywordBriefAnalyzer {
    fn analyze(&self, brief: &str) -> CampaignContext {
        let lower = brief.to_lowercase();
        CampaignContext {
            campaign_type: Self::classify(&lower, CAMPAIGN_TYPES, "brand_awareness"),
            urgency: Self::urgency(brief),
            target_market: Self::classify(&lower, TARGET_MARKETS, "general"),
            keywords: Self::keywords(brief),
            working_brief: brief.to_string(),
            ..Default::default()
        }
    }
}
