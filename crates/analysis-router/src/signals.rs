//! Keyword and phrase scanning shared by query routing and cross-reference detection.

use crate::registry::{EndpointSignature, Priority};

/// Score added per matched phrase; outweighs any realistic keyword count.
pub const PHRASE_WEIGHT: u32 = 100;

/// Signals an endpoint matched in a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalMatch {
    pub phrases: Vec<String>,
    pub keywords: Vec<String>,
}

impl SignalMatch {
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty() && self.keywords.is_empty()
    }

    pub fn has_phrase(&self) -> bool {
        !self.phrases.is_empty()
    }

    /// Phrases first, then keywords, each in signature order.
    pub fn signals(&self) -> Vec<String> {
        self.phrases
            .iter()
            .chain(self.keywords.iter())
            .cloned()
            .collect()
    }

    /// Aggregate score: zero without a match, otherwise
    /// `tier_offset + PHRASE_WEIGHT * phrases + keywords`.
    pub fn score(&self, priority: Priority) -> u32 {
        if self.is_empty() {
            return 0;
        }
        let phrases = self.phrases.len() as u32;
        let keywords = (self.keywords.len() as u32).min(PHRASE_WEIGHT - 1);
        tier_offset(priority) + PHRASE_WEIGHT * phrases.min(PHRASE_WEIGHT - 1) + keywords
    }
}

/// Fixed offset per priority tier. Tiers dominate every match count.
pub fn tier_offset(priority: Priority) -> u32 {
    match priority {
        Priority::Low => 0,
        Priority::Medium => PHRASE_WEIGHT * PHRASE_WEIGHT,
        Priority::High => 2 * PHRASE_WEIGHT * PHRASE_WEIGHT,
    }
}

/// Lower-case the query, turn punctuation into spaces and collapse whitespace.
///
/// Hyphens and apostrophes survive so signals like `what-if` still match.
pub fn normalize_query(query: &str) -> String {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Scan an already-normalized query for a signature's phrases and keywords.
pub fn scan(normalized_query: &str, signature: &EndpointSignature) -> SignalMatch {
    if normalized_query.is_empty() {
        return SignalMatch::default();
    }

    let phrases = signature
        .phrases
        .iter()
        .filter(|p| normalized_query.contains(p.as_str()))
        .cloned()
        .collect();
    let keywords = signature
        .keywords
        .iter()
        .filter(|k| normalized_query.contains(k.as_str()))
        .cloned()
        .collect();

    SignalMatch { phrases, keywords }
}
