// src/classify.rs
//! Keyword classifier: maps listing text to a priority tier plus the
//! keywords that matched. Pure and deterministic; recomputed every run so
//! keyword-list edits retroactively reclassify old listings.

use serde::Serialize;

use crate::config::KeywordConfig;

/// Priority tier of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    None,
    Medium,
    High,
}

/// Classification outcome. `matched_keywords` holds the keywords from the
/// tier that determined the priority, in configured order (display only,
/// not a score).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub priority: Priority,
    pub matched_keywords: Vec<String>,
}

impl Classification {
    pub fn is_relevant(&self) -> bool {
        self.priority != Priority::None
    }
}

/// Case-insensitive substring match of `text` against both keyword tiers.
/// High wins over medium; no match yields `Priority::None` with an empty
/// keyword list.
pub fn classify(text: &str, keywords: &KeywordConfig) -> Classification {
    let haystack = text.to_lowercase();

    let high = matched_in_tier(&haystack, &keywords.high);
    if !high.is_empty() {
        return Classification {
            priority: Priority::High,
            matched_keywords: high,
        };
    }

    let medium = matched_in_tier(&haystack, &keywords.medium);
    if !medium.is_empty() {
        return Classification {
            priority: Priority::Medium,
            matched_keywords: medium,
        };
    }

    Classification {
        priority: Priority::None,
        matched_keywords: Vec::new(),
    }
}

fn matched_in_tier(haystack: &str, tier: &[String]) -> Vec<String> {
    tier.iter()
        .filter(|kw| !kw.is_empty() && haystack.contains(kw.to_lowercase().as_str()))
        .cloned()
        .collect()
}
