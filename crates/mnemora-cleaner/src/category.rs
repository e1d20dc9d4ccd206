//! Step 3 of the cleaner pipeline: a deterministic, rule-based classifier
//! assigning a decay category. Kept out of the classifier LLM call so the
//! decay/GC behavior a memory gets is never at the mercy of model drift.

use mnemora_memory::{Entities, MemoryCategory};

const DESIRE_KEYWORDS: &[&str] = &[
    "want to", "wants to", "plan to", "plans to", "planning to", "intend to", "intends to",
    "hope to", "hopes to", "going to", "will try to", "想要", "打算", "计划", "希望", "想去", "准备",
];

const PREFERENCE_KEYWORDS: &[&str] = &[
    "likes", "like", "loves", "love", "prefers", "prefer", "enjoys", "enjoy", "hates", "hate",
    "dislikes", "dislike", "favorite", "favourite", "喜欢", "爱", "讨厌", "偏好", "最爱",
];

const STATE_OF_BEING_KEYWORDS: &[&str] = &[
    " is ", " am ", " are ", " was ", " were ", " has ", " have ", "是", "有", "在",
];

/// Rule priority: desire > preference > (fact if stative, event otherwise
/// when entities are present) > fact by default.
pub fn classify_category(summary: &str, entities: &Entities) -> MemoryCategory {
    let haystack = build_haystack(summary, entities);

    if contains_any(&haystack, DESIRE_KEYWORDS) {
        return MemoryCategory::Desire;
    }
    if contains_any(&haystack, PREFERENCE_KEYWORDS) {
        return MemoryCategory::Preference;
    }
    if !entities.is_empty() {
        if contains_any(&haystack, STATE_OF_BEING_KEYWORDS) {
            return MemoryCategory::Fact;
        }
        return MemoryCategory::Event;
    }
    MemoryCategory::Fact
}

fn build_haystack(summary: &str, entities: &Entities) -> String {
    let mut s = format!(" {} ", summary.to_lowercase());
    for e in entities.events.iter() {
        s.push_str(&format!(" {} ", e.to_lowercase()));
    }
    s
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| haystack.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities_with_event(event: &str) -> Entities {
        Entities {
            events: vec![event.to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn desire_wins_over_everything_else() {
        let cat = classify_category("The user wants to visit Japan next year", &Entities::default());
        assert_eq!(cat, MemoryCategory::Desire);
    }

    #[test]
    fn preference_detected_from_keyword() {
        let cat = classify_category("The user likes spicy food", &Entities::default());
        assert_eq!(cat, MemoryCategory::Preference);
    }

    #[test]
    fn event_when_entities_present_without_stative_verb() {
        let cat = classify_category("Met Alice at the conference yesterday", &entities_with_event("conference"));
        assert_eq!(cat, MemoryCategory::Event);
    }

    #[test]
    fn fact_when_entities_present_with_stative_verb() {
        let cat = classify_category("The user is a software engineer in Berlin", &entities_with_event("Berlin"));
        assert_eq!(cat, MemoryCategory::Fact);
    }

    #[test]
    fn defaults_to_fact_with_no_entities_and_no_keywords() {
        let cat = classify_category("General statement about the weather", &Entities::default());
        assert_eq!(cat, MemoryCategory::Fact);
    }

    #[test]
    fn bilingual_keyword_detects_chinese_desire() {
        let cat = classify_category("用户打算下个月去日本旅行", &Entities::default());
        assert_eq!(cat, MemoryCategory::Desire);
    }
}
