//! Hybrid retriever + reranker (C5): from a user's active memories, surface
//! the top-K most useful for answering a new message.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::similarity::{cosine_similarity, token_overlap_similarity, tokenize};
use crate::store::MemoryStore;
use crate::types::{ConversationMemory, MemoryCategory};

pub const DEFAULT_CANDIDATE_POOL: usize = 50;
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct RetrievalConfig {
    pub candidate_pool: usize,
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_pool: DEFAULT_CANDIDATE_POOL,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// A candidate after stage 2/3 scoring, carrying the breakdown for logging
/// and for the orchestrator's access-feedback loop.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub memory: ConversationMemory,
    pub vector: f64,
    pub entity: f64,
    pub importance: f64,
    pub combined: f64,
    pub decay: f64,
    pub boost: f64,
    pub emotion: f64,
    pub final_score: f64,
}

/// Stage 1+2+3: fetch candidates, score, rerank, return the top-K.
///
/// `query_embedding` is `None` when the gateway's embedding path is in
/// fallback or the caller chose not to embed; per-candidate vector scoring
/// then falls back to token overlap, and finally to `semantic_importance`
/// only when the token sets themselves are unusable (an empty query).
pub fn retrieve(
    store: &MemoryStore,
    user_id: &str,
    system_instruction_id: &str,
    query: &str,
    query_embedding: Option<&[f32]>,
    now: DateTime<Utc>,
    config: RetrievalConfig,
) -> Result<Vec<ScoredMemory>> {
    let candidates = store.candidates(user_id, system_instruction_id, config.candidate_pool)?;
    let query_tokens = tokenize(query);

    let mut scored: Vec<ScoredMemory> = candidates
        .into_iter()
        .map(|memory| score_candidate(&memory, query, &query_tokens, query_embedding, now))
        .collect();

    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.memory.importance_score.cmp(&a.memory.importance_score))
            .then_with(|| b.memory.created_at_timestamp.cmp(&a.memory.created_at_timestamp))
    });

    scored.truncate(config.top_k);
    Ok(scored)
}

fn score_candidate(
    memory: &ConversationMemory,
    query: &str,
    query_tokens: &std::collections::HashSet<String>,
    query_embedding: Option<&[f32]>,
    now: DateTime<Utc>,
) -> ScoredMemory {
    let vector = vector_score(memory, query, query_tokens, query_embedding);
    let entity = entity_score(query, query_tokens, memory, now);
    let importance = (memory.importance_score as f64 / 10.0).clamp(0.0, 1.0);

    let combined = 0.5 * vector + 0.3 * entity + 0.2 * importance;

    let decay = if memory.memory_category.decays() {
        let hours_since_created = (now - memory.created_at_timestamp)
            .num_seconds()
            .max(0) as f64
            / 3600.0;
        1.0 / (1.0 + hours_since_created / 24.0)
    } else {
        1.0
    };
    let boost = 1.0 + (memory.access_count.max(1) as f64).log10();
    let emotion = 1.0 + 0.5 * memory.emotional_weight;
    let final_score = combined * decay * boost * emotion;

    debug!(
        id = %memory.id,
        vector, entity, importance, combined, decay, boost, emotion, final_score,
        "scored retrieval candidate"
    );

    ScoredMemory {
        memory: memory.clone(),
        vector,
        entity,
        importance,
        combined,
        decay,
        boost,
        emotion,
        final_score,
    }
}

/// Fallback order: embedding cosine -> token-overlap Jaccard ->
/// `semantic_importance`, only falling further when the prior step is
/// structurally unusable. `semantic_importance` is never substituted as the
/// primary path (see REDESIGN FLAGS).
fn vector_score(
    memory: &ConversationMemory,
    query: &str,
    query_tokens: &std::collections::HashSet<String>,
    query_embedding: Option<&[f32]>,
) -> f64 {
    if let (Some(q), Some(m)) = (query_embedding, memory.embedding.as_deref()) {
        return cosine_similarity(q, m);
    }
    if !query_tokens.is_empty() && !tokenize(&memory.summary).is_empty() {
        return token_overlap_similarity(query, &memory.summary);
    }
    memory.semantic_importance.clamp(0.0, 1.0)
}

/// Each relative-time phrase mapped to the number of days it denotes,
/// tried in both Chinese and English. `+30d` tolerance is applied by the
/// caller.
const TIME_WINDOWS: &[(&[&str], i64)] = &[
    (&["today", "今天"], 0),
    (&["yesterday", "昨天"], 1),
    (&["this week", "本周", "这周", "这个星期"], 7),
    (&["last week", "上周", "上星期"], 14),
    (&["this month", "本月", "这个月"], 30),
    (&["last month", "上个月", "上月"], 60),
    (&["this year", "今年"], 365),
    (&["last year", "去年"], 730),
    (&["year before", "前年"], 1095),
];

const DATE_TOLERANCE_DAYS: i64 = 30;

fn entity_score(
    query: &str,
    query_tokens: &std::collections::HashSet<String>,
    memory: &ConversationMemory,
    now: DateTime<Utc>,
) -> f64 {
    let query_lower = query.to_lowercase();
    let mut total = 0.0;

    total += text_list_match_score(&query_lower, query_tokens, &memory.entities.locations, 0.4, 0.2);
    total += date_window_score(&query_lower, &memory.entities.dates, now);
    total += text_list_match_score(&query_lower, query_tokens, &memory.entities.people, 0.2, 0.1);
    total += text_list_match_score(&query_lower, query_tokens, &memory.entities.events, 0.1, 0.05);

    total.clamp(0.0, 1.0)
}

fn text_list_match_score(
    query_lower: &str,
    query_tokens: &std::collections::HashSet<String>,
    values: &[String],
    exact_score: f64,
    keyword_score: f64,
) -> f64 {
    let mut best: f64 = 0.0;
    for value in values {
        let value_lower = value.to_lowercase();
        if value_lower.is_empty() {
            continue;
        }
        if query_lower.contains(&value_lower) || value_lower.contains(query_lower.as_str()) {
            best = best.max(exact_score);
            continue;
        }
        let value_tokens = tokenize(&value_lower);
        if !value_tokens.is_disjoint(query_tokens) {
            best = best.max(keyword_score);
        }
    }
    best
}

fn date_window_score(query_lower: &str, dates: &[String], now: DateTime<Utc>) -> f64 {
    let window_days = TIME_WINDOWS
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|p| query_lower.contains(p)))
        .map(|(_, days)| *days);

    let Some(window_days) = window_days else {
        return 0.0;
    };

    for date in dates {
        let Some(parsed) = parse_flexible_date(date) else {
            continue;
        };
        let days_ago = (now.date_naive() - parsed).num_days();
        if (days_ago - window_days).abs() <= DATE_TOLERANCE_DAYS {
            return 0.3;
        }
    }
    0.0
}

fn parse_flexible_date(s: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entities, MemoryType};
    use rusqlite::Connection;

    fn make_memory(id: &str, category: MemoryCategory, created_days_ago: i64) -> ConversationMemory {
        let now = Utc::now();
        ConversationMemory {
            id: id.to_string(),
            user_id: "u1".to_string(),
            system_instruction_id: "s1".to_string(),
            summary: "上周去人民广场和小王喝下午茶".to_string(),
            key_points: vec!["下午茶".to_string()],
            original_content: None,
            entities: Entities {
                dates: vec![(now - chrono::Duration::days(14)).format("%Y-%m-%d").to_string()],
                locations: vec!["人民广场".to_string()],
                people: vec!["小王".to_string()],
                events: vec!["下午茶".to_string()],
            },
            embedding: None,
            memory_type: MemoryType::Active,
            memory_category: category,
            importance_score: 7,
            semantic_importance: 0.7,
            emotional_weight: 0.5,
            created_at_timestamp: now - chrono::Duration::days(created_days_ago),
            last_accessed: now - chrono::Duration::days(created_days_ago),
            access_count: 1,
            is_deleted: false,
            deleted_at: None,
            conversation_round: 6,
        }
    }

    #[test]
    fn location_query_scores_entity_at_least_point_four() {
        let mem = make_memory("m1", MemoryCategory::Event, 1);
        let tokens = tokenize("上周我去人民广场做了什么？");
        let score = entity_score("上周我去人民广场做了什么？", &tokens, &mem, Utc::now());
        assert!(score >= 0.4, "expected >= 0.4, got {score}");
    }

    #[test]
    fn decay_ranks_fresh_memory_above_stale_one() {
        let store = MemoryStore::new(Connection::open_in_memory().unwrap()).unwrap();
        let mut fresh = make_memory("fresh", MemoryCategory::Event, 0);
        fresh.created_at_timestamp = Utc::now() - chrono::Duration::hours(1);
        let mut stale = make_memory("stale", MemoryCategory::Event, 0);
        stale.created_at_timestamp = Utc::now() - chrono::Duration::hours(72);
        // identical vector similarity achieved via identical token overlap inputs
        store.insert(&fresh).unwrap();
        store.insert(&stale).unwrap();

        let results = retrieve(
            &store,
            "u1",
            "s1",
            "人民广场 下午茶",
            None,
            Utc::now(),
            RetrievalConfig::default(),
        )
        .unwrap();

        let fresh_rank = results.iter().position(|r| r.memory.id == "fresh").unwrap();
        let stale_rank = results.iter().position(|r| r.memory.id == "stale").unwrap();
        assert!(fresh_rank < stale_rank);
    }

    #[test]
    fn retrieval_is_deterministic() {
        let store = MemoryStore::new(Connection::open_in_memory().unwrap()).unwrap();
        store.insert(&make_memory("m1", MemoryCategory::Fact, 0)).unwrap();
        store.insert(&make_memory("m2", MemoryCategory::Event, 2)).unwrap();

        let a = retrieve(&store, "u1", "s1", "人民广场", None, Utc::now(), RetrievalConfig::default()).unwrap();
        let b = retrieve(&store, "u1", "s1", "人民广场", None, Utc::now(), RetrievalConfig::default()).unwrap();

        let ids_a: Vec<_> = a.iter().map(|r| r.memory.id.clone()).collect();
        let ids_b: Vec<_> = b.iter().map(|r| r.memory.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
