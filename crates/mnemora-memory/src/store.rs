use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{MemoryError, Result};
use crate::types::{ConversationMemory, Entities, MemoryCategory, MemoryType};

const SELECT_COLUMNS: &str = "id, user_id, system_instruction_id, summary, key_points, \
     original_content, entities, embedding, memory_type, memory_category, importance_score, \
     semantic_importance, emotional_weight, created_at_timestamp, last_accessed, access_count, \
     is_deleted, deleted_at, conversation_round";

fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationMemory> {
    let key_points_json: String = row.get(4)?;
    let entities_json: String = row.get(6)?;
    let embedding_json: Option<String> = row.get(7)?;
    let memory_type: String = row.get(8)?;
    let memory_category: String = row.get(9)?;

    Ok(ConversationMemory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        system_instruction_id: row.get(2)?,
        summary: row.get(3)?,
        key_points: serde_json::from_str(&key_points_json).unwrap_or_default(),
        original_content: row.get(5)?,
        entities: serde_json::from_str::<Entities>(&entities_json).unwrap_or_default(),
        embedding: embedding_json.and_then(|j| serde_json::from_str(&j).ok()),
        memory_type: memory_type.parse().unwrap_or(MemoryType::Active),
        memory_category: memory_category.parse().unwrap_or(MemoryCategory::Fact),
        importance_score: row.get(10)?,
        semantic_importance: row.get(11)?,
        emotional_weight: row.get(12)?,
        created_at_timestamp: row.get(13)?,
        last_accessed: row.get(14)?,
        access_count: row.get(15)?,
        is_deleted: row.get::<_, i64>(16)? != 0,
        deleted_at: row.get(17)?,
        conversation_round: row.get(18)?,
    })
}

/// The memory store (C2): CRUD + query over `ConversationMemory` rows,
/// soft-delete, and access-stat updates. Every operation runs inside a
/// short-lived transaction; a failed commit rolls back and surfaces as
/// [`MemoryError::Database`].
pub struct MemoryStore {
    conn: Mutex<Connection>,
}

impl MemoryStore {
    pub fn new(conn: Connection) -> Result<Self> {
        crate::db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Single write. Never updates existing rows.
    pub fn insert(&self, memory: &ConversationMemory) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let key_points_json = serde_json::to_string(&memory.key_points)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;
        let entities_json = serde_json::to_string(&memory.entities)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;
        let embedding_json = memory
            .embedding
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO conversation_memories (
                id, user_id, system_instruction_id, summary, key_points, original_content,
                entities, embedding, memory_type, memory_category, importance_score,
                semantic_importance, emotional_weight, created_at_timestamp, last_accessed,
                access_count, is_deleted, deleted_at, conversation_round
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)",
            params![
                memory.id,
                memory.user_id,
                memory.system_instruction_id,
                memory.summary,
                key_points_json,
                memory.original_content,
                entities_json,
                embedding_json,
                memory.memory_type.to_string(),
                memory.memory_category.to_string(),
                memory.importance_score,
                memory.semantic_importance,
                memory.emotional_weight,
                memory.created_at_timestamp,
                memory.last_accessed,
                memory.access_count,
                memory.is_deleted as i64,
                memory.deleted_at,
                memory.conversation_round,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Non-deleted (unless `include_deleted`) memories for a user, optionally
    /// scoped to one system instruction, ordered `importance_score desc,
    /// created_at desc`.
    pub fn list(
        &self,
        user_id: &str,
        system_instruction_id: Option<&str>,
        include_deleted: bool,
    ) -> Result<Vec<ConversationMemory>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM conversation_memories
             WHERE user_id = ?1
               AND (?2 IS NULL OR system_instruction_id = ?2)
               AND (?3 = 1 OR is_deleted = 0)
             ORDER BY importance_score DESC, created_at_timestamp DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![user_id, system_instruction_id, include_deleted as i64],
                row_to_memory,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Most recent `n` non-deleted memories for `(user_id, system_instruction_id)`.
    pub fn recent(
        &self,
        user_id: &str,
        system_instruction_id: &str,
        n: usize,
    ) -> Result<Vec<ConversationMemory>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM conversation_memories
             WHERE user_id = ?1 AND system_instruction_id = ?2 AND is_deleted = 0
             ORDER BY created_at_timestamp DESC LIMIT ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id, system_instruction_id, n as i64], row_to_memory)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Oversampled candidate set for retrieval: top `n` non-deleted
    /// memories ordered `importance_score desc`.
    pub fn candidates(
        &self,
        user_id: &str,
        system_instruction_id: &str,
        n: usize,
    ) -> Result<Vec<ConversationMemory>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM conversation_memories
             WHERE user_id = ?1 AND system_instruction_id = ?2 AND is_deleted = 0
             ORDER BY importance_score DESC LIMIT ?3"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id, system_instruction_id, n as i64], row_to_memory)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Idempotent soft-delete, scoped to the owning user.
    pub fn soft_delete(&self, id: &str, user_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE conversation_memories SET is_deleted = 1, deleted_at = ?1
             WHERE id = ?2 AND user_id = ?3 AND is_deleted = 0",
            params![now, id, user_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Single round-trip: bumps `last_accessed` and `access_count` for every
    /// id in one statement.
    pub fn bump_access(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        let placeholders = ids.iter().enumerate().map(|(i, _)| format!("?{}", i + 2)).collect::<Vec<_>>().join(",");
        let sql = format!(
            "UPDATE conversation_memories SET last_accessed = ?1, access_count = access_count + 1
             WHERE id IN ({placeholders}) AND is_deleted = 0"
        );
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            let mut bound: Vec<&dyn rusqlite::ToSql> = vec![&now];
            bound.extend(ids.iter().map(|id| id as &dyn rusqlite::ToSql));
            stmt.execute(bound.as_slice())?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Fetch a single memory by id, scoped to the owning user (ignores
    /// soft-deleted rows).
    pub fn get(&self, id: &str, user_id: &str) -> Result<Option<ConversationMemory>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM conversation_memories
             WHERE id = ?1 AND user_id = ?2 AND is_deleted = 0"
        );
        let mut stmt = conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![id, user_id], row_to_memory)
            .optional()?)
    }

    /// Batch soft-delete everything created more than `months` months ago
    /// for `(user_id, system_instruction_id?)`. Used by both the rolling
    /// soft-delete the chat orchestrator runs after every cleaning round and
    /// the ad-hoc `/memory/clear-old` endpoint.
    pub fn cutoff_delete(
        &self,
        user_id: &str,
        system_instruction_id: Option<&str>,
        months: i64,
    ) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let cutoff = Utc::now() - chrono::Duration::days(months * 30);
        let tx = conn.unchecked_transaction()?;
        let n = tx.execute(
            "UPDATE conversation_memories SET is_deleted = 1, deleted_at = ?1
             WHERE user_id = ?2
               AND (?3 IS NULL OR system_instruction_id = ?3)
               AND is_deleted = 0
               AND created_at_timestamp < ?4",
            params![Utc::now(), user_id, system_instruction_id, cutoff],
        )?;
        tx.commit()?;
        if n > 0 {
            debug!(user_id, months, n, "rolling cutoff soft-delete");
        }
        Ok(n)
    }

    /// Daily GC sweep (C7): soft-delete every active row matching R1 or R2,
    /// across all users/characters, in a single transaction.
    ///
    /// R1 (short-term trash): `category in {event, desire} and
    /// days_since_access > 7 and emotional_weight < 0.5 and importance_score < 5`.
    /// R2 (cold data): `days_since_access > 30 and access_count < 3 and
    /// importance_score < 5`, evaluated over every category.
    pub fn gc_sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        let n = tx.execute(
            "UPDATE conversation_memories SET is_deleted = 1, deleted_at = ?1
             WHERE is_deleted = 0
               AND (
                    (memory_category IN ('event', 'desire')
                        AND (julianday(?1) - julianday(last_accessed)) > 7
                        AND emotional_weight < 0.5
                        AND importance_score < 5)
                 OR ((julianday(?1) - julianday(last_accessed)) > 30
                        AND access_count < 3
                        AND importance_score < 5)
               )",
            params![now],
        )?;
        tx.commit()?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entities;

    fn sample(id: &str, category: MemoryCategory, importance: i32) -> ConversationMemory {
        let now = Utc::now();
        ConversationMemory {
            id: id.to_string(),
            user_id: "u1".to_string(),
            system_instruction_id: "s1".to_string(),
            summary: "met alice at the park".to_string(),
            key_points: vec!["met alice".to_string()],
            original_content: None,
            entities: Entities::default(),
            embedding: None,
            memory_type: MemoryType::Active,
            memory_category: category,
            importance_score: importance,
            semantic_importance: ConversationMemory::derive_semantic_importance(importance),
            emotional_weight: 0.5,
            created_at_timestamp: now,
            last_accessed: now,
            access_count: 1,
            is_deleted: false,
            deleted_at: None,
            conversation_round: 6,
        }
    }

    fn fresh_store() -> MemoryStore {
        MemoryStore::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn insert_then_list_round_trips() {
        let store = fresh_store();
        store.insert(&sample("m1", MemoryCategory::Fact, 7)).unwrap();
        let rows = store.list("u1", None, false).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].summary, "met alice at the park");
    }

    #[test]
    fn soft_delete_excludes_from_list_and_is_idempotent() {
        let store = fresh_store();
        store.insert(&sample("m1", MemoryCategory::Fact, 7)).unwrap();
        store.soft_delete("m1", "u1").unwrap();
        assert!(store.list("u1", None, false).unwrap().is_empty());
        assert_eq!(store.list("u1", None, true).unwrap().len(), 1);
        // idempotent: second call does not error
        store.soft_delete("m1", "u1").unwrap();
    }

    #[test]
    fn bump_access_increments_count_and_leaves_deleted_rows_untouched() {
        let store = fresh_store();
        store.insert(&sample("m1", MemoryCategory::Fact, 7)).unwrap();
        store.insert(&sample("m2", MemoryCategory::Fact, 7)).unwrap();
        store.soft_delete("m2", "u1").unwrap();

        store
            .bump_access(&["m1".to_string(), "m2".to_string()])
            .unwrap();

        let m1 = store.get("m1", "u1").unwrap().unwrap();
        assert_eq!(m1.access_count, 2);

        let all = store.list("u1", None, true).unwrap();
        let m2 = all.iter().find(|m| m.id == "m2").unwrap();
        assert_eq!(m2.access_count, 1);
    }

    #[test]
    fn gc_sweep_spares_fact_and_preference_under_r1() {
        let store = fresh_store();
        let mut decaying = sample("m1", MemoryCategory::Event, 3);
        decaying.last_accessed = Utc::now() - chrono::Duration::days(8);
        decaying.emotional_weight = 0.3;
        store.insert(&decaying).unwrap();

        let mut non_decaying = sample("m2", MemoryCategory::Fact, 3);
        non_decaying.last_accessed = Utc::now() - chrono::Duration::days(8);
        non_decaying.emotional_weight = 0.3;
        store.insert(&non_decaying).unwrap();

        let n = store.gc_sweep(Utc::now()).unwrap();
        assert_eq!(n, 1);

        let remaining = store.list("u1", None, false).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "m2");
    }
}
