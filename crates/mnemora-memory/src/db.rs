use rusqlite::{Connection, Result};

/// Initialise the `conversation_memories` schema. Safe to call on every
/// startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_conversation_memories_table(conn)
}

fn create_conversation_memories_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS conversation_memories (
            id                      TEXT PRIMARY KEY NOT NULL,
            user_id                 TEXT NOT NULL,
            system_instruction_id   TEXT NOT NULL,
            summary                 TEXT NOT NULL,
            key_points              TEXT NOT NULL DEFAULT '[]',   -- JSON array
            original_content        TEXT,
            entities                TEXT NOT NULL DEFAULT '{}',   -- JSON {dates,locations,people,events}
            embedding               TEXT,                          -- JSON array of f32, NULL if unavailable
            memory_type             TEXT NOT NULL,
            memory_category         TEXT NOT NULL,
            importance_score        INTEGER NOT NULL,
            semantic_importance     REAL NOT NULL,
            emotional_weight        REAL NOT NULL,
            created_at_timestamp    TEXT NOT NULL,
            last_accessed           TEXT NOT NULL,
            access_count            INTEGER NOT NULL DEFAULT 1,
            is_deleted              INTEGER NOT NULL DEFAULT 0,
            deleted_at              TEXT,
            conversation_round      INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_memories_scope_created
            ON conversation_memories (user_id, system_instruction_id, created_at_timestamp);
        CREATE INDEX IF NOT EXISTS idx_memories_scope_deleted
            ON conversation_memories (user_id, system_instruction_id, is_deleted);
        CREATE INDEX IF NOT EXISTS idx_memories_category
            ON conversation_memories (memory_category);
        CREATE INDEX IF NOT EXISTS idx_memories_last_accessed
            ON conversation_memories (last_accessed);",
    )
}
