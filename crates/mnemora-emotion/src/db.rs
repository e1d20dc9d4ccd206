use rusqlite::{Connection, Result};

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS character_emotion_states (
            user_id     TEXT NOT NULL,
            char_id     TEXT NOT NULL,
            valence     REAL NOT NULL DEFAULT 0,
            arousal     REAL NOT NULL DEFAULT 0,
            updated_at  TEXT NOT NULL,
            PRIMARY KEY (user_id, char_id)
        );",
    )
}
