use rusqlite::{Connection, Result};

use crate::types::{SystemInstruction, User, UserCustomPrompt};

pub(crate) fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        last_login_at: row.get(5)?,
        last_login_ip: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub(crate) fn row_to_system_instruction(row: &rusqlite::Row<'_>) -> rusqlite::Result<SystemInstruction> {
    Ok(SystemInstruction {
        id: row.get(0)?,
        name: row.get(1)?,
        content: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
        is_default: row.get::<_, i64>(4)? != 0,
        sort_order: row.get(5)?,
    })
}

pub(crate) fn row_to_prompt(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserCustomPrompt> {
    Ok(UserCustomPrompt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        system_instruction_id: row.get(2)?,
        content: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
        sort_order: row.get(5)?,
    })
}

/// Idempotent: safe to call on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY NOT NULL,
            username        TEXT NOT NULL UNIQUE,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            is_active       INTEGER NOT NULL DEFAULT 1,
            last_login_at   TEXT,
            last_login_ip   TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS system_instructions (
            id          TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            content     TEXT NOT NULL,
            is_active   INTEGER NOT NULL DEFAULT 1,
            is_default  INTEGER NOT NULL DEFAULT 0,
            sort_order  INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS user_custom_prompts (
            id                      TEXT PRIMARY KEY NOT NULL,
            user_id                 TEXT NOT NULL REFERENCES users(id),
            system_instruction_id   TEXT NOT NULL REFERENCES system_instructions(id),
            content                 TEXT NOT NULL,
            is_active               INTEGER NOT NULL DEFAULT 1,
            sort_order              INTEGER NOT NULL DEFAULT 0
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_prompts_user_instruction
            ON user_custom_prompts (user_id, system_instruction_id);",
    )
}
