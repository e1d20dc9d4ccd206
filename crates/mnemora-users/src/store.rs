use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::db::{row_to_prompt, row_to_system_instruction, row_to_user};
use crate::error::{Result, UserError};
use crate::types::{SystemInstruction, User, UserCustomPrompt};

const USER_SELECT: &str =
    "SELECT id, username, email, password_hash, is_active, last_login_at, last_login_ip, created_at FROM users";
const INSTRUCTION_SELECT: &str = "SELECT id, name, content, is_active, is_default, sort_order FROM system_instructions";
const PROMPT_SELECT: &str =
    "SELECT id, user_id, system_instruction_id, content, is_active, sort_order FROM user_custom_prompts";

/// Auth + admin CRUD store (A1/A2): users, system instructions, and
/// per-(user, character) custom prompts, all behind one connection.
pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    pub fn new(conn: Connection) -> Result<Self> {
        crate::db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ── Users (A1) ───────────────────────────────────────────────────────

    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(UserError::Validation("username, email, and password are required".to_string()));
        }
        let password_hash = hash_password(password)?;
        let user = User {
            id: Uuid::now_v7().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            is_active: true,
            last_login_at: None,
            last_login_ip: None,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, is_active, last_login_at, last_login_ip, created_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            params![
                user.id,
                user.username,
                user.email,
                user.password_hash,
                user.is_active as i64,
                user.last_login_at,
                user.last_login_ip,
                user.created_at,
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, Some(msg)) if err.code == rusqlite::ErrorCode::ConstraintViolation => {
                UserError::Validation(format!("username or email already taken: {msg}"))
            }
            other => UserError::Database(other),
        })?;
        Ok(user)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{USER_SELECT} WHERE username = ?1");
        let mut stmt = conn.prepare(&sql)?;
        Ok(stmt.query_row(params![username], row_to_user).optional()?)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{USER_SELECT} WHERE id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        Ok(stmt.query_row(params![id], row_to_user).optional()?)
    }

    pub fn record_login(&self, user_id: &str, ip: Option<&str>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE users SET last_login_at = ?1, last_login_ip = ?2 WHERE id = ?3",
            params![Utc::now(), ip, user_id],
        )?;
        Ok(())
    }

    // ── System instructions (A2) ────────────────────────────────────────

    /// Creating or updating an instruction as the default clears every
    /// other default in the same transaction, preserving §3's uniqueness
    /// invariant.
    pub fn create_system_instruction(
        &self,
        name: &str,
        content: &str,
        is_active: bool,
        is_default: bool,
        sort_order: i64,
    ) -> Result<SystemInstruction> {
        if content.trim().is_empty() {
            return Err(UserError::Validation("content must not be empty".to_string()));
        }
        let instruction = SystemInstruction {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            content: content.to_string(),
            is_active,
            is_default,
            sort_order,
        };

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if is_default {
            tx.execute("UPDATE system_instructions SET is_default = 0", [])?;
        }
        tx.execute(
            "INSERT INTO system_instructions (id, name, content, is_active, is_default, sort_order)
             VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                instruction.id,
                instruction.name,
                instruction.content,
                instruction.is_active as i64,
                instruction.is_default as i64,
                instruction.sort_order,
            ],
        )?;
        tx.commit()?;
        Ok(instruction)
    }

    pub fn update_system_instruction(&self, instruction: &SystemInstruction) -> Result<()> {
        if instruction.content.trim().is_empty() {
            return Err(UserError::Validation("content must not be empty".to_string()));
        }
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if instruction.is_default {
            tx.execute(
                "UPDATE system_instructions SET is_default = 0 WHERE id != ?1",
                params![instruction.id],
            )?;
        }
        tx.execute(
            "UPDATE system_instructions SET name=?2, content=?3, is_active=?4, is_default=?5, sort_order=?6
             WHERE id=?1",
            params![
                instruction.id,
                instruction.name,
                instruction.content,
                instruction.is_active as i64,
                instruction.is_default as i64,
                instruction.sort_order,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_system_instruction(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM system_instructions WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn get_system_instruction(&self, id: &str) -> Result<Option<SystemInstruction>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{INSTRUCTION_SELECT} WHERE id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        Ok(stmt.query_row(params![id], row_to_system_instruction).optional()?)
    }

    pub fn get_default_system_instruction(&self) -> Result<Option<SystemInstruction>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{INSTRUCTION_SELECT} WHERE is_default = 1 AND is_active = 1 LIMIT 1");
        let mut stmt = conn.prepare(&sql)?;
        Ok(stmt.query_row([], row_to_system_instruction).optional()?)
    }

    pub fn list_system_instructions(&self) -> Result<Vec<SystemInstruction>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{INSTRUCTION_SELECT} ORDER BY sort_order ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_system_instruction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ── Custom prompts (A2) ─────────────────────────────────────────────

    /// One row per `(user_id, system_instruction_id)`: upserts rather than
    /// appending, which is how the unique index in `db.rs` keeps the §3
    /// per-tuple-uniqueness invariant trivially true.
    pub fn upsert_prompt(
        &self,
        user_id: &str,
        system_instruction_id: &str,
        content: &str,
        is_active: bool,
        sort_order: i64,
    ) -> Result<UserCustomPrompt> {
        if content.trim().is_empty() {
            return Err(UserError::Validation("content must not be empty".to_string()));
        }
        let conn = self.conn.lock().unwrap();
        let id = Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO user_custom_prompts (id, user_id, system_instruction_id, content, is_active, sort_order)
             VALUES (?1,?2,?3,?4,?5,?6)
             ON CONFLICT(user_id, system_instruction_id) DO UPDATE SET
                content = excluded.content, is_active = excluded.is_active, sort_order = excluded.sort_order",
            params![id, user_id, system_instruction_id, content, is_active as i64, sort_order],
        )?;
        let sql = format!("{PROMPT_SELECT} WHERE user_id = ?1 AND system_instruction_id = ?2");
        let mut stmt = conn.prepare(&sql)?;
        Ok(stmt.query_row(params![user_id, system_instruction_id], row_to_prompt)?)
    }

    pub fn get_prompt(&self, user_id: &str, system_instruction_id: &str) -> Result<Option<UserCustomPrompt>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{PROMPT_SELECT} WHERE user_id = ?1 AND system_instruction_id = ?2 AND is_active = 1");
        let mut stmt = conn.prepare(&sql)?;
        Ok(stmt
            .query_row(params![user_id, system_instruction_id], row_to_prompt)
            .optional()?)
    }

    pub fn delete_prompt(&self, user_id: &str, system_instruction_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM user_custom_prompts WHERE user_id = ?1 AND system_instruction_id = ?2",
            params![user_id, system_instruction_id],
        )?;
        Ok(())
    }

    pub fn list_prompts_for_user(&self, user_id: &str) -> Result<Vec<UserCustomPrompt>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!("{PROMPT_SELECT} WHERE user_id = ?1 ORDER BY sort_order ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id], row_to_prompt)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_store() -> UserStore {
        UserStore::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn register_then_find_by_username_round_trips() {
        let store = fresh_store();
        let user = store.register("alice", "alice@example.com", "hunter2").unwrap();
        let found = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(found.is_active);
    }

    #[test]
    fn register_rejects_duplicate_username() {
        let store = fresh_store();
        store.register("alice", "alice@example.com", "hunter2").unwrap();
        let err = store.register("alice", "other@example.com", "hunter2").unwrap_err();
        assert!(matches!(err, UserError::Validation(_)));
    }

    #[test]
    fn setting_a_new_default_instruction_clears_the_old_one() {
        let store = fresh_store();
        let first = store
            .create_system_instruction("A", "be nice", true, true, 0)
            .unwrap();
        let second = store
            .create_system_instruction("B", "be mean", true, true, 1)
            .unwrap();

        let reloaded_first = store.get_system_instruction(&first.id).unwrap().unwrap();
        assert!(!reloaded_first.is_default);

        let default = store.get_default_system_instruction().unwrap().unwrap();
        assert_eq!(default.id, second.id);
    }

    #[test]
    fn upsert_prompt_replaces_rather_than_duplicates() {
        let store = fresh_store();
        store.upsert_prompt("u1", "s1", "first version", true, 0).unwrap();
        store.upsert_prompt("u1", "s1", "second version", true, 0).unwrap();

        let prompt = store.get_prompt("u1", "s1").unwrap().unwrap();
        assert_eq!(prompt.content, "second version");
        assert_eq!(store.list_prompts_for_user("u1").unwrap().len(), 1);
    }
}
