//! User account database operations.

use log::{debug, info};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::config::SeedUser;
use crate::models::{hash_password, User};

const USER_COLUMNS: &str =
    "id, username, hashed_password, full_name, role, is_active, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        hashed_password: row.get(2)?,
        full_name: row.get(3)?,
        role: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl Database {
    /// Insert a new user, returning its row ID.
    pub fn insert_user(&self, user: &User) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO users (username, hashed_password, full_name, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                user.username,
                user.hashed_password,
                user.full_name,
                user.role,
                user.is_active,
                user.created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("inserted user {} ({})", id, user.username);
        Ok(id)
    }

    /// Get a user by ID.
    pub fn get_user(&self, id: i64) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [id],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a user by login name.
    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
                [username],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all users by username.
    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS))?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Update profile fields of an existing user. The password is left alone.
    pub fn update_user(&self, user: &User) -> DbResult<bool> {
        let Some(id) = user.id else {
            return Ok(false);
        };
        let rows_affected = self.conn.execute(
            r#"
            UPDATE users SET
                username = ?2,
                full_name = ?3,
                role = ?4,
                is_active = ?5
            WHERE id = ?1
            "#,
            params![id, user.username, user.full_name, user.role, user.is_active],
        )?;
        Ok(rows_affected > 0)
    }

    /// Replace a user's password.
    pub fn set_user_password(&self, id: i64, password: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET hashed_password = ? WHERE id = ?",
            params![hash_password(password), id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Disable an account without removing it.
    pub fn deactivate_user(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("UPDATE users SET is_active = 0 WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Delete a user. Patients and visits they created keep a NULL creator.
    pub fn delete_user(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM users WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Create the configured accounts, or reset their passwords if they exist.
    pub fn seed_users(&self, seeds: &[SeedUser]) -> DbResult<()> {
        for seed in seeds {
            self.conn.execute(
                r#"
                INSERT INTO users (username, hashed_password, full_name, role)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(username) DO UPDATE SET
                    hashed_password = excluded.hashed_password
                "#,
                params![
                    seed.username,
                    hash_password(&seed.password),
                    seed.full_name,
                    seed.role,
                ],
            )?;
            info!("seeded user {} ({})", seed.username, seed.role);
        }
        Ok(())
    }
}
