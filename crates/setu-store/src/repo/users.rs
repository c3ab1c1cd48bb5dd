use crate::error::{Result, StoreError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use setu_core::domain::{User, UserId};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct UserNew {
    pub username: String,
    pub phone: Option<String>,
}

pub struct UsersRepo<'a> {
    conn: &'a Connection,
}

impl<'a> UsersRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, now_utc: i64, input: UserNew) -> Result<User> {
        let user = User {
            id: UserId::new(),
            username: input.username.trim().to_string(),
            phone: input
                .phone
                .map(|phone| phone.trim().to_string())
                .filter(|phone| !phone.is_empty()),
            created_at: now_utc,
        };
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (id, username, phone, created_at) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.username,
                user.phone,
                user.created_at
            ],
        )?;
        Ok(user)
    }

    pub fn get(&self, id: UserId) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, phone, created_at FROM users WHERE id = ?1;",
                [id.to_string()],
                user_from_row,
            )
            .optional()?
            .transpose()
    }

    /// Registered phone for the requester, used when an SOS carries no contacts.
    pub fn find_phone(&self, id: UserId) -> Result<Option<String>> {
        let phone: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT phone FROM users WHERE id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(phone.flatten())
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<Result<User>> {
    let id: String = row.get(0)?;
    let username: String = row.get(1)?;
    let phone: Option<String> = row.get(2)?;
    let created_at: i64 = row.get(3)?;
    Ok(UserId::from_str(&id)
        .map_err(|_| StoreError::InvalidId(id.clone()))
        .map(|id| User {
            id,
            username,
            phone,
            created_at,
        }))
}
