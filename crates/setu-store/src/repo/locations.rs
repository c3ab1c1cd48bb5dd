use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate {
    pub id: i64,
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    pub recorded_at: i64,
}

#[derive(Debug, Clone)]
pub struct LocationUpdateNew {
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    pub recorded_at: i64,
}

pub struct LocationsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> LocationsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn record(&self, input: LocationUpdateNew) -> Result<LocationUpdate> {
        self.conn.execute(
            "INSERT INTO location_updates (user_id, lat, lng, recorded_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![input.user_id, input.lat, input.lng, input.recorded_at],
        )?;
        Ok(LocationUpdate {
            id: self.conn.last_insert_rowid(),
            user_id: input.user_id,
            lat: input.lat,
            lng: input.lng,
            recorded_at: input.recorded_at,
        })
    }

    pub fn latest_for_user(&self, user_id: &str) -> Result<Option<LocationUpdate>> {
        let update = self
            .conn
            .query_row(
                "SELECT id, user_id, lat, lng, recorded_at
                 FROM location_updates
                 WHERE user_id = ?1
                 ORDER BY recorded_at DESC, id DESC
                 LIMIT 1;",
                [user_id],
                |row| {
                    Ok(LocationUpdate {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        lat: row.get(2)?,
                        lng: row.get(3)?,
                        recorded_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(update)
    }
}
