use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use setu_core::domain::LiveLocation;

/// Latest position per SOS, keyed by the id the sender reports under.
pub struct LiveLocationsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> LiveLocationsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, sos_id: &str) -> Result<Option<LiveLocation>> {
        let location = self
            .conn
            .query_row(
                "SELECT latitude, longitude, updated_at FROM live_locations WHERE sos_id = ?1;",
                [sos_id],
                |row| {
                    Ok(LiveLocation {
                        latitude: row.get(0)?,
                        longitude: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(location)
    }

    pub fn put(&self, sos_id: &str, location: &LiveLocation) -> Result<()> {
        self.conn.execute(
            "INSERT INTO live_locations (sos_id, latitude, longitude, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(sos_id) DO UPDATE SET
               latitude = excluded.latitude,
               longitude = excluded.longitude,
               updated_at = excluded.updated_at;",
            params![
                sos_id,
                location.latitude,
                location.longitude,
                location.updated_at
            ],
        )?;
        Ok(())
    }
}
