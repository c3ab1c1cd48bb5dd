pub mod db;
pub mod error;
pub mod migrate;
pub mod paths;
pub mod repo;

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = db::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        migrate::run_migrations(&self.conn)
    }

    pub fn schema_version(&self) -> Result<i64> {
        migrate::schema_version(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn users(&self) -> repo::UsersRepo<'_> {
        repo::UsersRepo::new(&self.conn)
    }

    pub fn sos(&self) -> repo::SosRepo<'_> {
        repo::SosRepo::new(&self.conn)
    }

    pub fn live_locations(&self) -> repo::LiveLocationsRepo<'_> {
        repo::LiveLocationsRepo::new(&self.conn)
    }

    pub fn locations(&self) -> repo::LocationsRepo<'_> {
        repo::LocationsRepo::new(&self.conn)
    }
}
