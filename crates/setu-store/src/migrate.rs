use crate::error::{Result, StoreError};
use rusqlite::{Connection, OptionalExtension};

const SCHEMA_TABLE: &str = "setu_schema";

/// Applied in order; a migration's version is its position plus one.
const MIGRATIONS: &[&str] = &[include_str!("../migrations/001_init.sql")];

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {SCHEMA_TABLE} (version INTEGER NOT NULL);"
    ))?;

    let current = match read_version(&tx)? {
        Some(version) => version,
        None => {
            tx.execute(&format!("INSERT INTO {SCHEMA_TABLE} (version) VALUES (0);"), [])?;
            0
        }
    };
    let latest = MIGRATIONS.len() as i64;
    if current > latest {
        return Err(StoreError::Migration(format!(
            "database is at version {current}, this build knows {latest}"
        )));
    }

    for (version, sql) in (1_i64..).zip(MIGRATIONS.iter()).skip(current as usize) {
        tx.execute_batch(sql)?;
        let updated = tx.execute(&format!("UPDATE {SCHEMA_TABLE} SET version = ?1;"), [version])?;
        if updated != 1 {
            return Err(StoreError::Migration(format!(
                "expected one schema row, updated {updated}"
            )));
        }
    }

    tx.commit()?;
    Ok(())
}

/// Zero for a database that has never been migrated.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [SCHEMA_TABLE],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(0);
    }
    Ok(read_version(conn)?.unwrap_or(0))
}

fn read_version(conn: &Connection) -> Result<Option<i64>> {
    Ok(conn
        .query_row(
            &format!("SELECT version FROM {SCHEMA_TABLE} LIMIT 1;"),
            [],
            |row| row.get(0),
        )
        .optional()?)
}
