//! Schema steps for the `storage_items` table.
//!
//! Step `n` of `SCHEMA_STEPS` brings a database to `user_version = n + 1`.
//! Steps are append-only.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

const SCHEMA_STEPS: &[&str] = &[include_str!("0001_storage_items.sql")];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.len() as u32
}

/// Brings `conn` up to `latest_version()`, all steps in one transaction.
/// Databases written by a newer build are rejected untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let stored: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let target = latest_version();
    if stored > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stored,
            latest_supported: target,
        });
    }
    if stored == target {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in (1..).zip(SCHEMA_STEPS).skip(stored as usize) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        debug!("event=db_migrate module=db status=step version={version}");
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={stored} to_version={target}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version};
    use rusqlite::Connection;

    #[test]
    fn second_run_is_a_no_op() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO storage_items (key, value) VALUES ('k', 'v')",
            [],
        )
        .unwrap();

        apply_migrations(&mut conn).unwrap();
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, latest_version());
        let value: String = conn
            .query_row("SELECT value FROM storage_items WHERE key = 'k'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(value, "v");
    }
}
