//! Schema migrations for the roster store.
//!
//! # Invariants
//! - Registry versions start at 1 and increase by one.
//! - Every pending migration runs in one transaction; a failure keeps none.
//! - The last applied version is written to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "members_and_teams",
    sql: include_str!("0001_init.sql"),
}];

/// Schema version this binary expects.
pub fn latest_version() -> u32 {
    registry_version(MIGRATIONS)
}

/// Reads the schema version recorded on `conn`; 0 for a fresh database.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings `conn` up to [`latest_version`]. Returns the versions applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<Vec<u32>> {
    apply_registry(conn, MIGRATIONS)
}

fn registry_version(registry: &[Migration]) -> u32 {
    registry.last().map_or(0, |migration| migration.version)
}

fn apply_registry(conn: &mut Connection, registry: &[Migration]) -> DbResult<Vec<u32>> {
    let found = current_user_version(conn)?;
    let supported = registry_version(registry);
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&Migration> = registry
        .iter()
        .filter(|migration| migration.version > found)
        .collect();
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let started_at = Instant::now();
    let tx = conn.transaction()?;
    for migration in &pending {
        let step = tx
            .execute_batch(migration.sql)
            .and_then(|()| {
                tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            });
        if let Err(source) = step {
            error!(
                "event=db_migrate module=db status=error version={} name={} error={source}",
                migration.version, migration.name
            );
            return Err(DbError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            });
        }
    }
    tx.commit()?;

    let applied: Vec<u32> = pending.iter().map(|migration| migration.version).collect();
    info!(
        "event=db_migrate module=db status=ok from={found} to={supported} steps={} duration_ms={}",
        applied.len(),
        started_at.elapsed().as_millis()
    );
    Ok(applied)
}
