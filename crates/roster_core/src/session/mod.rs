//! Transactional session over one SQLite connection.
//!
//! # Responsibility
//! - Demarcate one store transaction (deferred `BEGIN`).
//! - Own the identity cache shared by every repository built on the session.
//! - Count issued statements so access patterns (N+1 vs fetch join) are
//!   observable.
//!
//! # Invariants
//! - A session that is neither committed nor rolled back rolls back on drop,
//!   including while unwinding from a panic.
//! - Store-level bulk statements must be followed by `clear()` before the
//!   next read.

use crate::db::{DbError, DbResult};
use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction};
use std::cell::{Cell, Ref, RefCell, RefMut};

mod cache;

pub use cache::EntityCache;

pub struct Session<'conn> {
    tx: Transaction<'conn>,
    cache: RefCell<EntityCache>,
    statements: Cell<u64>,
}

impl<'conn> Session<'conn> {
    /// Begins a deferred transaction on `conn`.
    ///
    /// The store write lock is only taken by the first write (or by a
    /// pessimistic-lock finder).
    pub fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let tx = conn.transaction()?;
        debug!("event=session_begin module=session status=ok");
        Ok(Self {
            tx,
            cache: RefCell::new(EntityCache::default()),
            statements: Cell::new(0),
        })
    }

    pub fn commit(self) -> DbResult<()> {
        let statements = self.statements.get();
        self.tx.commit()?;
        info!("event=session_commit module=session status=ok statements={statements}");
        Ok(())
    }

    pub fn rollback(self) -> DbResult<()> {
        let statements = self.statements.get();
        self.tx.rollback()?;
        info!("event=session_rollback module=session status=ok statements={statements}");
        Ok(())
    }

    /// Drops every cached entity; the next read goes to the store.
    pub fn clear(&self) {
        let mut cache = self.cache.borrow_mut();
        let evicted = cache.len();
        cache.clear();
        debug!("event=cache_clear module=session status=ok evicted={evicted}");
    }

    /// Number of statements issued through this session so far.
    pub fn statement_count(&self) -> u64 {
        self.statements.get()
    }

    pub fn is_member_cached(&self, id: i64) -> bool {
        self.cache.borrow().member(id).is_some()
    }

    pub fn is_team_cached(&self, id: i64) -> bool {
        self.cache.borrow().team(id).is_some()
    }

    /// Raw access to the transactional connection. Statements issued here
    /// bypass the cache and the statement counter.
    pub fn connection(&self) -> &Connection {
        &self.tx
    }

    pub(crate) fn cache(&self) -> Ref<'_, EntityCache> {
        self.cache.borrow()
    }

    pub(crate) fn cache_mut(&self) -> RefMut<'_, EntityCache> {
        self.cache.borrow_mut()
    }

    pub(crate) fn execute(&self, sql: &str, binds: &[Value]) -> rusqlite::Result<usize> {
        self.record(sql);
        self.tx.execute(sql, params_from_iter(binds.iter()))
    }

    pub(crate) fn query_count(&self, sql: &str, binds: &[Value]) -> rusqlite::Result<u64> {
        self.record(sql);
        let count: i64 =
            self.tx
                .query_row(sql, params_from_iter(binds.iter()), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub(crate) fn query_map<T, E, F>(&self, sql: &str, binds: &[Value], mut map: F) -> Result<Vec<T>, E>
    where
        E: From<rusqlite::Error>,
        F: FnMut(&Row<'_>) -> Result<T, E>,
    {
        self.record(sql);
        let mut stmt = self.tx.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(binds.iter()))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(map(row)?);
        }
        Ok(items)
    }

    pub(crate) fn last_insert_rowid(&self) -> i64 {
        self.tx.last_insert_rowid()
    }

    fn record(&self, sql: &str) {
        let count = self.statements.get() + 1;
        self.statements.set(count);
        let kind = sql
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        debug!("event=sql_exec module=session status=start kind={kind} seq={count}");
    }
}

/// Runs `work` inside a new session: commits on `Ok`, rolls back on `Err`.
pub fn transactional<T, E, F>(conn: &mut Connection, work: F) -> Result<T, E>
where
    E: From<DbError>,
    F: FnOnce(&Session<'_>) -> Result<T, E>,
{
    let session = Session::begin(conn)?;
    match work(&session) {
        Ok(value) => {
            session.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = session.rollback() {
                warn!(
                    "event=session_rollback module=session status=error error={rollback_err}"
                );
            }
            Err(err)
        }
    }
}
