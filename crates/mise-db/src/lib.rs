//! # mise-db
//!
//! libSQL persistence for Mise.
//!
//! Holds the restaurant platform's entity tables and the append-only
//! `audit_records` table. `MiseDb` implements both persistence seams of
//! `mise-audit`: [`mise_audit::EntityStore`] for the audited entities and
//! [`mise_audit::AuditStore`] for the records themselves.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) in local mode.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
mod store;

use error::DatabaseError;
use libsql::Builder;
use tracing::debug;

/// Central database handle.
///
/// Wraps a libSQL database and connection. Repository methods live in
/// [`repos`] as `impl MiseDb` blocks.
pub struct MiseDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl MiseDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on every open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let mise_db = Self { db, conn };
        mise_db.run_migrations().await?;
        debug!(path, "database opened");
        Ok(mise_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"usr-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use mise_core::catalog::EntityCatalog;
    use mise_core::ids::ALL_PREFIXES;

    use super::*;

    async fn test_db() -> MiseDb {
        MiseDb::open_local(":memory:").await.unwrap()
    }

    async fn table_exists(db: &MiseDb, table: &str) -> bool {
        let mut rows = db
            .conn()
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
            )
            .await
            .unwrap();
        rows.next().await.unwrap().is_some()
    }

    #[tokio::test]
    async fn open_local_creates_every_catalog_table() {
        let db = test_db().await;
        for schema in EntityCatalog::builtin().iter() {
            assert!(table_exists(&db, schema.table).await, "table '{}' should exist", schema.table);
        }
        assert!(table_exists(&db, "audit_records").await);
    }

    #[tokio::test]
    async fn catalog_columns_match_tables() {
        let db = test_db().await;
        for schema in EntityCatalog::builtin().iter() {
            let mut rows = db
                .conn()
                .query(&format!("PRAGMA table_info({})", schema.table), ())
                .await
                .unwrap();
            let mut columns = HashSet::new();
            while let Some(row) = rows.next().await.unwrap() {
                columns.insert(row.get::<String>(1).unwrap());
            }
            for name in schema.column_names() {
                assert!(columns.contains(name), "{}.{name} missing", schema.table);
            }
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn generate_id_format() {
        let db = test_db().await;
        for prefix in ALL_PREFIXES {
            let id = db.generate_id(prefix).await.unwrap();
            let (head, hex) = id.split_once('-').unwrap();
            assert_eq!(head, *prefix);
            assert_eq!(hex.len(), 8);
            assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[tokio::test]
    async fn generate_id_is_unique() {
        let db = test_db().await;
        let mut seen = HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(db.generate_id("aud").await.unwrap()));
        }
    }

    #[tokio::test]
    async fn foreign_keys_enabled() {
        let db = test_db().await;
        let mut rows = db.conn().query("PRAGMA foreign_keys", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }
}
