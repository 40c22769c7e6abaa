use sqlx::{PgPool, SqlitePool};

use super::config::DataStoreKind;

#[derive(Clone, Debug)]
pub(crate) struct SqliteDataStore {
    pub(crate) pool: SqlitePool,
}

#[derive(Clone, Debug)]
pub(crate) struct PostgresDataStore {
    pub(crate) pool: PgPool,
}

/// A connection pool for one of the supported SQL backends.
///
/// Exactly one of `as_sqlite` / `as_postgres` returns a pool, matching `kind`.
pub trait DataStore: Send + Sync {
    fn kind(&self) -> DataStoreKind;
    fn as_sqlite(&self) -> Option<&SqlitePool>;
    fn as_postgres(&self) -> Option<&PgPool>;
}

impl DataStore for SqliteDataStore {
    fn kind(&self) -> DataStoreKind {
        DataStoreKind::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_postgres(&self) -> Option<&PgPool> {
        None
    }
}

impl DataStore for PostgresDataStore {
    fn kind(&self) -> DataStoreKind {
        DataStoreKind::Postgres
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_postgres(&self) -> Option<&PgPool> {
        Some(&self.pool)
    }
}
