use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::{env, str::FromStr};

use crate::config::ConfigError;
use crate::storage::errors::StoreError;

use super::types::{DataStore, PostgresDataStore, SqliteDataStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStoreKind {
    Sqlite,
    Postgres,
}

impl FromStr for DataStoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(ConfigError::Invalid {
                key: "GENERIC_DATA_STORE_TYPE".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Where the SQL store lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataStoreConfig {
    pub kind: DataStoreKind,
    pub url: String,
}

impl DataStoreConfig {
    pub fn new(kind: DataStoreKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }

    /// Read `GENERIC_DATA_STORE_TYPE` and `GENERIC_DATA_STORE_URL`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let kind = env::var("GENERIC_DATA_STORE_TYPE")
            .map_err(|_| ConfigError::Missing("GENERIC_DATA_STORE_TYPE".to_string()))?
            .parse()?;
        let url = env::var("GENERIC_DATA_STORE_URL")
            .map_err(|_| ConfigError::Missing("GENERIC_DATA_STORE_URL".to_string()))?;

        Ok(Self { kind, url })
    }

    /// Build a lazily connecting pool for the configured backend
    pub(crate) fn connect(&self) -> Result<Box<dyn DataStore>, StoreError> {
        tracing::info!(store_type = ?self.kind, "Initializing data store");

        let store: Box<dyn DataStore> = match self.kind {
            DataStoreKind::Sqlite => {
                let opts = SqliteConnectOptions::from_str(&self.url)?.create_if_missing(true);
                let pool_options = if self.url.contains(":memory:") || self.url.contains("mode=memory")
                {
                    // every connection to an in-memory database sees its own copy
                    SqlitePoolOptions::new()
                        .max_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None)
                } else {
                    SqlitePoolOptions::new()
                };
                Box::new(SqliteDataStore {
                    pool: pool_options.connect_lazy_with(opts),
                })
            }
            DataStoreKind::Postgres => Box::new(PostgresDataStore {
                pool: PgPoolOptions::new().connect_lazy(&self.url)?,
            }),
        };

        Ok(store)
    }
}
