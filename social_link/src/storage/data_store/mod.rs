mod config;
mod types;

pub use config::{DataStoreConfig, DataStoreKind};
pub use types::DataStore;

pub(crate) use types::{PostgresDataStore, SqliteDataStore};
