mod config;
mod data_store;
mod errors;
mod memory;
mod schema_validation;
mod sql;
mod traits;

pub use data_store::{DataStore, DataStoreConfig, DataStoreKind};
pub use errors::StoreError;
pub use memory::MemoryStore;
pub use sql::SqlStore;
pub use traits::IdentityStore;
