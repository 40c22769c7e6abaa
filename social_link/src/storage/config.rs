use std::{env, sync::LazyLock};

/// Table prefix from environment variable
pub(crate) static DB_TABLE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("DB_TABLE_PREFIX").unwrap_or_else(|_| "sl_".to_string()));

/// Users table name
pub(crate) static DB_TABLE_USERS: LazyLock<String> = LazyLock::new(|| {
    env::var("DB_TABLE_USERS").unwrap_or_else(|_| format!("{}{}", *DB_TABLE_PREFIX, "users"))
});

/// Linked profiles table name
pub(crate) static DB_TABLE_LINKED_PROFILES: LazyLock<String> = LazyLock::new(|| {
    env::var("DB_TABLE_LINKED_PROFILES")
        .unwrap_or_else(|_| format!("{}{}", *DB_TABLE_PREFIX, "linked_profiles"))
});
