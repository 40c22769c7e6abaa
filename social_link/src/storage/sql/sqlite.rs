use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::profile::LinkedProfile;
use crate::storage::config::{DB_TABLE_LINKED_PROFILES, DB_TABLE_USERS};
use crate::storage::errors::StoreError;
use crate::storage::schema_validation::validate_sqlite_table_schema;
use crate::userdb::{LocalUser, UserSearchField};

// SQLite implementations
pub(super) async fn create_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    let users_table = DB_TABLE_USERS.as_str();
    let profiles_table = DB_TABLE_LINKED_PROFILES.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {users_table} (
            sequence_number INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            account TEXT NOT NULL,
            label TEXT NOT NULL,
            email TEXT,
            metadata TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE INDEX IF NOT EXISTS idx_{}_email ON {users_table}(email)
        "#,
        users_table.replace('.', "_"),
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {profiles_table} (
            id TEXT PRIMARY KEY NOT NULL,
            user_id TEXT NOT NULL REFERENCES {users_table}(id),
            provider TEXT NOT NULL,
            identifier TEXT NOT NULL,
            email TEXT,
            display_name TEXT,
            photo_url TEXT,
            attributes TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            UNIQUE(provider, identifier)
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE INDEX IF NOT EXISTS idx_{}_user_id ON {profiles_table}(user_id)
        "#,
        profiles_table.replace('.', "_"),
    ))
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn validate_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    let expected_user_columns = [
        ("sequence_number", "INTEGER"),
        ("id", "TEXT"),
        ("account", "TEXT"),
        ("label", "TEXT"),
        ("email", "TEXT"),
        ("metadata", "TEXT"),
        ("created_at", "TIMESTAMP"),
        ("updated_at", "TIMESTAMP"),
    ];
    validate_sqlite_table_schema(
        pool,
        DB_TABLE_USERS.as_str(),
        &expected_user_columns,
        StoreError::Storage,
    )
    .await?;

    let expected_profile_columns = [
        ("id", "TEXT"),
        ("user_id", "TEXT"),
        ("provider", "TEXT"),
        ("identifier", "TEXT"),
        ("email", "TEXT"),
        ("display_name", "TEXT"),
        ("photo_url", "TEXT"),
        ("attributes", "TEXT"),
        ("created_at", "TIMESTAMP"),
        ("updated_at", "TIMESTAMP"),
    ];
    validate_sqlite_table_schema(
        pool,
        DB_TABLE_LINKED_PROFILES.as_str(),
        &expected_profile_columns,
        StoreError::Storage,
    )
    .await
}

pub(super) async fn find_user_by_field_sqlite(
    pool: &Pool<Sqlite>,
    field: &UserSearchField,
) -> Result<Option<LocalUser>, StoreError> {
    let table_name = DB_TABLE_USERS.as_str();

    let (column, value) = match field {
        UserSearchField::Id(id) => ("id", id.as_str()),
        UserSearchField::Email(email) => ("email", email.as_str()),
        UserSearchField::Account(account) => ("account", account.as_str()),
    };

    let user = sqlx::query_as::<_, LocalUser>(&format!(
        r#"
        SELECT * FROM {table_name} WHERE {column} = ?
        ORDER BY sequence_number ASC LIMIT 1
        "#
    ))
    .bind(value)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub(super) async fn get_linked_profile_sqlite(
    pool: &Pool<Sqlite>,
    provider: &str,
    identifier: &str,
) -> Result<Option<LinkedProfile>, StoreError> {
    let table_name = DB_TABLE_LINKED_PROFILES.as_str();

    let profile = sqlx::query_as::<_, LinkedProfile>(&format!(
        r#"
        SELECT * FROM {table_name}
        WHERE provider = ? AND identifier = ?
        "#
    ))
    .bind(provider)
    .bind(identifier)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

pub(super) async fn list_linked_profiles_sqlite(
    pool: &Pool<Sqlite>,
    user_id: &str,
) -> Result<Vec<LinkedProfile>, StoreError> {
    let table_name = DB_TABLE_LINKED_PROFILES.as_str();

    let profiles = sqlx::query_as::<_, LinkedProfile>(&format!(
        r#"
        SELECT * FROM {table_name} WHERE user_id = ?
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(profiles)
}

pub(super) async fn insert_linked_profile_sqlite(
    pool: &Pool<Sqlite>,
    profile: LinkedProfile,
) -> Result<LinkedProfile, StoreError> {
    let mut tx = pool.begin().await?;
    insert_profile_row(&mut tx, &profile).await?;
    let stored = fetch_profile_row(&mut tx, &profile.id).await?;
    tx.commit().await?;
    Ok(stored)
}

pub(super) async fn insert_user_with_profile_sqlite(
    pool: &Pool<Sqlite>,
    user: LocalUser,
    profile: LinkedProfile,
) -> Result<(LocalUser, LinkedProfile), StoreError> {
    let users_table = DB_TABLE_USERS.as_str();

    // Dropping the transaction on any error rolls back the user row
    let mut tx = pool.begin().await?;

    sqlx::query(&format!(
        r#"
        INSERT INTO {users_table} (id, account, label, email, metadata, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#
    ))
    .bind(&user.id)
    .bind(&user.account)
    .bind(&user.label)
    .bind(&user.email)
    .bind(serde_json::to_string(&user.metadata)?)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut *tx)
    .await?;

    insert_profile_row(&mut tx, &profile).await?;

    let stored_user = sqlx::query_as::<_, LocalUser>(&format!(
        r#"
        SELECT * FROM {users_table} WHERE id = ?
        "#
    ))
    .bind(&user.id)
    .fetch_one(&mut *tx)
    .await?;
    let stored_profile = fetch_profile_row(&mut tx, &profile.id).await?;

    tx.commit().await?;

    Ok((stored_user, stored_profile))
}

pub(super) async fn update_linked_profile_sqlite(
    pool: &Pool<Sqlite>,
    profile: LinkedProfile,
) -> Result<LinkedProfile, StoreError> {
    let table_name = DB_TABLE_LINKED_PROFILES.as_str();

    let result = sqlx::query(&format!(
        r#"
        UPDATE {table_name} SET
            email = ?,
            display_name = ?,
            photo_url = ?,
            attributes = ?,
            updated_at = ?
        WHERE provider = ? AND identifier = ?
        "#
    ))
    .bind(&profile.email)
    .bind(&profile.display_name)
    .bind(&profile.photo_url)
    .bind(serde_json::to_string(&profile.attributes)?)
    .bind(Utc::now())
    .bind(&profile.provider)
    .bind(&profile.identifier)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "profile {}/{}",
            profile.provider, profile.identifier
        )));
    }

    get_linked_profile_sqlite(pool, &profile.provider, &profile.identifier)
        .await?
        .ok_or_else(|| {
            StoreError::NotFound(format!(
                "profile {}/{}",
                profile.provider, profile.identifier
            ))
        })
}

async fn insert_profile_row(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    profile: &LinkedProfile,
) -> Result<(), StoreError> {
    let table_name = DB_TABLE_LINKED_PROFILES.as_str();

    sqlx::query(&format!(
        r#"
        INSERT INTO {table_name}
        (id, user_id, provider, identifier, email, display_name, photo_url, attributes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#
    ))
    .bind(&profile.id)
    .bind(&profile.user_id)
    .bind(&profile.provider)
    .bind(&profile.identifier)
    .bind(&profile.email)
    .bind(&profile.display_name)
    .bind(&profile.photo_url)
    .bind(serde_json::to_string(&profile.attributes)?)
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn fetch_profile_row(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    id: &str,
) -> Result<LinkedProfile, StoreError> {
    let table_name = DB_TABLE_LINKED_PROFILES.as_str();

    let profile = sqlx::query_as::<_, LinkedProfile>(&format!(
        r#"
        SELECT * FROM {table_name} WHERE id = ?
        "#
    ))
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(profile)
}
