use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::profile::LinkedProfile;
use crate::storage::config::{DB_TABLE_LINKED_PROFILES, DB_TABLE_USERS};
use crate::storage::errors::StoreError;
use crate::storage::schema_validation::validate_postgres_table_schema;
use crate::userdb::{LocalUser, UserSearchField};

// PostgreSQL implementations
pub(super) async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), StoreError> {
    let users_table = DB_TABLE_USERS.as_str();
    let profiles_table = DB_TABLE_LINKED_PROFILES.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {users_table} (
            sequence_number BIGSERIAL PRIMARY KEY,
            id TEXT NOT NULL UNIQUE,
            account TEXT NOT NULL,
            label TEXT NOT NULL,
            email TEXT,
            metadata JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
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
            attributes JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
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

pub(super) async fn validate_tables_postgres(pool: &Pool<Postgres>) -> Result<(), StoreError> {
    let expected_user_columns = [
        ("sequence_number", "bigint"),
        ("id", "text"),
        ("account", "text"),
        ("label", "text"),
        ("email", "text"),
        ("metadata", "jsonb"),
        ("created_at", "timestamp with time zone"),
        ("updated_at", "timestamp with time zone"),
    ];
    validate_postgres_table_schema(
        pool,
        DB_TABLE_USERS.as_str(),
        &expected_user_columns,
        StoreError::Storage,
    )
    .await?;

    let expected_profile_columns = [
        ("id", "text"),
        ("user_id", "text"),
        ("provider", "text"),
        ("identifier", "text"),
        ("email", "text"),
        ("display_name", "text"),
        ("photo_url", "text"),
        ("attributes", "jsonb"),
        ("created_at", "timestamp with time zone"),
        ("updated_at", "timestamp with time zone"),
    ];
    validate_postgres_table_schema(
        pool,
        DB_TABLE_LINKED_PROFILES.as_str(),
        &expected_profile_columns,
        StoreError::Storage,
    )
    .await
}

pub(super) async fn find_user_by_field_postgres(
    pool: &Pool<Postgres>,
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
        SELECT * FROM {table_name} WHERE {column} = $1
        ORDER BY sequence_number ASC LIMIT 1
        "#
    ))
    .bind(value)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub(super) async fn get_linked_profile_postgres(
    pool: &Pool<Postgres>,
    provider: &str,
    identifier: &str,
) -> Result<Option<LinkedProfile>, StoreError> {
    let table_name = DB_TABLE_LINKED_PROFILES.as_str();

    let profile = sqlx::query_as::<_, LinkedProfile>(&format!(
        r#"
        SELECT * FROM {table_name}
        WHERE provider = $1 AND identifier = $2
        "#
    ))
    .bind(provider)
    .bind(identifier)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

pub(super) async fn list_linked_profiles_postgres(
    pool: &Pool<Postgres>,
    user_id: &str,
) -> Result<Vec<LinkedProfile>, StoreError> {
    let table_name = DB_TABLE_LINKED_PROFILES.as_str();

    let profiles = sqlx::query_as::<_, LinkedProfile>(&format!(
        r#"
        SELECT * FROM {table_name} WHERE user_id = $1
        ORDER BY created_at ASC, id ASC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(profiles)
}

pub(super) async fn insert_linked_profile_postgres(
    pool: &Pool<Postgres>,
    profile: LinkedProfile,
) -> Result<LinkedProfile, StoreError> {
    let mut tx = pool.begin().await?;
    let stored = insert_profile_row(&mut tx, &profile).await?;
    tx.commit().await?;
    Ok(stored)
}

pub(super) async fn insert_user_with_profile_postgres(
    pool: &Pool<Postgres>,
    user: LocalUser,
    profile: LinkedProfile,
) -> Result<(LocalUser, LinkedProfile), StoreError> {
    let users_table = DB_TABLE_USERS.as_str();

    let mut tx = pool.begin().await?;

    let stored_user = sqlx::query_as::<_, LocalUser>(&format!(
        r#"
        INSERT INTO {users_table} (id, account, label, email, metadata, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#
    ))
    .bind(&user.id)
    .bind(&user.account)
    .bind(&user.label)
    .bind(&user.email)
    .bind(&user.metadata)
    .bind(user.created_at)
    .bind(user.updated_at)
    .fetch_one(&mut *tx)
    .await?;

    let stored_profile = insert_profile_row(&mut tx, &profile).await?;

    tx.commit().await?;

    Ok((stored_user, stored_profile))
}

pub(super) async fn update_linked_profile_postgres(
    pool: &Pool<Postgres>,
    profile: LinkedProfile,
) -> Result<LinkedProfile, StoreError> {
    let table_name = DB_TABLE_LINKED_PROFILES.as_str();

    sqlx::query_as::<_, LinkedProfile>(&format!(
        r#"
        UPDATE {table_name} SET
            email = $1,
            display_name = $2,
            photo_url = $3,
            attributes = $4,
            updated_at = $5
        WHERE provider = $6 AND identifier = $7
        RETURNING *
        "#
    ))
    .bind(&profile.email)
    .bind(&profile.display_name)
    .bind(&profile.photo_url)
    .bind(&profile.attributes)
    .bind(Utc::now())
    .bind(&profile.provider)
    .bind(&profile.identifier)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        StoreError::NotFound(format!(
            "profile {}/{}",
            profile.provider, profile.identifier
        ))
    })
}

async fn insert_profile_row(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    profile: &LinkedProfile,
) -> Result<LinkedProfile, StoreError> {
    let table_name = DB_TABLE_LINKED_PROFILES.as_str();

    let stored = sqlx::query_as::<_, LinkedProfile>(&format!(
        r#"
        INSERT INTO {table_name}
        (id, user_id, provider, identifier, email, display_name, photo_url, attributes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#
    ))
    .bind(&profile.id)
    .bind(&profile.user_id)
    .bind(&profile.provider)
    .bind(&profile.identifier)
    .bind(&profile.email)
    .bind(&profile.display_name)
    .bind(&profile.photo_url)
    .bind(&profile.attributes)
    .bind(profile.created_at)
    .bind(profile.updated_at)
    .fetch_one(&mut **tx)
    .await?;

    Ok(stored)
}
