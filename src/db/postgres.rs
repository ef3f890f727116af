// src/db/postgres.rs
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::models::{CredentialFilter, CredentialRecord, User};
use super::{DatabaseBackend, DbError, Transaction};

#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: Option<PgPool>,
}

fn row_to_user(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        password_hash: row.get("password_hash"),
        kdf_salt: row.get("kdf_salt"),
        created_at: row.get("created_at"),
    }
}

fn row_to_credential(row: &PgRow) -> CredentialRecord {
    CredentialRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        username: row.get("username"),
        secret: row.get("secret"),
        url: row.get("url"),
        category: row.get("category"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl PostgresBackend {
    pub fn new() -> Self {
        Self { pool: None }
    }

    // Helper to get the pool or return an error
    fn get_pool(&self) -> Result<&PgPool, DbError> {
        self.pool
            .as_ref()
            .ok_or(DbError::InitError("Database not initialized".into()))
    }
}

impl DatabaseBackend for PostgresBackend {
    async fn init(&mut self, connection_string: &str) -> Result<(), DbError> {
        log::info!("Initializing PostgreSQL database...");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;

        log::info!("Connected to PostgreSQL");

        // Ensure gen_random_uuid is available (PostgreSQL < 13)
        let result = sqlx::query("SELECT gen_random_uuid();")
            .fetch_optional(&pool)
            .await;

        if let Err(e) = result {
            log::warn!("gen_random_uuid() function not available: {}", e);
            sqlx::query("CREATE EXTENSION IF NOT EXISTS pgcrypto;")
                .execute(&pool)
                .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                email TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                kdf_salt TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            );
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                username TEXT NOT NULL,
                secret BYTEA NOT NULL,
                url TEXT,
                category TEXT NOT NULL DEFAULT 'other',
                notes TEXT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            );
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_credentials_user ON credentials(user_id);")
            .execute(&pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_credentials_user_category ON credentials(user_id, category);",
        )
        .execute(&pool)
        .await?;

        self.pool = Some(pool);
        Ok(())
    }

    async fn create_user(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
        kdf_salt: &str,
    ) -> Result<Uuid, DbError> {
        let pool = self.get_pool()?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (email, display_name, password_hash, kdf_salt)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .bind(kdf_salt)
        .fetch_one(pool)
        .await;

        match result {
            Ok(row) => Ok(row.get("id")),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DbError::EmailTaken(email.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let pool = self.get_pool()?;

        let row = sqlx::query(
            r#"
            SELECT id, email, display_name, password_hash, kdf_salt, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|row| row_to_user(&row)))
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<User, DbError> {
        let pool = self.get_pool()?;

        let row = sqlx::query(
            r#"
            SELECT id, email, display_name, password_hash, kdf_salt, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(row_to_user(&row))
    }

    async fn add_credential(
        &self,
        user_id: Uuid,
        name: &str,
        username: &str,
        encrypted_secret: &[u8],
        url: Option<&str>,
        category: &str,
        notes: Option<&str>,
    ) -> Result<Uuid, DbError> {
        let pool = self.get_pool()?;

        let credential_id: Uuid = sqlx::query(
            r#"
            INSERT INTO credentials (user_id, name, username, secret, url, category, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(username)
        .bind(encrypted_secret)
        .bind(url)
        .bind(category)
        .bind(notes)
        .fetch_one(pool)
        .await?
        .get("id");

        Ok(credential_id)
    }

    async fn get_credentials(
        &self,
        user_id: Uuid,
        filter: &CredentialFilter,
    ) -> Result<Vec<CredentialRecord>, DbError> {
        let pool = self.get_pool()?;

        let mut query = String::from(
            r#"
            SELECT id, user_id, name, username, secret, url, category, notes, created_at, updated_at
            FROM credentials
            WHERE user_id = $1
            "#,
        );

        let mut params: Vec<String> = Vec::new();
        let mut param_idx = 2;

        if let Some(category) = &filter.category {
            query.push_str(&format!(" AND category = ${}", param_idx));
            params.push(category.clone());
            param_idx += 1;
        }

        if let Some(search) = &filter.search {
            query.push_str(&format!(
                " AND (name ILIKE ${idx} OR username ILIKE ${idx} \
                 OR COALESCE(url, '') ILIKE ${idx} OR COALESCE(notes, '') ILIKE ${idx})",
                idx = param_idx
            ));
            params.push(format!("%{}%", search));
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut sqlx_query = sqlx::query(&query).bind(user_id);
        for param in &params {
            sqlx_query = sqlx_query.bind(param);
        }

        let rows = sqlx_query.fetch_all(pool).await?;

        Ok(rows.iter().map(row_to_credential).collect())
    }

    async fn get_credential_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<CredentialRecord, DbError> {
        let pool = self.get_pool()?;

        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, username, secret, url, category, notes, created_at, updated_at
            FROM credentials
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(row_to_credential(&row))
    }

    async fn update_credential(
        &self,
        user_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        username: Option<&str>,
        encrypted_secret: Option<&[u8]>,
        url: Option<&str>,
        category: Option<&str>,
        notes: Option<&str>,
    ) -> Result<(), DbError> {
        let pool = self.get_pool()?;

        let mut set_parts = Vec::new();
        let mut param_idx = 3; // $1 = id, $2 = user_id
        if name.is_some() {
            set_parts.push(format!("name = ${}", param_idx));
            param_idx += 1;
        }
        if username.is_some() {
            set_parts.push(format!("username = ${}", param_idx));
            param_idx += 1;
        }
        if encrypted_secret.is_some() {
            set_parts.push(format!("secret = ${}", param_idx));
            param_idx += 1;
        }
        if url.is_some() {
            set_parts.push(format!("url = ${}", param_idx));
            param_idx += 1;
        }
        if category.is_some() {
            set_parts.push(format!("category = ${}", param_idx));
            param_idx += 1;
        }
        if notes.is_some() {
            set_parts.push(format!("notes = ${}", param_idx));
        }
        set_parts.push("updated_at = NOW()".to_string());

        let query = format!(
            "UPDATE credentials SET {} WHERE id = $1 AND user_id = $2",
            set_parts.join(", ")
        );

        // Bind in the same order the SET clause was built
        let mut sqlx_query = sqlx::query(&query).bind(id).bind(user_id);
        if let Some(val) = name {
            sqlx_query = sqlx_query.bind(val);
        }
        if let Some(val) = username {
            sqlx_query = sqlx_query.bind(val);
        }
        if let Some(val) = encrypted_secret {
            sqlx_query = sqlx_query.bind(val);
        }
        if let Some(val) = url {
            sqlx_query = sqlx_query.bind(val);
        }
        if let Some(val) = category {
            sqlx_query = sqlx_query.bind(val);
        }
        if let Some(val) = notes {
            sqlx_query = sqlx_query.bind(val);
        }

        let result = sqlx_query.execute(pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn delete_credential(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        let pool = self.get_pool()?;

        let result = sqlx::query("DELETE FROM credentials WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn count_credentials(&self, user_id: Uuid) -> Result<usize, DbError> {
        let pool = self.get_pool()?;

        let row = sqlx::query("SELECT COUNT(*) as count FROM credentials WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }

    async fn begin_transaction<'t>(&self) -> Result<Transaction<'t>, DbError> {
        let pool = self.get_pool()?;
        let tx = pool.begin().await?;
        Ok(Transaction::Postgres(tx))
    }

    async fn commit_transaction<'t>(&self, tx: Transaction<'t>) -> Result<(), DbError> {
        match tx {
            Transaction::Postgres(tx) => {
                tx.commit().await?;
                Ok(())
            }
            _ => Err(DbError::TransactionError(
                "Invalid transaction type for PostgreSQL".into(),
            )),
        }
    }

    async fn rollback_transaction<'t>(&self, tx: Transaction<'t>) -> Result<(), DbError> {
        match tx {
            Transaction::Postgres(tx) => {
                tx.rollback().await?;
                Ok(())
            }
            _ => Err(DbError::TransactionError(
                "Invalid transaction type for PostgreSQL".into(),
            )),
        }
    }

    async fn update_credential_secret_in_transaction<'t>(
        &self,
        tx: &mut Transaction<'t>,
        id: Uuid,
        encrypted_secret: &[u8],
    ) -> Result<(), DbError> {
        let pg_tx = match tx {
            Transaction::Postgres(tx) => tx,
            _ => {
                return Err(DbError::TransactionError(
                    "Invalid transaction type for PostgreSQL".into(),
                ))
            }
        };

        let result =
            sqlx::query("UPDATE credentials SET secret = $1, updated_at = NOW() WHERE id = $2")
                .bind(encrypted_secret)
                .bind(id)
                .execute(&mut **pg_tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn update_user_password_in_transaction<'t>(
        &self,
        tx: &mut Transaction<'t>,
        user_id: Uuid,
        password_hash: &str,
        kdf_salt: &str,
    ) -> Result<(), DbError> {
        let pg_tx = match tx {
            Transaction::Postgres(tx) => tx,
            _ => {
                return Err(DbError::TransactionError(
                    "Invalid transaction type for PostgreSQL".into(),
                ))
            }
        };

        let result =
            sqlx::query("UPDATE users SET password_hash = $1, kdf_salt = $2 WHERE id = $3")
                .bind(password_hash)
                .bind(kdf_salt)
                .bind(user_id)
                .execute(&mut **pg_tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
