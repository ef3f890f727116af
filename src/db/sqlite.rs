// src/db/sqlite.rs
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::models::{CredentialFilter, CredentialRecord, User};
use super::{DatabaseBackend, DbError, Transaction};

#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: Option<SqlitePool>,
}

fn parse_uuid(value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::SqlxError(format!("Invalid UUID: {}", e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::SqlxError(format!("Invalid datetime: {}", e)))
}

fn row_to_user(row: &SqliteRow) -> Result<User, DbError> {
    let id_str: String = row.get("id");
    let created_at_str: String = row.get("created_at");

    Ok(User {
        id: parse_uuid(&id_str)?,
        email: row.get("email"),
        display_name: row.get("display_name"),
        password_hash: row.get("password_hash"),
        kdf_salt: row.get("kdf_salt"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

fn row_to_credential(row: &SqliteRow) -> Result<CredentialRecord, DbError> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(CredentialRecord {
        id: parse_uuid(&id_str)?,
        user_id: parse_uuid(&user_id_str)?,
        name: row.get("name"),
        username: row.get("username"),
        secret: row.get("secret"),
        url: row.get("url"),
        category: row.get("category"),
        notes: row.get("notes"),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

impl SqliteBackend {
    pub fn new() -> Self {
        Self { pool: None }
    }

    // Helper to get the pool or return an error
    fn get_pool(&self) -> Result<&SqlitePool, DbError> {
        self.pool
            .as_ref()
            .ok_or(DbError::InitError("Database not initialized".into()))
    }
}

impl DatabaseBackend for SqliteBackend {
    async fn init(&mut self, connection_string: &str) -> Result<(), DbError> {
        // Accept both "sqlite:path" and a bare path
        let db_path = connection_string
            .strip_prefix("sqlite:")
            .unwrap_or(connection_string);

        // Create the database directory if it doesn't exist
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbError::InitError(format!("Failed to create database directory: {}", e))
                })?;
            }
        }

        log::info!("Initializing SQLite database at: {}", db_path);

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .map_err(|e| DbError::InitError(format!("Invalid SQLite path: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        // Enable foreign keys
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await?;

        // Create users table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                kdf_salt TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await?;

        // Create credentials table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                username TEXT NOT NULL,
                secret BLOB NOT NULL,
                url TEXT,
                category TEXT NOT NULL DEFAULT 'other',
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&pool)
        .await?;

        // Create indexes
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

        let user_id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name, password_hash, kdf_salt, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id.to_string())
        .bind(email)
        .bind(display_name)
        .bind(password_hash)
        .bind(kdf_salt)
        .bind(&now_str)
        .execute(pool)
        .await;

        match result {
            Ok(_) => Ok(user_id),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
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
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<User, DbError> {
        let pool = self.get_pool()?;

        let row = sqlx::query(
            r#"
            SELECT id, email, display_name, password_hash, kdf_salt, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

        row_to_user(&row)
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

        let credential_id = Uuid::new_v4();
        let now_str = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO credentials (id, user_id, name, username, secret, url, category, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(credential_id.to_string())
        .bind(user_id.to_string())
        .bind(name)
        .bind(username)
        .bind(encrypted_secret)
        .bind(url)
        .bind(category)
        .bind(notes)
        .bind(&now_str)
        .bind(&now_str)
        .execute(pool)
        .await?;

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
            WHERE user_id = ?
            "#,
        );

        let mut params: Vec<String> = Vec::new();

        if let Some(category) = &filter.category {
            query.push_str(" AND category = ?");
            params.push(category.clone());
        }

        if let Some(search) = &filter.search {
            query.push_str(
                " AND (LOWER(name) LIKE ? OR LOWER(username) LIKE ? \
                 OR LOWER(COALESCE(url, '')) LIKE ? OR LOWER(COALESCE(notes, '')) LIKE ?)",
            );
            let pattern = format!("%{}%", search.to_lowercase());
            for _ in 0..4 {
                params.push(pattern.clone());
            }
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut sqlx_query = sqlx::query(&query).bind(user_id.to_string());
        for param in &params {
            sqlx_query = sqlx_query.bind(param);
        }

        let rows = sqlx_query.fetch_all(pool).await?;

        let mut credentials = Vec::with_capacity(rows.len());
        for row in &rows {
            credentials.push(row_to_credential(row)?);
        }

        Ok(credentials)
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
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

        row_to_credential(&row)
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

        let now_str = Utc::now().to_rfc3339();

        let mut set_parts = Vec::new();
        if name.is_some() {
            set_parts.push("name = ?");
        }
        if username.is_some() {
            set_parts.push("username = ?");
        }
        if encrypted_secret.is_some() {
            set_parts.push("secret = ?");
        }
        if url.is_some() {
            set_parts.push("url = ?");
        }
        if category.is_some() {
            set_parts.push("category = ?");
        }
        if notes.is_some() {
            set_parts.push("notes = ?");
        }
        set_parts.push("updated_at = ?");

        let query = format!(
            "UPDATE credentials SET {} WHERE id = ? AND user_id = ?",
            set_parts.join(", ")
        );

        // Bind in the same order the SET clause was built
        let mut sqlx_query = sqlx::query(&query);
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
        sqlx_query = sqlx_query
            .bind(&now_str)
            .bind(id.to_string())
            .bind(user_id.to_string());

        let result = sqlx_query.execute(pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn delete_credential(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        let pool = self.get_pool()?;

        let result = sqlx::query("DELETE FROM credentials WHERE id = ? AND user_id = ?")
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn count_credentials(&self, user_id: Uuid) -> Result<usize, DbError> {
        let pool = self.get_pool()?;

        let row = sqlx::query("SELECT COUNT(*) as count FROM credentials WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_one(pool)
            .await?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }

    async fn begin_transaction<'t>(&self) -> Result<Transaction<'t>, DbError> {
        let pool = self.get_pool()?;
        let tx = pool.begin().await?;
        Ok(Transaction::Sqlite(tx))
    }

    async fn commit_transaction<'t>(&self, tx: Transaction<'t>) -> Result<(), DbError> {
        match tx {
            Transaction::Sqlite(tx) => {
                tx.commit().await?;
                Ok(())
            }
            _ => Err(DbError::TransactionError(
                "Invalid transaction type for SQLite".into(),
            )),
        }
    }

    async fn rollback_transaction<'t>(&self, tx: Transaction<'t>) -> Result<(), DbError> {
        match tx {
            Transaction::Sqlite(tx) => {
                tx.rollback().await?;
                Ok(())
            }
            _ => Err(DbError::TransactionError(
                "Invalid transaction type for SQLite".into(),
            )),
        }
    }

    async fn update_credential_secret_in_transaction<'t>(
        &self,
        tx: &mut Transaction<'t>,
        id: Uuid,
        encrypted_secret: &[u8],
    ) -> Result<(), DbError> {
        let sqlite_tx = match tx {
            Transaction::Sqlite(tx) => tx,
            _ => {
                return Err(DbError::TransactionError(
                    "Invalid transaction type for SQLite".into(),
                ))
            }
        };

        let now_str = Utc::now().to_rfc3339();

        let result = sqlx::query("UPDATE credentials SET secret = ?, updated_at = ? WHERE id = ?")
            .bind(encrypted_secret)
            .bind(&now_str)
            .bind(id.to_string())
            .execute(&mut **sqlite_tx)
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
        let sqlite_tx = match tx {
            Transaction::Sqlite(tx) => tx,
            _ => {
                return Err(DbError::TransactionError(
                    "Invalid transaction type for SQLite".into(),
                ))
            }
        };

        let result = sqlx::query("UPDATE users SET password_hash = ?, kdf_salt = ? WHERE id = ?")
            .bind(password_hash)
            .bind(kdf_salt)
            .bind(user_id.to_string())
            .execute(&mut **sqlite_tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::Database;
    use super::*;

    async fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        (db, dir)
    }

    async fn test_user(db: &Database) -> Uuid {
        db.create_user("alice@example.com", "Alice", "phc-hash", "c2FsdHNhbHQ")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn init_creates_schema_and_users_roundtrip() {
        let (db, _dir) = test_db().await;

        let id = test_user(&db).await;
        let user = db.get_user_by_id(id).await.unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.display_name, "Alice");
        assert_eq!(user.password_hash, "phc-hash");

        let by_email = db.get_user_by_email("alice@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, id);

        assert!(db.get_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (db, _dir) = test_db().await;
        test_user(&db).await;

        let err = db
            .create_user("alice@example.com", "Other", "hash2", "salt2")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::EmailTaken(_)));
    }

    #[tokio::test]
    async fn credential_crud_roundtrip() {
        let (db, _dir) = test_db().await;
        let user_id = test_user(&db).await;

        let id = db
            .add_credential(
                user_id,
                "GitHub",
                "alice",
                b"encrypted-bytes",
                Some("https://github.com"),
                "work",
                None,
            )
            .await
            .unwrap();

        let record = db.get_credential_by_id(user_id, id).await.unwrap();
        assert_eq!(record.name, "GitHub");
        assert_eq!(record.username, "alice");
        assert_eq!(record.secret, b"encrypted-bytes");
        assert_eq!(record.url.as_deref(), Some("https://github.com"));
        assert_eq!(record.category, "work");
        assert!(record.notes.is_none());

        db.update_credential(
            user_id,
            id,
            Some("GitHub Enterprise"),
            None,
            None,
            None,
            Some("finance"),
            Some("migrated"),
        )
        .await
        .unwrap();

        let updated = db.get_credential_by_id(user_id, id).await.unwrap();
        assert_eq!(updated.name, "GitHub Enterprise");
        assert_eq!(updated.username, "alice");
        assert_eq!(updated.category, "finance");
        assert_eq!(updated.notes.as_deref(), Some("migrated"));
        assert!(updated.updated_at >= updated.created_at);

        db.delete_credential(user_id, id).await.unwrap();
        let err = db.get_credential_by_id(user_id, id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[tokio::test]
    async fn missing_records_report_not_found() {
        let (db, _dir) = test_db().await;
        let user_id = test_user(&db).await;
        let ghost = Uuid::new_v4();

        assert!(matches!(
            db.get_credential_by_id(user_id, ghost).await.unwrap_err(),
            DbError::NotFound
        ));
        assert!(matches!(
            db.delete_credential(user_id, ghost).await.unwrap_err(),
            DbError::NotFound
        ));
        assert!(matches!(
            db.update_credential(user_id, ghost, Some("x"), None, None, None, None, None)
                .await
                .unwrap_err(),
            DbError::NotFound
        ));
    }

    #[tokio::test]
    async fn records_are_scoped_to_their_user() {
        let (db, _dir) = test_db().await;
        let alice = test_user(&db).await;
        let bob = db
            .create_user("bob@example.com", "Bob", "hash", "salt")
            .await
            .unwrap();

        let id = db
            .add_credential(alice, "Bank", "alice", b"secret", None, "finance", None)
            .await
            .unwrap();

        // Bob cannot see, modify, or delete Alice's record
        assert!(matches!(
            db.get_credential_by_id(bob, id).await.unwrap_err(),
            DbError::NotFound
        ));
        assert!(matches!(
            db.delete_credential(bob, id).await.unwrap_err(),
            DbError::NotFound
        ));
        assert_eq!(db.count_credentials(bob).await.unwrap(), 0);
        assert_eq!(db.count_credentials(alice).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listing_filters_by_category_and_search() {
        let (db, _dir) = test_db().await;
        let user_id = test_user(&db).await;

        db.add_credential(user_id, "GitHub", "alice-dev", b"a", Some("https://github.com"), "work", None)
            .await
            .unwrap();
        db.add_credential(user_id, "Mastodon", "alice", b"b", None, "social", Some("fediverse account"))
            .await
            .unwrap();
        db.add_credential(user_id, "Bank", "a.smith", b"c", Some("https://bank.example"), "finance", None)
            .await
            .unwrap();

        let all = db
            .get_credentials(user_id, &CredentialFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let work = db
            .get_credentials(
                user_id,
                &CredentialFilter {
                    category: Some("work".into()),
                    search: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].name, "GitHub");

        // Search is case-insensitive and spans name, username, url, notes
        for (needle, expected) in [
            ("github", "GitHub"),
            ("ALICE-DEV", "GitHub"),
            ("bank.example", "Bank"),
            ("fediverse", "Mastodon"),
        ] {
            let found = db
                .get_credentials(
                    user_id,
                    &CredentialFilter {
                        category: None,
                        search: Some(needle.into()),
                    },
                )
                .await
                .unwrap();
            assert_eq!(found.len(), 1, "search {:?}", needle);
            assert_eq!(found[0].name, expected);
        }

        let none = db
            .get_credentials(
                user_id,
                &CredentialFilter {
                    category: Some("social".into()),
                    search: Some("github".into()),
                },
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn listing_orders_newest_first() {
        let (db, _dir) = test_db().await;
        let user_id = test_user(&db).await;

        for name in ["first", "second", "third"] {
            db.add_credential(user_id, name, "u", b"s", None, "other", None)
                .await
                .unwrap();
            // rfc3339 text ordering needs distinct timestamps
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let all = db
            .get_credentials(user_id, &CredentialFilter::default())
            .await
            .unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn transaction_reencrypts_secrets_and_rolls_back() {
        let (db, _dir) = test_db().await;
        let user_id = test_user(&db).await;
        let id = db
            .add_credential(user_id, "Mail", "alice", b"old-bytes", None, "personal", None)
            .await
            .unwrap();

        // Committed path
        let mut tx = db.begin_transaction().await.unwrap();
        db.update_credential_secret_in_transaction(&mut tx, id, b"new-bytes")
            .await
            .unwrap();
        db.update_user_password_in_transaction(&mut tx, user_id, "new-hash", "new-salt")
            .await
            .unwrap();
        db.commit_transaction(tx).await.unwrap();

        let record = db.get_credential_by_id(user_id, id).await.unwrap();
        assert_eq!(record.secret, b"new-bytes");
        let user = db.get_user_by_id(user_id).await.unwrap();
        assert_eq!(user.password_hash, "new-hash");
        assert_eq!(user.kdf_salt, "new-salt");

        // Rolled-back path leaves everything untouched
        let mut tx = db.begin_transaction().await.unwrap();
        db.update_credential_secret_in_transaction(&mut tx, id, b"abandoned")
            .await
            .unwrap();
        db.rollback_transaction(tx).await.unwrap();

        let record = db.get_credential_by_id(user_id, id).await.unwrap();
        assert_eq!(record.secret, b"new-bytes");
    }
}
