// src/db/mod.rs
use uuid::Uuid;
use crate::models::{CredentialFilter, CredentialRecord, User};
use thiserror::Error;

pub mod postgres;
pub mod sqlite;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqlxError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),
}

// Convert database-specific errors to our DbError
impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        DbError::SqlxError(error.to_string())
    }
}

// A Transaction enum that can work with either PostgreSQL or SQLite
pub enum Transaction<'t> {
    Postgres(sqlx::Transaction<'t, sqlx::Postgres>),
    Sqlite(sqlx::Transaction<'t, sqlx::Sqlite>),
}

// Database backend trait - to be implemented by each database type
pub trait DatabaseBackend: Send + Sync {
    // Initialize the database connection and schema
    async fn init(&mut self, connection_string: &str) -> Result<(), DbError>;

    // User operations
    async fn create_user(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
        kdf_salt: &str,
    ) -> Result<Uuid, DbError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<User, DbError>;

    // Credential operations, always scoped to one user
    async fn add_credential(
        &self,
        user_id: Uuid,
        name: &str,
        username: &str,
        encrypted_secret: &[u8],
        url: Option<&str>,
        category: &str,
        notes: Option<&str>,
    ) -> Result<Uuid, DbError>;

    async fn get_credentials(
        &self,
        user_id: Uuid,
        filter: &CredentialFilter,
    ) -> Result<Vec<CredentialRecord>, DbError>;

    async fn get_credential_by_id(&self, user_id: Uuid, id: Uuid)
        -> Result<CredentialRecord, DbError>;

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
    ) -> Result<(), DbError>;

    async fn delete_credential(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError>;

    async fn count_credentials(&self, user_id: Uuid) -> Result<usize, DbError>;

    // Transaction methods
    async fn begin_transaction<'t>(&self) -> Result<Transaction<'t>, DbError>;

    async fn commit_transaction<'t>(&self, tx: Transaction<'t>) -> Result<(), DbError>;

    async fn rollback_transaction<'t>(&self, tx: Transaction<'t>) -> Result<(), DbError>;

    // Methods that work within a transaction (password-change re-encryption)
    async fn update_credential_secret_in_transaction<'t>(
        &self,
        tx: &mut Transaction<'t>,
        id: Uuid,
        encrypted_secret: &[u8],
    ) -> Result<(), DbError>;

    async fn update_user_password_in_transaction<'t>(
        &self,
        tx: &mut Transaction<'t>,
        user_id: Uuid,
        password_hash: &str,
        kdf_salt: &str,
    ) -> Result<(), DbError>;
}

// Enum to hold specific backend implementations
#[derive(Debug, Clone)]
pub enum DatabaseType {
    Postgres(postgres::PostgresBackend),
    Sqlite(sqlite::SqliteBackend),
}

// The main database struct that uses the enum pattern instead of trait objects
#[derive(Clone)]
pub struct Database {
    pub backend: DatabaseType,
}

impl Database {
    // Create a new database connection, auto-detecting the backend
    pub async fn new(connection_string: &str) -> Result<Self, DbError> {
        if connection_string.starts_with("postgres://")
            || connection_string.starts_with("postgresql://")
        {
            let mut backend = postgres::PostgresBackend::new();
            backend.init(connection_string).await?;
            Ok(Self {
                backend: DatabaseType::Postgres(backend),
            })
        } else {
            let mut backend = sqlite::SqliteBackend::new();
            backend.init(connection_string).await?;
            Ok(Self {
                backend: DatabaseType::Sqlite(backend),
            })
        }
    }

    pub async fn create_user(
        &self,
        email: &str,
        display_name: &str,
        password_hash: &str,
        kdf_salt: &str,
    ) -> Result<Uuid, DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => {
                backend.create_user(email, display_name, password_hash, kdf_salt).await
            }
            DatabaseType::Sqlite(backend) => {
                backend.create_user(email, display_name, password_hash, kdf_salt).await
            }
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => backend.get_user_by_email(email).await,
            DatabaseType::Sqlite(backend) => backend.get_user_by_email(email).await,
        }
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<User, DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => backend.get_user_by_id(id).await,
            DatabaseType::Sqlite(backend) => backend.get_user_by_id(id).await,
        }
    }

    pub async fn add_credential(
        &self,
        user_id: Uuid,
        name: &str,
        username: &str,
        encrypted_secret: &[u8],
        url: Option<&str>,
        category: &str,
        notes: Option<&str>,
    ) -> Result<Uuid, DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => {
                backend
                    .add_credential(user_id, name, username, encrypted_secret, url, category, notes)
                    .await
            }
            DatabaseType::Sqlite(backend) => {
                backend
                    .add_credential(user_id, name, username, encrypted_secret, url, category, notes)
                    .await
            }
        }
    }

    pub async fn get_credentials(
        &self,
        user_id: Uuid,
        filter: &CredentialFilter,
    ) -> Result<Vec<CredentialRecord>, DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => backend.get_credentials(user_id, filter).await,
            DatabaseType::Sqlite(backend) => backend.get_credentials(user_id, filter).await,
        }
    }

    pub async fn get_credential_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<CredentialRecord, DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => backend.get_credential_by_id(user_id, id).await,
            DatabaseType::Sqlite(backend) => backend.get_credential_by_id(user_id, id).await,
        }
    }

    pub async fn update_credential(
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
        match &self.backend {
            DatabaseType::Postgres(backend) => {
                backend
                    .update_credential(user_id, id, name, username, encrypted_secret, url, category, notes)
                    .await
            }
            DatabaseType::Sqlite(backend) => {
                backend
                    .update_credential(user_id, id, name, username, encrypted_secret, url, category, notes)
                    .await
            }
        }
    }

    pub async fn delete_credential(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => backend.delete_credential(user_id, id).await,
            DatabaseType::Sqlite(backend) => backend.delete_credential(user_id, id).await,
        }
    }

    pub async fn count_credentials(&self, user_id: Uuid) -> Result<usize, DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => backend.count_credentials(user_id).await,
            DatabaseType::Sqlite(backend) => backend.count_credentials(user_id).await,
        }
    }

    // Transaction methods
    pub async fn begin_transaction<'t>(&self) -> Result<Transaction<'t>, DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => backend.begin_transaction().await,
            DatabaseType::Sqlite(backend) => backend.begin_transaction().await,
        }
    }

    pub async fn commit_transaction<'t>(&self, tx: Transaction<'t>) -> Result<(), DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => backend.commit_transaction(tx).await,
            DatabaseType::Sqlite(backend) => backend.commit_transaction(tx).await,
        }
    }

    pub async fn rollback_transaction<'t>(&self, tx: Transaction<'t>) -> Result<(), DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => backend.rollback_transaction(tx).await,
            DatabaseType::Sqlite(backend) => backend.rollback_transaction(tx).await,
        }
    }

    pub async fn update_credential_secret_in_transaction<'t>(
        &self,
        tx: &mut Transaction<'t>,
        id: Uuid,
        encrypted_secret: &[u8],
    ) -> Result<(), DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => {
                backend.update_credential_secret_in_transaction(tx, id, encrypted_secret).await
            }
            DatabaseType::Sqlite(backend) => {
                backend.update_credential_secret_in_transaction(tx, id, encrypted_secret).await
            }
        }
    }

    pub async fn update_user_password_in_transaction<'t>(
        &self,
        tx: &mut Transaction<'t>,
        user_id: Uuid,
        password_hash: &str,
        kdf_salt: &str,
    ) -> Result<(), DbError> {
        match &self.backend {
            DatabaseType::Postgres(backend) => {
                backend
                    .update_user_password_in_transaction(tx, user_id, password_hash, kdf_salt)
                    .await
            }
            DatabaseType::Sqlite(backend) => {
                backend
                    .update_user_password_in_transaction(tx, user_id, password_hash, kdf_salt)
                    .await
            }
        }
    }

    pub fn get_backend_type(&self) -> &str {
        match &self.backend {
            DatabaseType::Sqlite(_) => "SQLite",
            DatabaseType::Postgres(_) => "PostgreSQL",
        }
    }
}

// Function to initialize the database
pub async fn init_db(db_url: &str) -> Result<Database, DbError> {
    Database::new(db_url).await
}
