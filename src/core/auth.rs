// src/core/auth.rs
use chrono::Utc;
use jsonwebtoken::{encode, decode, Header, EncodingKey, DecodingKey, Validation, Algorithm};
use serde::{Serialize, Deserialize};
use uuid::Uuid;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use base64::Engine;

use crate::core::config::Config;
use crate::core::events::{AuthEvent, AuthEventBus, AuthEventKind};
use crate::crypto;
use crate::db::Database;
use crate::models::User;

// Define JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // Subject (user ID)
    pub sub: String,
    // Issued at
    pub iat: i64,
    // Expiration time
    pub exp: i64,
    // Session ID
    pub sid: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AuthError::InvalidFormat("Token subject is not a user id".into()))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid session")]
    InvalidSession,

    #[error("Crypto error: {0}")]
    CryptoError(#[from] crate::crypto::CryptoError),

    #[error("Database error: {0}")]
    DbError(#[from] crate::db::DbError),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

// What a session file holds: the owning user and the vault key derived
// at login. The file's existence is the revocation check.
#[derive(Debug, Serialize, Deserialize)]
struct SessionData {
    user_id: Uuid,
    key_b64: String,
    created_at: i64,
}

pub struct AuthManager {
    events: AuthEventBus,
    jwt_secret: String,
    session_dir: PathBuf,
    session_duration: Duration,
}

impl AuthManager {
    pub fn new(events: AuthEventBus, config: &Config) -> Self {
        let session_dir = config
            .session_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("./sessions"));

        if !session_dir.exists() {
            fs::create_dir_all(&session_dir).ok();
        }

        let jwt_secret = config
            .jwt_secret
            .clone()
            .unwrap_or_else(|| Self::get_or_create_jwt_secret(&session_dir));

        Self {
            events,
            jwt_secret,
            session_dir,
            session_duration: config.session_duration,
        }
    }

    // Get or create the JWT signing secret, persisted next to the sessions
    fn get_or_create_jwt_secret(session_dir: &PathBuf) -> String {
        let secret_file = session_dir.join("jwt_secret");

        if secret_file.exists() {
            if let Ok(secret) = fs::read_to_string(&secret_file) {
                return secret;
            }
        }

        let secret = crypto::generate_salt();
        fs::write(&secret_file, &secret).ok();

        secret
    }

    pub async fn register(
        &self,
        db: &Database,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> Result<(String, User)> {
        let email = email.trim().to_lowercase();

        let password_hash = crypto::hash_password(password)?;
        let kdf_salt = crypto::generate_salt();

        let user_id = db
            .create_user(&email, display_name.trim(), &password_hash, &kdf_salt)
            .await?;
        let user = db.get_user_by_id(user_id).await?;

        let vault_key = crypto::derive_key(password, &kdf_salt)?;
        let token = self.create_session(&user, &vault_key)?;

        self.events.publish(AuthEvent::new(AuthEventKind::SignedUp, &user));

        Ok((token, user))
    }

    pub async fn login(&self, db: &Database, email: &str, password: &str) -> Result<(String, User)> {
        let email = email.trim().to_lowercase();

        // Unknown email and wrong password are indistinguishable to the caller
        let user = db
            .get_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !crypto::verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let vault_key = crypto::derive_key(password, &user.kdf_salt)?;
        let token = self.create_session(&user, &vault_key)?;

        self.events.publish(AuthEvent::new(AuthEventKind::SignedIn, &user));

        Ok((token, user))
    }

    // Create a JWT and its backing session file
    fn create_session(&self, user: &User, vault_key: &[u8]) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();

        let duration = chrono::Duration::from_std(self.session_duration)
            .unwrap_or_else(|_| chrono::Duration::hours(1));

        let claims = Claims {
            sub: user.id.to_string(),
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + duration).timestamp(),
            sid: session_id.clone(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        self.save_session_data(&session_id, user.id, vault_key)?;

        Ok(token)
    }

    // Validate JWT token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )?;

        let claims = token_data.claims;

        if claims.exp < Utc::now().timestamp() {
            return Err(AuthError::SessionExpired);
        }

        // A deleted session file means the token was revoked
        if !self.session_file(&claims.sid).exists() {
            return Err(AuthError::InvalidSession);
        }

        Ok(claims)
    }

    fn session_file(&self, session_id: &str) -> PathBuf {
        self.session_dir.join(format!("{}.json", session_id))
    }

    fn read_session_data(&self, session_id: &str) -> Result<SessionData> {
        let raw = fs::read_to_string(self.session_file(session_id))
            .map_err(|_| AuthError::InvalidSession)?;
        Ok(serde_json::from_str(&raw)?)
    }

    // Get the vault key held by a session
    pub fn session_key(&self, session_id: &str) -> Result<Vec<u8>> {
        let data = self.read_session_data(session_id)?;

        base64::engine::general_purpose::STANDARD
            .decode(&data.key_b64)
            .map_err(|_| AuthError::InvalidFormat("Invalid session key encoding".into()))
    }

    fn save_session_data(&self, session_id: &str, user_id: Uuid, vault_key: &[u8]) -> Result<()> {
        let data = SessionData {
            user_id,
            key_b64: base64::engine::general_purpose::STANDARD.encode(vault_key),
            created_at: Utc::now().timestamp(),
        };

        fs::write(self.session_file(session_id), serde_json::to_string(&data)?)?;

        Ok(())
    }

    // Replace the stored vault key after a password change
    pub fn update_session_key(&self, session_id: &str, new_key: &[u8]) -> Result<()> {
        let data = self.read_session_data(session_id)?;
        self.save_session_data(session_id, data.user_id, new_key)
    }

    // Clear session; a missing file is not an error
    pub fn clear_session(&self, session_id: &str) -> Result<()> {
        let session_file = self.session_file(session_id);
        if session_file.exists() {
            fs::remove_file(session_file)?;
        }
        Ok(())
    }

    pub async fn logout(&self, db: &Database, claims: &Claims) -> Result<()> {
        self.clear_session(&claims.sid)?;

        if let Ok(user) = db.get_user_by_id(claims.user_id()?).await {
            self.events
                .publish(AuthEvent::new(AuthEventKind::SignedOut, &user));
        }

        Ok(())
    }

    pub fn publish(&self, event: AuthEvent) {
        self.events.publish(event);
    }

    /// Remove session files older than the session duration. Returns
    /// how many were swept.
    pub fn cleanup_expired_sessions(&self) -> usize {
        let entries = match fs::read_dir(&self.session_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to read session directory: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let expired = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|mtime| mtime.elapsed().ok())
                .map(|age| age > self.session_duration)
                .unwrap_or(false);

            if expired && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            log::info!("🧹 Swept {} expired session(s)", removed);
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn test_setup() -> (AuthManager, Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();

        let config = Config {
            session_dir: Some(dir.path().join("sessions")),
            jwt_secret: Some("test-secret".into()),
            ..Config::default()
        };

        let db = Database::new(&format!("sqlite:{}", dir.path().join("auth.db").display()))
            .await
            .unwrap();

        (AuthManager::new(AuthEventBus::new(), &config), db, dir)
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let (auth, db, _dir) = test_setup().await;

        let (token, user) = auth
            .register(&db, "Alice@Example.COM", "Alice", "s3cret-pw")
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");

        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert!(!auth.session_key(&claims.sid).unwrap().is_empty());

        // Login with any casing of the email
        let (token2, user2) = auth.login(&db, "alice@example.com", "s3cret-pw").await.unwrap();
        assert_eq!(user2.id, user.id);
        assert!(auth.validate_token(&token2).is_ok());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (auth, db, _dir) = test_setup().await;
        auth.register(&db, "alice@example.com", "Alice", "right-pw")
            .await
            .unwrap();

        let wrong_pw = auth.login(&db, "alice@example.com", "wrong-pw").await;
        let wrong_email = auth.login(&db, "bob@example.com", "right-pw").await;

        assert!(matches!(wrong_pw.unwrap_err(), AuthError::InvalidCredentials));
        assert!(matches!(wrong_email.unwrap_err(), AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let (auth, db, _dir) = test_setup().await;
        let (token, _) = auth
            .register(&db, "alice@example.com", "Alice", "pw-123456")
            .await
            .unwrap();

        let claims = auth.validate_token(&token).unwrap();
        auth.logout(&db, &claims).await.unwrap();

        assert!(matches!(
            auth.validate_token(&token).unwrap_err(),
            AuthError::InvalidSession
        ));

        // Logging out twice is harmless
        auth.logout(&db, &claims).await.unwrap();
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let (auth, _db, _dir) = test_setup().await;
        assert!(auth.validate_token("not-a-jwt").is_err());
        assert!(auth.validate_token("").is_err());
    }

    #[tokio::test]
    async fn sweep_removes_only_stale_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            session_dir: Some(dir.path().to_path_buf()),
            jwt_secret: Some("test-secret".into()),
            session_duration: Duration::from_secs(0),
            ..Config::default()
        };
        let auth = AuthManager::new(AuthEventBus::new(), &config);

        std::fs::write(dir.path().join("stale.json"), "{}").unwrap();
        std::fs::write(dir.path().join("jwt_secret"), "keep-me").unwrap();

        // Zero-duration config makes every session stale immediately
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(auth.cleanup_expired_sessions(), 1);
        assert!(dir.path().join("jwt_secret").exists());
        assert!(!dir.path().join("stale.json").exists());
    }
}
