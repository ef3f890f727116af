// src/core/vault.rs
use crate::core::auth::{AuthError, AuthManager, Result as AuthResult};
use crate::core::config::Config;
use crate::core::events::{AuthEvent, AuthEventBus, AuthEventKind};
use crate::crypto;
use crate::db::{Database, Transaction};
use crate::models::{CredentialFilter, CredentialRecord, User};
use uuid::Uuid;

/// The user-facing service: authentication plus credential storage with
/// secrets encrypted under the session's vault key. All operations take
/// a bearer token and are scoped to the user it belongs to.
pub struct Vault {
    db: Database,
    pub auth_manager: AuthManager,
}

impl Vault {
    pub fn new(db: Database, events: AuthEventBus, config: &Config) -> Self {
        Self {
            db,
            auth_manager: AuthManager::new(events, config),
        }
    }

    pub async fn register(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> AuthResult<(String, User)> {
        self.auth_manager.register(&self.db, email, display_name, password).await
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthResult<(String, User)> {
        self.auth_manager.login(&self.db, email, password).await
    }

    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        let claims = self.auth_manager.validate_token(token)?;
        self.auth_manager.logout(&self.db, &claims).await
    }

    // Current user plus the session's expiry timestamp
    pub async fn auth_status(&self, token: &str) -> AuthResult<(User, i64)> {
        let claims = self.auth_manager.validate_token(token)?;
        let user = self.db.get_user_by_id(claims.user_id()?).await?;
        Ok((user, claims.exp))
    }

    pub async fn add_credential(
        &self,
        token: &str,
        name: &str,
        username: &str,
        secret: &str,
        url: Option<&str>,
        category: &str,
        notes: Option<&str>,
    ) -> AuthResult<Uuid> {
        let claims = self.auth_manager.validate_token(token)?;
        let vault_key = self.auth_manager.session_key(&claims.sid)?;

        let encrypted = crypto::encrypt_secret(&vault_key, secret)?;
        let id = self
            .db
            .add_credential(claims.user_id()?, name, username, &encrypted, url, category, notes)
            .await?;

        Ok(id)
    }

    /// List the user's records. Secrets stay encrypted; use
    /// `get_credential` to read one.
    pub async fn get_credentials(
        &self,
        token: &str,
        filter: &CredentialFilter,
    ) -> AuthResult<Vec<CredentialRecord>> {
        let claims = self.auth_manager.validate_token(token)?;
        let records = self.db.get_credentials(claims.user_id()?, filter).await?;
        Ok(records)
    }

    /// Fetch one record and decrypt its secret.
    pub async fn get_credential(
        &self,
        token: &str,
        id: Uuid,
    ) -> AuthResult<(CredentialRecord, String)> {
        let claims = self.auth_manager.validate_token(token)?;
        let vault_key = self.auth_manager.session_key(&claims.sid)?;

        let record = self.db.get_credential_by_id(claims.user_id()?, id).await?;
        let secret = crypto::decrypt_secret(&vault_key, &record.secret)?;

        Ok((record, secret))
    }

    pub async fn update_credential(
        &self,
        token: &str,
        id: Uuid,
        name: Option<&str>,
        username: Option<&str>,
        secret: Option<&str>,
        url: Option<&str>,
        category: Option<&str>,
        notes: Option<&str>,
    ) -> AuthResult<()> {
        let claims = self.auth_manager.validate_token(token)?;
        let vault_key = self.auth_manager.session_key(&claims.sid)?;

        let encrypted_secret = if let Some(secret) = secret {
            Some(crypto::encrypt_secret(&vault_key, secret)?)
        } else {
            None
        };

        self.db
            .update_credential(
                claims.user_id()?,
                id,
                name,
                username,
                encrypted_secret.as_deref(),
                url,
                category,
                notes,
            )
            .await?;

        Ok(())
    }

    pub async fn delete_credential(&self, token: &str, id: Uuid) -> AuthResult<()> {
        let claims = self.auth_manager.validate_token(token)?;
        self.db.delete_credential(claims.user_id()?, id).await?;
        Ok(())
    }

    pub async fn count_credentials(&self, token: &str) -> AuthResult<usize> {
        let claims = self.auth_manager.validate_token(token)?;
        let count = self.db.count_credentials(claims.user_id()?).await?;
        Ok(count)
    }

    /// Change the login password. Every stored secret is re-encrypted
    /// under the new key inside one transaction; an error anywhere
    /// rolls the whole change back.
    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let claims = self.auth_manager.validate_token(token)?;
        let user_id = claims.user_id()?;
        let user = self.db.get_user_by_id(user_id).await?;

        if !crypto::verify_password(current_password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let current_key = self.auth_manager.session_key(&claims.sid)?;

        let new_salt = crypto::generate_salt();
        let new_key = crypto::derive_key(new_password, &new_salt)?;
        let new_hash = crypto::hash_password(new_password)?;

        let records = self
            .db
            .get_credentials(user_id, &CredentialFilter::default())
            .await?;

        let mut tx = self.db.begin_transaction().await?;

        let applied = self
            .reencrypt_in_transaction(&mut tx, &records, &current_key, &new_key, user_id, &new_hash, &new_salt)
            .await;

        if let Err(e) = applied {
            let _ = self.db.rollback_transaction(tx).await;
            return Err(e);
        }

        self.db.commit_transaction(tx).await?;

        self.auth_manager.update_session_key(&claims.sid, &new_key)?;
        self.auth_manager
            .publish(AuthEvent::new(AuthEventKind::PasswordChanged, &user));

        Ok(())
    }

    async fn reencrypt_in_transaction<'t>(
        &self,
        tx: &mut Transaction<'t>,
        records: &[CredentialRecord],
        current_key: &[u8],
        new_key: &[u8],
        user_id: Uuid,
        new_hash: &str,
        new_salt: &str,
    ) -> AuthResult<()> {
        for record in records {
            let plaintext = crypto::decrypt_secret(current_key, &record.secret)?;
            let reencrypted = crypto::encrypt_secret(new_key, &plaintext)?;

            self.db
                .update_credential_secret_in_transaction(tx, record.id, &reencrypted)
                .await?;
        }

        self.db
            .update_user_password_in_transaction(tx, user_id, new_hash, new_salt)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;

    async fn test_vault() -> (Vault, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();

        let config = Config {
            session_dir: Some(dir.path().join("sessions")),
            jwt_secret: Some("test-secret".into()),
            ..Config::default()
        };

        let db = Database::new(&format!("sqlite:{}", dir.path().join("vault.db").display()))
            .await
            .unwrap();

        (Vault::new(db, AuthEventBus::new(), &config), dir)
    }

    #[tokio::test]
    async fn secrets_roundtrip_through_encryption() {
        let (vault, _dir) = test_vault().await;
        let (token, _) = vault
            .register("alice@example.com", "Alice", "pw-123456")
            .await
            .unwrap();

        let id = vault
            .add_credential(
                &token,
                "GitHub",
                "alice",
                "gh-secret-token",
                Some("https://github.com"),
                "work",
                None,
            )
            .await
            .unwrap();

        // Stored bytes are not the plaintext
        let listed = vault
            .get_credentials(&token, &CredentialFilter::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_ne!(listed[0].secret, b"gh-secret-token");

        let (record, secret) = vault.get_credential(&token, id).await.unwrap();
        assert_eq!(record.name, "GitHub");
        assert_eq!(secret, "gh-secret-token");

        vault
            .update_credential(&token, id, None, None, Some("rotated"), None, None, None)
            .await
            .unwrap();
        let (_, rotated) = vault.get_credential(&token, id).await.unwrap();
        assert_eq!(rotated, "rotated");
    }

    #[tokio::test]
    async fn users_cannot_reach_each_others_records() {
        let (vault, _dir) = test_vault().await;
        let (alice_token, _) = vault
            .register("alice@example.com", "Alice", "pw-123456")
            .await
            .unwrap();
        let (bob_token, _) = vault
            .register("bob@example.com", "Bob", "pw-abcdef")
            .await
            .unwrap();

        let id = vault
            .add_credential(&alice_token, "Bank", "alice", "secret", None, "finance", None)
            .await
            .unwrap();

        let err = vault.get_credential(&bob_token, id).await.unwrap_err();
        assert!(matches!(err, AuthError::DbError(DbError::NotFound)));

        assert_eq!(vault.count_credentials(&bob_token).await.unwrap(), 0);
        assert_eq!(vault.count_credentials(&alice_token).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn change_password_reencrypts_and_keeps_session_usable() {
        let (vault, _dir) = test_vault().await;
        let (token, _) = vault
            .register("alice@example.com", "Alice", "old-pw-123")
            .await
            .unwrap();

        let id = vault
            .add_credential(&token, "Mail", "alice", "imap-secret", None, "personal", None)
            .await
            .unwrap();

        vault
            .change_password(&token, "old-pw-123", "new-pw-456")
            .await
            .unwrap();

        // Same session keeps working and still decrypts
        let (_, secret) = vault.get_credential(&token, id).await.unwrap();
        assert_eq!(secret, "imap-secret");

        // Old password no longer logs in, the new one does
        assert!(vault.login("alice@example.com", "old-pw-123").await.is_err());
        let (new_token, _) = vault.login("alice@example.com", "new-pw-456").await.unwrap();
        let (_, secret) = vault.get_credential(&new_token, id).await.unwrap();
        assert_eq!(secret, "imap-secret");
    }

    #[tokio::test]
    async fn change_password_requires_the_current_one() {
        let (vault, _dir) = test_vault().await;
        let (token, _) = vault
            .register("alice@example.com", "Alice", "old-pw-123")
            .await
            .unwrap();

        let err = vault
            .change_password(&token, "not-the-password", "new-pw-456")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        // Nothing changed
        assert!(vault.login("alice@example.com", "old-pw-123").await.is_ok());
    }

    #[tokio::test]
    async fn operations_require_a_live_session() {
        let (vault, _dir) = test_vault().await;
        let (token, _) = vault
            .register("alice@example.com", "Alice", "pw-123456")
            .await
            .unwrap();

        vault.logout(&token).await.unwrap();

        let err = vault
            .get_credentials(&token, &CredentialFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidSession));
    }
}
