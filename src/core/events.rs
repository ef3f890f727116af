// src/core/events.rs
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::User;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedUp,
    SignedIn,
    SignedOut,
    PasswordChanged,
}

impl std::fmt::Display for AuthEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventKind::SignedUp => write!(f, "signed_up"),
            AuthEventKind::SignedIn => write!(f, "signed_in"),
            AuthEventKind::SignedOut => write!(f, "signed_out"),
            AuthEventKind::PasswordChanged => write!(f, "password_changed"),
        }
    }
}

// One auth-state change. Carried over the bus so interested parties
// (currently the log subscriber) can react without the auth manager
// knowing about them.
#[derive(Debug, Clone)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub user_id: Uuid,
    pub email: String,
    pub at: DateTime<Utc>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, user: &User) -> Self {
        Self {
            kind,
            user_id: user.id,
            email: user.email.clone(),
            at: Utc::now(),
        }
    }
}

/// Broadcast channel for authentication-state changes. Cloneable;
/// every clone publishes into the same channel.
#[derive(Debug, Clone)]
pub struct AuthEventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Dropped silently when nobody subscribes;
    /// auth flows never fail because of observers.
    pub fn publish(&self, event: AuthEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }
}

impl Default for AuthEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            display_name: "Alice".into(),
            password_hash: "hash".into(),
            kdf_salt: "salt".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = AuthEventBus::new();
        let mut rx = bus.subscribe();

        let user = test_user();
        bus.publish(AuthEvent::new(AuthEventKind::SignedIn, &user));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedIn);
        assert_eq!(event.user_id, user.id);
        assert_eq!(event.email, "alice@example.com");
    }

    #[tokio::test]
    async fn publishing_without_subscribers_does_not_panic() {
        let bus = AuthEventBus::new();
        bus.publish(AuthEvent::new(AuthEventKind::SignedOut, &test_user()));
    }

    #[tokio::test]
    async fn clones_share_the_channel() {
        let bus = AuthEventBus::new();
        let mut rx = bus.subscribe();

        let publisher = bus.clone();
        publisher.publish(AuthEvent::new(AuthEventKind::PasswordChanged, &test_user()));

        assert_eq!(
            rx.recv().await.unwrap().kind,
            AuthEventKind::PasswordChanged
        );
    }
}
