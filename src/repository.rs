use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bcrypt::{BcryptError, DEFAULT_COST, hash, verify};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{SeedUser, User};

/// UserDirectory Trait
///
/// The collaborator that checks passwords on behalf of the login endpoint. The gate
/// never calls it: once a token is issued, requests are authenticated from the token alone.
///
/// **Send + Sync + async_trait** make `Arc<dyn UserDirectory>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns the account if the email exists and the password matches.
    async fn verify_credentials(&self, email: &str, password: &str) -> Option<User>;
    /// Creates an account. Returns `Ok(None)` when the email is already taken.
    async fn create_user(&self, email: &str, password: &str) -> Result<Option<User>, BcryptError>;
}

pub type DirectoryState = Arc<dyn UserDirectory>;

struct StoredUser {
    user: User,
    // bcrypt hash; the salt and cost are embedded in it.
    password_hash: String,
}

/// InMemoryDirectory
///
/// Process-local user directory for development and tests. Passwords are stored as
/// bcrypt hashes (`DEFAULT_COST`); nothing survives a restart.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory pre-populated with the given accounts. Later duplicates of an
    /// email are ignored.
    ///
    /// # Errors
    /// Fails if bcrypt cannot hash one of the seed passwords.
    pub fn with_users(seed: &[SeedUser]) -> Result<Self, BcryptError> {
        let mut users = HashMap::new();
        for entry in seed {
            let email = normalize_email(&entry.email);
            if users.contains_key(&email) {
                continue;
            }
            let id = entry
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let stored = StoredUser::new(User { id, email: email.clone() }, &entry.password)?;
            users.insert(email, stored);
        }
        Ok(Self {
            users: RwLock::new(users),
        })
    }
}

impl StoredUser {
    fn new(user: User, password: &str) -> Result<Self, BcryptError> {
        let password_hash = hash(password, DEFAULT_COST)?;
        Ok(Self {
            user,
            password_hash,
        })
    }

    // bcrypt::verify compares in constant time.
    fn matches(&self, password: &str) -> bool {
        verify(password, &self.password_hash).unwrap_or_else(|err| {
            tracing::error!(error = %err, principal = %self.user.id, "stored password hash is unreadable");
            false
        })
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn verify_credentials(&self, email: &str, password: &str) -> Option<User> {
        let users = self.users.read().await;
        users
            .get(&normalize_email(email))
            .filter(|stored| stored.matches(password))
            .map(|stored| stored.user.clone())
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<Option<User>, BcryptError> {
        let email = normalize_email(email);
        if self.users.read().await.contains_key(&email) {
            return Ok(None);
        }

        // Hash outside the write lock; bcrypt is deliberately slow.
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
        };
        let stored = StoredUser::new(user.clone(), password)?;

        let mut users = self.users.write().await;
        // Re-check: another registration may have won the race while we were hashing.
        if users.contains_key(&email) {
            return Ok(None);
        }
        users.insert(email, stored);
        Ok(Some(user))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn created_user_can_log_in() {
        let directory = InMemoryDirectory::new();
        let created = directory
            .create_user("Alice@Example.com ", "correct horse")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.email, "alice@example.com");

        let found = directory
            .verify_credentials("alice@example.com", "correct horse")
            .await;
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn wrong_password_is_refused() {
        let directory = InMemoryDirectory::new();
        directory
            .create_user("bob@example.com", "password1")
            .await
            .unwrap();
        assert!(
            directory
                .verify_credentials("bob@example.com", "password2")
                .await
                .is_none()
        );
        assert!(
            directory
                .verify_credentials("nobody@example.com", "password1")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_email_is_refused() {
        let directory = InMemoryDirectory::new();
        let first = directory.create_user("c@example.com", "password1").await;
        assert!(first.unwrap().is_some());
        let second = directory.create_user("C@EXAMPLE.COM", "password2").await;
        assert!(second.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeded_users_keep_their_ids() {
        let directory = InMemoryDirectory::with_users(&[
            SeedUser {
                email: "seed@example.com".to_string(),
                password: "seeded-pass".to_string(),
                id: Some("user-42".to_string()),
            },
            SeedUser {
                email: "SEED@example.com".to_string(),
                password: "other-pass".to_string(),
                id: Some("user-43".to_string()),
            },
        ])
        .unwrap();

        let user = directory
            .verify_credentials("seed@example.com", "seeded-pass")
            .await
            .unwrap();
        assert_eq!(user.id, "user-42");
        assert!(
            directory
                .verify_credentials("seed@example.com", "other-pass")
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn passwords_are_stored_as_bcrypt_hashes() {
        let directory = InMemoryDirectory::new();
        directory
            .create_user("hash@example.com", "plain-text-pw")
            .await
            .unwrap();

        let users = directory.users.read().await;
        let stored = users.get("hash@example.com").unwrap();
        assert_ne!(stored.password_hash, "plain-text-pw");
        assert!(stored.password_hash.starts_with("$2"));
        assert!(stored.matches("plain-text-pw"));
        assert!(!stored.matches("plain-text-pw "));
    }
}
