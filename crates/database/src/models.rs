//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How a user is able to sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    /// Email and password only.
    Local,
    /// Google sign-in only; the account has no password.
    Federated,
    /// A local account that has since been linked to Google.
    Linked,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// UUID v4 (e.g., "c27fb365-0c84-4cf2-8555-814bb065e448")
    pub id: String,
    /// Display name
    pub name: String,
    /// Lower-cased email address, unique across users
    pub email: String,
    /// Argon2 PHC string, absent for federated-only accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Google account subject id, once linked
    pub google_id: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl User {
    /// Build a new local account with a freshly generated id.
    pub fn local(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            password_hash: Some(password_hash.into()),
            google_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    /// Build a new federated-only account with a freshly generated id.
    pub fn federated(
        name: impl Into<String>,
        email: impl Into<String>,
        google_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            password_hash: None,
            google_id: Some(google_id.into()),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    /// The way this account signs in.
    pub fn account_kind(&self) -> AccountKind {
        match (&self.password_hash, &self.google_id) {
            (Some(_), Some(_)) => AccountKind::Linked,
            (None, Some(_)) => AccountKind::Federated,
            _ => AccountKind::Local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_kind() {
        let local = User::local("Alice", "alice@example.com", "$argon2id$hash");
        assert_eq!(local.account_kind(), AccountKind::Local);

        let federated = User::federated("Bob", "bob@example.com", "google-123");
        assert_eq!(federated.account_kind(), AccountKind::Federated);
        assert!(federated.password_hash.is_none());

        let linked = User {
            google_id: Some("google-456".to_string()),
            ..local
        };
        assert_eq!(linked.account_kind(), AccountKind::Linked);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::local("Alice", "alice@example.com", "$argon2id$secret");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret"));
    }
}
