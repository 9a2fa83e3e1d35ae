//! Account verification and management.

use database::validation::{normalize_email, validate_email, validate_name, validate_password};
use database::{user, Database, User};
use tracing::{info, warn};

use crate::error::{AuthError, Result};
use crate::google::GoogleIdentity;
use crate::password::{hash_password_blocking, verify_password_blocking};

/// Fields for a new local account.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Partial update to an account; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Authentication service, built once at startup and shared by handlers.
#[derive(Debug, Clone)]
pub struct AuthService {
    db: Database,
}

impl AuthService {
    /// Create a service backed by the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Check an email/password pair.
    ///
    /// Federated-only accounts have no password and never match.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        let user = user::find_user_by_email(self.db.pool(), &email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let Some(stored_hash) = user.password_hash.clone() else {
            warn!(user_id = %user.id, "Password login attempted on federated-only account");
            return Err(AuthError::IncorrectPassword);
        };

        if !verify_password_blocking(password.to_string(), stored_hash).await {
            return Err(AuthError::IncorrectPassword);
        }

        Ok(user)
    }

    /// Re-load a user by id, as done on every authenticated request.
    pub async fn load_user(&self, id: &str) -> Result<User> {
        Ok(user::get_user(self.db.pool(), id).await?)
    }

    /// Create a local account.
    pub async fn register(&self, registration: Registration) -> Result<User> {
        validate_name(&registration.name)?;
        validate_email(&registration.email)?;
        validate_password(&registration.password)?;

        let email = normalize_email(&registration.email);
        if user::find_user_by_email(self.db.pool(), &email).await?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        let password_hash = hash_password_blocking(registration.password).await?;
        let new_user = User::local(registration.name.trim(), email, password_hash);
        let created = user::create_user(self.db.pool(), &new_user).await?;

        info!(user_id = %created.id, "Registered local account");
        Ok(created)
    }

    /// Apply a partial update.
    ///
    /// Unknown ids fail before anything is validated or written.
    pub async fn update_user(&self, id: &str, patch: UserPatch) -> Result<User> {
        let mut current = user::get_user(self.db.pool(), id).await?;

        if let Some(name) = patch.name {
            validate_name(&name)?;
            current.name = name.trim().to_string();
        }

        if let Some(email) = patch.email {
            validate_email(&email)?;
            let email = normalize_email(&email);
            if email != current.email {
                if let Some(other) = user::find_user_by_email(self.db.pool(), &email).await? {
                    if other.id != current.id {
                        return Err(AuthError::EmailTaken(email));
                    }
                }
            }
            current.email = email;
        }

        if let Some(password) = patch.password {
            validate_password(&password)?;
            current.password_hash = Some(hash_password_blocking(password).await?);
        }

        let updated = user::update_user(self.db.pool(), &current).await?;
        info!(user_id = %updated.id, "Updated account");
        Ok(updated)
    }

    /// Delete an account, returning the removed record.
    pub async fn delete_user(&self, id: &str) -> Result<User> {
        let removed = user::delete_user(self.db.pool(), id).await?;
        info!(user_id = %removed.id, "Deleted account");
        Ok(removed)
    }

    /// Map a Google identity to a local user.
    ///
    /// Looks up by Google id, then by email (linking the Google id to that
    /// account), and otherwise creates a federated-only account. Linking by
    /// email requires Google to have verified the address; an unverified
    /// claim on an existing account is rejected. Concurrent first logins for
    /// the same identity are not serialized; the unique indexes reject the
    /// loser.
    pub async fn find_or_create_federated(&self, identity: &GoogleIdentity) -> Result<User> {
        if let Some(existing) = user::find_user_by_google_id(self.db.pool(), &identity.sub).await? {
            return Ok(existing);
        }

        let email = identity
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AuthError::OAuth("identity has no email".to_string()))?;

        if let Some(existing) = user::find_user_by_email(self.db.pool(), &email).await? {
            if identity.email_verified != Some(true) {
                warn!(user_id = %existing.id, "Refusing to link unverified Google email");
                return Err(AuthError::OAuth(
                    "Google has not verified this email address".to_string(),
                ));
            }
            let linked = user::link_google_id(self.db.pool(), &existing.id, &identity.sub).await?;
            info!(user_id = %linked.id, "Linked Google account to existing user");
            return Ok(linked);
        }

        let name = identity
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        let new_user = User::federated(name, email, identity.sub.clone());
        let created = user::create_user(self.db.pool(), &new_user).await?;

        info!(user_id = %created.id, "Created federated account");
        Ok(created)
    }
}
