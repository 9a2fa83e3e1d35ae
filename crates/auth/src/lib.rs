//! Authentication for the chat backend.
//!
//! - [`AuthService`] verifies email/password logins, manages accounts and
//!   maps Google identities onto local users.
//! - [`GoogleOAuth`] runs the authorization-code exchange with Google.
//! - [`hash_password`] / [`verify_password`] wrap Argon2.
//!
//! Federated-only accounts carry no password at all, so there is no value a
//! local login could submit to match them.

mod error;
mod google;
mod password;
mod service;

pub use error::{AuthError, Result};
pub use google::{GoogleConfig, GoogleIdentity, GoogleOAuth};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, Registration, UserPatch};
