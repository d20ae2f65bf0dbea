//! Account registration.

use crate::backend::OnboardingBackend;
use crate::error::{AuthError, BackendError};
use crate::form::AccountCredentials;

/// Opaque access credential returned by account registration.
///
/// `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Creates the account for a registration attempt.
///
/// Registration is never retried: any failure is returned to the caller as fatal.
pub struct AuthRegistrar<'a, B> {
    backend: &'a B,
}

impl<'a, B: OnboardingBackend> AuthRegistrar<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Register the account and return its access token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::EmailTaken`] if the backend answers `409 Conflict`,
    /// - [`AuthError::Rejected`] for any other 4xx (for example a weak password),
    /// - [`AuthError::MissingToken`] if the account was created but no token came back,
    /// - [`AuthError::Backend`] for network failures and 5xx responses.
    pub async fn register(&self, credentials: &AccountCredentials) -> Result<AuthToken, AuthError> {
        match self.backend.register_account(credentials).await {
            Ok(Some(token)) => Ok(token),
            Ok(None) => Err(AuthError::MissingToken),
            Err(BackendError::Status { status: 409, .. }) => {
                Err(AuthError::EmailTaken(credentials.email.to_string()))
            }
            Err(err) if err.is_rejection() => Err(AuthError::Rejected(err)),
            Err(err) => Err(AuthError::Backend(err)),
        }
    }
}
