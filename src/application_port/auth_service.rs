use super::CredentialError;
use crate::domain_model::*;
use crate::domain_port::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("signing failure: {0}")]
    Signing(String),
    #[error("entropy failure: {0}")]
    Entropy(String),
    #[error("hashing failure: {0}")]
    Hashing(String),
}

impl From<CredentialError> for AuthError {
    fn from(error: CredentialError) -> Self {
        match error {
            CredentialError::Signing(e) => AuthError::Signing(e),
            CredentialError::Entropy(e) => AuthError::Entropy(e),
            CredentialError::Hashing(e) => AuthError::Hashing(e),
            CredentialError::TokenInvalid | CredentialError::TokenExpired => {
                AuthError::Unauthorized
            }
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => AuthError::Unauthorized,
            StoreError::Credential(e) => AuthError::from(e),
            e @ (StoreError::Timeout { .. } | StoreError::Store(_)) => {
                AuthError::Persistence(e.to_string())
            }
        }
    }
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Mints the first pair for `user_id` and overwrites whatever was stored for it.
    async fn issue_for_user(&self, user_id: &str) -> Result<TokenPair, AuthError>;
    /// Exchanges a still-current refresh token for a new pair.
    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
    async fn verify_token(&self, access_token: &str) -> Result<UserId, AuthError>;
}
