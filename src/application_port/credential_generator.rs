use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
    #[error("hashing failed: {0}")]
    Hashing(String),
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
}

#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: RefreshToken,
    /// Salted argon2 PHC string of `token`.
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenVerifyResult {
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Mints the token pair. Holds the signing key; never touches the store.
#[async_trait::async_trait]
pub trait CredentialGenerator: Send + Sync {
    async fn issue_access_token(&self, user: UserId) -> Result<IssuedAccessToken, CredentialError>;
    async fn issue_refresh_token(&self) -> Result<IssuedRefreshToken, CredentialError>;
    fn verify_access_token(&self, token: &AccessToken)
    -> Result<TokenVerifyResult, CredentialError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_refresh_token(&self, token: &RefreshToken) -> Result<String, CredentialError>;
    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
        hash: &str,
    ) -> Result<bool, CredentialError>;
    /// Runs a verification that can never succeed, so a miss costs as much as a mismatch.
    async fn verify_against_decoy(&self, token: &RefreshToken) -> Result<(), CredentialError>;
}
