use crate::application_port::*;
use crate::domain_model::*;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Covers both an unknown token and a hash mismatch.
    #[error("no matching credential")]
    NotFound,
    #[error("{op} timed out after {timeout:?}")]
    Timeout { op: &'static str, timeout: Duration },
    #[error("store error: {0}")]
    Store(String),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Persistence of the one current [`AuthRecord`] per user.
///
/// Every call carries its own deadline; implementations report expiry as
/// [`StoreError::Timeout`] and must not leave a partial write behind.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Upsert keyed by `record.user_id`, replacing the previous token's index entry.
    async fn save(&self, record: &AuthRecord, timeout: Duration) -> Result<(), StoreError>;

    /// Resolve the record owning `token` and check `token` against its stored hash.
    async fn verify_and_fetch(
        &self,
        token: &RefreshToken,
        timeout: Duration,
    ) -> Result<AuthRecord, StoreError>;
}

pub async fn bounded<T, F>(op: &'static str, timeout: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| StoreError::Timeout { op, timeout })?
}

/// Shared tail of `verify_and_fetch`: the candidate must still be indexed under this token and
/// its hash must verify. A missing candidate still pays for one hash verification.
pub async fn verify_candidate(
    hasher: &dyn CredentialHasher,
    token: &RefreshToken,
    candidate: Option<AuthRecord>,
) -> Result<AuthRecord, StoreError> {
    let Some(record) = candidate.filter(|r| r.lookup_key == token.lookup_key()) else {
        hasher.verify_against_decoy(token).await?;
        return Err(StoreError::NotFound);
    };

    if hasher
        .verify_refresh_token(token, &record.refresh_token_hash)
        .await?
    {
        Ok(record)
    } else {
        Err(StoreError::NotFound)
    }
}
