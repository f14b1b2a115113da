use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;
use std::time::Duration;

/// Issuance and rotation over a [`CredentialGenerator`] and a [`CredentialStore`].
///
/// New credentials are always minted before the store is touched and `save` is the last step,
/// so any failure leaves the previously stored token valid. Concurrent rotations presenting the
/// same token are not serialized: both may pass verification and the last `save` wins.
pub struct RealAuthService {
    generator: Arc<dyn CredentialGenerator>,
    store: Arc<dyn CredentialStore>,
    store_timeout: Duration,
}

impl RealAuthService {
    pub fn new(
        generator: Arc<dyn CredentialGenerator>,
        store: Arc<dyn CredentialStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            store,
            store_timeout,
        }
    }

    fn parse_user_id(raw: &str) -> Result<UserId, AuthError> {
        if raw.trim().is_empty() {
            return Err(AuthError::Validation("user id is empty".to_string()));
        }
        raw.parse::<UserId>()
            .map_err(|e| AuthError::Validation(format!("user id is not a valid UUID: {}", e)))
    }

    async fn mint(&self, user_id: UserId) -> Result<(TokenPair, AuthRecord), AuthError> {
        let access = self
            .generator
            .issue_access_token(user_id)
            .await
            .inspect_err(|e| error!(%user_id, error = %e, "failed to issue access token"))?;

        let refresh = self
            .generator
            .issue_refresh_token()
            .await
            .inspect_err(|e| error!(%user_id, error = %e, "failed to issue refresh token"))?;

        let record = AuthRecord {
            user_id,
            refresh_token_hash: refresh.hash,
            lookup_key: refresh.token.lookup_key(),
        };
        let pair = TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        };
        Ok((pair, record))
    }

    async fn persist(&self, record: &AuthRecord) -> Result<(), AuthError> {
        self.store
            .save(record, self.store_timeout)
            .await
            .inspect_err(|e| {
                error!(user_id = %record.user_id, error = %e, "failed to save refresh token hash")
            })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn issue_for_user(&self, user_id: &str) -> Result<TokenPair, AuthError> {
        let user_id = Self::parse_user_id(user_id)
            .inspect_err(|e| warn!(error = %e, "rejected issuance request"))?;

        let (pair, record) = self.mint(user_id).await?;
        self.persist(&record).await?;

        info!(%user_id, "token pair issued");
        Ok(pair)
    }

    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let presented = RefreshToken::parse(refresh_token).map_err(|e| {
            warn!(error = %e, "rejected malformed refresh token");
            AuthError::Validation(e.to_string())
        })?;

        let current = match self
            .store
            .verify_and_fetch(&presented, self.store_timeout)
            .await
        {
            Ok(record) => record,
            Err(StoreError::NotFound) => {
                warn!("refresh token does not match any stored credential");
                return Err(AuthError::Unauthorized);
            }
            Err(e) => {
                error!(error = %e, "failed to verify refresh token");
                return Err(e.into());
            }
        };

        let (pair, record) = self.mint(current.user_id).await?;
        self.persist(&record).await?;

        info!(user_id = %current.user_id, "refresh token rotated");
        Ok(pair)
    }

    async fn verify_token(&self, access_token: &str) -> Result<UserId, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::Validation("access token is empty".to_string()));
        }
        let verified = self
            .generator
            .verify_access_token(&AccessToken(access_token.to_string()))
            .inspect_err(|e| debug!(error = %e, "access token rejected"))?;
        Ok(verified.user_id)
    }
}
