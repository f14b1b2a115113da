use crate::application_port::*;
use crate::domain_model::*;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::{task, time};

#[derive(Clone)]
pub struct JwtConfig {
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
    /// Upper bound on waiting for the OS randomness source.
    pub entropy_timeout: Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_ttl", &self.access_ttl)
            .field("signing_key", &"**redacted**")
            .field("entropy_timeout", &self.entropy_timeout)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String, // user id as string
    iat: i64,
    exp: i64,
}

/// HS512 access tokens plus argon2-hashed random refresh secrets.
pub struct JwtCredentialGenerator {
    cfg: JwtConfig,
    hasher: Arc<dyn CredentialHasher>,
}

impl JwtCredentialGenerator {
    pub fn new(cfg: JwtConfig, hasher: Arc<dyn CredentialHasher>) -> Self {
        JwtCredentialGenerator { cfg, hasher }
    }

    fn access_ttl(&self) -> Result<TimeDelta, CredentialError> {
        TimeDelta::from_std(self.cfg.access_ttl).map_err(|e| CredentialError::Signing(e.to_string()))
    }

    #[inline]
    fn parse_user_id(sub: &str) -> Result<UserId, CredentialError> {
        sub.parse::<UserId>().map_err(|_| CredentialError::TokenInvalid)
    }

    #[inline]
    fn timestamp(secs: i64) -> Result<DateTime<Utc>, CredentialError> {
        DateTime::from_timestamp(secs, 0).ok_or(CredentialError::TokenInvalid)
    }
}

fn draw_secret() -> Result<[u8; REFRESH_TOKEN_BYTES], CredentialError> {
    let mut secret = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut secret)
        .map_err(|e| CredentialError::Entropy(e.to_string()))?;
    Ok(secret)
}

#[async_trait::async_trait]
impl CredentialGenerator for JwtCredentialGenerator {
    async fn issue_access_token(&self, user: UserId) -> Result<IssuedAccessToken, CredentialError> {
        if self.cfg.signing_key.is_empty() {
            return Err(CredentialError::Signing("signing key is empty".to_string()));
        }

        let iat_dt = Utc::now();
        let exp_dt = iat_dt
            .checked_add_signed(self.access_ttl()?)
            .ok_or_else(|| {
                CredentialError::Signing("access token expiry out of range".to_string())
            })?;
        let claims = AccessClaims {
            sub: user.to_string(),
            iat: iat_dt.timestamp(),
            exp: exp_dt.timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(&self.cfg.signing_key),
        )
        .map_err(|e| CredentialError::Signing(e.to_string()))?;

        Ok(IssuedAccessToken {
            token: AccessToken(token),
            expires_at: exp_dt,
        })
    }

    async fn issue_refresh_token(&self) -> Result<IssuedRefreshToken, CredentialError> {
        let secret = time::timeout(self.cfg.entropy_timeout, task::spawn_blocking(draw_secret))
            .await
            .map_err(|_| CredentialError::Entropy("timed out waiting for randomness".to_string()))?
            .map_err(|e| CredentialError::Entropy(e.to_string()))??;

        let token = RefreshToken::from_bytes(&secret);
        let hash = self.hasher.hash_refresh_token(&token).await?;
        Ok(IssuedRefreshToken { token, hash })
    }

    fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, CredentialError> {
        let mut v = Validation::new(Algorithm::HS512);
        v.validate_exp = true;
        v.leeway = 0;
        v.set_required_spec_claims(&["exp", "sub"]);
        let data = decode::<AccessClaims>(
            &token.0,
            &DecodingKey::from_secret(&self.cfg.signing_key),
            &v,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => CredentialError::TokenExpired,
            _ => CredentialError::TokenInvalid,
        })?;

        Ok(TokenVerifyResult {
            user_id: Self::parse_user_id(&data.claims.sub)?,
            issued_at: Self::timestamp(data.claims.iat)?,
            expires_at: Self::timestamp(data.claims.exp)?,
        })
    }
}
