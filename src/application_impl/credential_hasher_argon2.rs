use crate::application_port::*;
use crate::domain_model::*;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use tokio::task;

const SALT_LEN: usize = 16;

/// Argon2id hashing of refresh secrets, run on the blocking pool.
///
/// A fresh salt is drawn from the OS for every hash, so hashing the same secret twice yields two
/// different PHC strings.
#[derive(Clone)]
pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
    decoy_hash: String,
}

impl Argon2CredentialHasher {
    /// Default argon2id work factor.
    pub fn try_new() -> Result<Self, CredentialError> {
        Self::with_argon2(Argon2::default())
    }

    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, CredentialError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;
        Self::with_argon2(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn with_argon2(argon2: Argon2<'static>) -> Result<Self, CredentialError> {
        let mut decoy = [0u8; REFRESH_TOKEN_BYTES];
        fill_random(&mut decoy)?;
        let decoy_hash = hash_secret(&argon2, RefreshToken::from_bytes(&decoy).as_str())?;
        Ok(Self { argon2, decoy_hash })
    }
}

fn fill_random(buf: &mut [u8]) -> Result<(), CredentialError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CredentialError::Entropy(e.to_string()))
}

fn hash_secret(argon2: &Argon2<'_>, secret: &str) -> Result<String, CredentialError> {
    let mut salt = [0u8; SALT_LEN];
    fill_random(&mut salt)?;
    let salt = SaltString::encode_b64(&salt).map_err(|e| CredentialError::Hashing(e.to_string()))?;
    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hashing(e.to_string()))?
        .to_string();
    Ok(hash)
}

fn verify_secret(argon2: &Argon2<'_>, secret: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| CredentialError::Hashing(format!("invalid PHC hash: {}", e)))?;

    match argon2.verify_password(secret.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CredentialError::Hashing(format!("verify error: {}", e))),
    }
}

#[async_trait::async_trait]
impl CredentialHasher for Argon2CredentialHasher {
    async fn hash_refresh_token(&self, token: &RefreshToken) -> Result<String, CredentialError> {
        let argon2 = self.argon2.clone();
        let secret = token.as_str().to_owned();
        task::spawn_blocking(move || hash_secret(&argon2, &secret))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
    }

    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
        hash: &str,
    ) -> Result<bool, CredentialError> {
        let argon2 = self.argon2.clone();
        let secret = token.as_str().to_owned();
        let hash = hash.to_owned();
        task::spawn_blocking(move || verify_secret(&argon2, &secret, &hash))
            .await
            .map_err(|e| CredentialError::Hashing(e.to_string()))?
    }

    async fn verify_against_decoy(&self, token: &RefreshToken) -> Result<(), CredentialError> {
        let decoy_hash = self.decoy_hash.clone();
        self.verify_refresh_token(token, &decoy_hash).await?;
        Ok(())
    }
}
