use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Size of the random secret behind every refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

/// Opaque refresh secret, URL-safe base64 without padding.
///
/// Only constructed from fresh random bytes or through [`RefreshToken::parse`], so a value of
/// this type always has the canonical encoding of exactly [`REFRESH_TOKEN_BYTES`] bytes.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenFormatError {
    #[error("refresh token is empty")]
    Empty,
    #[error("refresh token is not url-safe base64")]
    Encoding,
    #[error("refresh token has {0} bytes, expected {REFRESH_TOKEN_BYTES}")]
    Length(usize),
}

impl RefreshToken {
    pub fn from_bytes(bytes: &[u8; REFRESH_TOKEN_BYTES]) -> Self {
        RefreshToken(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn parse(raw: &str) -> Result<Self, TokenFormatError> {
        if raw.is_empty() {
            return Err(TokenFormatError::Empty);
        }
        let decoded = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|_| TokenFormatError::Encoding)?;
        if decoded.len() != REFRESH_TOKEN_BYTES {
            return Err(TokenFormatError::Length(decoded.len()));
        }
        Ok(RefreshToken(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deterministic fingerprint used as the store index. Never the verification hash.
    pub fn lookup_key(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(**redacted**)")
    }
}

/// What the caller receives on issuance and rotation.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}
