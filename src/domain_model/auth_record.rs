use super::UserId;

/// The persisted per-user credential state.
///
/// `lookup_key` is the SHA-256 fingerprint of the current refresh token. Stores index on it so
/// that a presented token resolves to exactly one user, whose argon2 hash is then checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRecord {
    pub user_id: UserId,
    pub refresh_token_hash: String,
    pub lookup_key: String,
}
