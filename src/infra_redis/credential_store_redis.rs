use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, FromRedisValue, RedisError, RedisResult, RedisWrite, Script, ToRedisArgs, Value,
};
use std::sync::Arc;
use std::time::Duration;

const CREDENTIAL_SAVE: &str = include_str!("credential_save.lua");

const HASH_FIELD: &str = "refresh_token_hash";
const LOOKUP_FIELD: &str = "lookup_key";

/// Layout:
/// - `{prefix}:user:{user_id}` hash with `refresh_token_hash` and `lookup_key`
/// - `{prefix}:lookup:{lookup_key}` string holding the owning user id
pub struct RedisCredentialStore {
    conn: ConnectionManager,
    prefix: String,
    hasher: Arc<dyn CredentialHasher>,
}

impl RedisCredentialStore {
    pub fn new(
        conn: ConnectionManager,
        prefix: impl Into<String>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        RedisCredentialStore {
            conn,
            prefix: prefix.into(),
            hasher,
        }
    }

    fn user_key(&self, user_id: UserId) -> String {
        user_key(&self.prefix, user_id)
    }

    fn index_key(&self, lookup_key: &str) -> String {
        format!("{}{}", index_prefix(&self.prefix), lookup_key)
    }

    async fn candidate(&self, lookup_key: &str) -> Result<Option<AuthRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let user_id: Option<UserId> = conn
            .get(self.index_key(lookup_key))
            .await
            .map_err(store_error)?;
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let (hash, stored_lookup): (Option<String>, Option<String>) = redis::cmd("HMGET")
            .arg(self.user_key(user_id))
            .arg(HASH_FIELD)
            .arg(LOOKUP_FIELD)
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(match (hash, stored_lookup) {
            (Some(refresh_token_hash), Some(lookup_key)) => Some(AuthRecord {
                user_id,
                refresh_token_hash,
                lookup_key,
            }),
            _ => None,
        })
    }
}

fn user_key(prefix: &str, user_id: UserId) -> String {
    format!("{}:user:{}", prefix, user_id)
}

fn index_prefix(prefix: &str) -> String {
    format!("{}:lookup:", prefix)
}

fn store_error(e: RedisError) -> StoreError {
    StoreError::Store(e.to_string())
}

impl ToRedisArgs for UserId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.to_string().as_bytes())
    }
}

impl FromRedisValue for UserId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        let user_id = s.parse::<UserId>().map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid UserId string",
                e.to_string(),
            ))
        })?;
        Ok(user_id)
    }
}

#[async_trait::async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn save(&self, record: &AuthRecord, timeout: Duration) -> Result<(), StoreError> {
        bounded("redis.save", timeout, async {
            let mut conn = self.conn.clone();
            let script = Script::new(CREDENTIAL_SAVE);
            let _: i64 = script
                .key(self.user_key(record.user_id))
                .key(self.index_key(&record.lookup_key))
                .arg(&record.refresh_token_hash)
                .arg(&record.lookup_key)
                .arg(record.user_id)
                .arg(index_prefix(&self.prefix))
                .invoke_async(&mut conn)
                .await
                .map_err(store_error)?;
            Ok(())
        })
        .await
    }

    async fn verify_and_fetch(
        &self,
        token: &RefreshToken,
        timeout: Duration,
    ) -> Result<AuthRecord, StoreError> {
        bounded("redis.verify_and_fetch", timeout, async {
            let candidate = self.candidate(&token.lookup_key()).await?;
            verify_candidate(self.hasher.as_ref(), token, candidate).await
        })
        .await
    }
}
