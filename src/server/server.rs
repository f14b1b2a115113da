use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use std::sync::Arc;
use std::time::Duration;

/// Wiring of the token lifecycle engine behind the HTTP api.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    /// Upper bound on each api call, see `http.timeout_ms`.
    pub request_timeout: Duration,
}

impl Server {
    pub fn new(auth_service: Arc<dyn AuthService>, request_timeout: Duration) -> Self {
        Self {
            auth_service,
            request_timeout,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2CredentialHasher::try_new()?);

        let generator: Arc<dyn CredentialGenerator> = Arc::new(JwtCredentialGenerator::new(
            JwtConfig {
                access_ttl: settings.auth.access_ttl(),
                signing_key: settings.auth.signing_secret.clone().into_bytes(),
                entropy_timeout: settings.auth.entropy_timeout(),
            },
            hasher.clone(),
        ));

        let store: Arc<dyn CredentialStore> = match settings.store.backend.as_str() {
            "memory" => {
                warn!("using the in-memory credential store; tokens are lost on restart");
                Arc::new(MemoryCredentialStore::new(hasher))
            }
            "redis" => {
                let dsn = settings
                    .store
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.redis_dsn is not set"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisCredentialStore::new(
                    redis_manager,
                    settings.store.key_prefix.clone(),
                    hasher,
                ))
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            generator,
            store,
            settings.auth.store_timeout(),
        ));

        info!(backend = %settings.store.backend, "credential store ready");
        Ok(Self::new(auth_service, settings.http.timeout()))
    }
}
