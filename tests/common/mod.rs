#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use turnstile::application_impl::*;
use turnstile::application_port::*;
use turnstile::domain_model::*;
use turnstile::domain_port::*;
use turnstile::infra_memory::MemoryCredentialStore;

pub const SIGNING_SECRET: &[u8] = b"integration-test-signing-secret-0123456789";
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn cheap_hasher() -> Arc<Argon2CredentialHasher> {
    Arc::new(Argon2CredentialHasher::with_params(64, 1, 1).expect("argon2 params"))
}

pub fn generator(hasher: Arc<dyn CredentialHasher>, access_ttl: Duration) -> Arc<JwtCredentialGenerator> {
    Arc::new(JwtCredentialGenerator::new(
        JwtConfig {
            access_ttl,
            signing_key: SIGNING_SECRET.to_vec(),
            entropy_timeout: Duration::from_secs(5),
        },
        hasher,
    ))
}

/// Wraps the memory store, counting calls and optionally failing or stalling them.
pub struct InstrumentedStore {
    pub inner: MemoryCredentialStore,
    pub saves: AtomicUsize,
    pub lookups: AtomicUsize,
    pub fail_saves: AtomicBool,
    pub stall: AtomicBool,
}

impl InstrumentedStore {
    pub fn new(hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            inner: MemoryCredentialStore::new(hasher),
            saves: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
            stall: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst) + self.lookups.load(Ordering::SeqCst)
    }

    async fn maybe_stall(&self) {
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    }
}

#[async_trait::async_trait]
impl CredentialStore for InstrumentedStore {
    async fn save(&self, record: &AuthRecord, timeout: Duration) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        bounded("instrumented.save", timeout, async {
            self.maybe_stall().await;
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::Store("injected save failure".to_string()));
            }
            self.inner.save(record, timeout).await
        })
        .await
    }

    async fn verify_and_fetch(
        &self,
        token: &RefreshToken,
        timeout: Duration,
    ) -> Result<AuthRecord, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        bounded("instrumented.verify_and_fetch", timeout, async {
            self.maybe_stall().await;
            self.inner.verify_and_fetch(token, timeout).await
        })
        .await
    }
}

/// Generator whose calls can be made to fail.
pub struct FaultyGenerator {
    pub inner: Arc<JwtCredentialGenerator>,
    pub fail_signing: AtomicBool,
    pub fail_entropy: AtomicBool,
}

#[async_trait::async_trait]
impl CredentialGenerator for FaultyGenerator {
    async fn issue_access_token(&self, user: UserId) -> Result<IssuedAccessToken, CredentialError> {
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(CredentialError::Signing("injected signing failure".to_string()));
        }
        self.inner.issue_access_token(user).await
    }

    async fn issue_refresh_token(&self) -> Result<IssuedRefreshToken, CredentialError> {
        if self.fail_entropy.load(Ordering::SeqCst) {
            return Err(CredentialError::Entropy("injected entropy failure".to_string()));
        }
        self.inner.issue_refresh_token().await
    }

    fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<TokenVerifyResult, CredentialError> {
        self.inner.verify_access_token(token)
    }
}

pub struct Harness {
    pub generator: Arc<FaultyGenerator>,
    pub store: Arc<InstrumentedStore>,
    pub service: Arc<RealAuthService>,
}

pub fn harness() -> Harness {
    harness_with(Duration::from_secs(900), STORE_TIMEOUT)
}

pub fn harness_with(access_ttl: Duration, store_timeout: Duration) -> Harness {
    let hasher = cheap_hasher();
    let generator = Arc::new(FaultyGenerator {
        inner: generator(hasher.clone(), access_ttl),
        fail_signing: AtomicBool::new(false),
        fail_entropy: AtomicBool::new(false),
    });
    let store = Arc::new(InstrumentedStore::new(hasher));
    let service = Arc::new(RealAuthService::new(
        generator.clone(),
        store.clone(),
        store_timeout,
    ));
    Harness {
        generator,
        store,
        service,
    }
}
