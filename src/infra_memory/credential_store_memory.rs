use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Process-local store for tests and single-instance runs.
///
/// `records` is authoritative. `index` may point at a record that has since moved on to another
/// token: briefly during a `save`, or for good when two saves for one user interleave. Lookups
/// through such an entry are rejected and the entry is dropped.
pub struct MemoryCredentialStore {
    records: DashMap<UserId, AuthRecord>,
    index: DashMap<String, UserId>,
    hasher: Arc<dyn CredentialHasher>,
}

impl MemoryCredentialStore {
    pub fn new(hasher: Arc<dyn CredentialHasher>) -> Self {
        MemoryCredentialStore {
            records: DashMap::new(),
            index: DashMap::new(),
            hasher,
        }
    }

    pub fn get(&self, user_id: UserId) -> Option<AuthRecord> {
        self.records.get(&user_id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn candidate(&self, lookup_key: &str) -> Option<AuthRecord> {
        let user_id = self.index.get(lookup_key).map(|e| *e.value())?;
        let record = self.get(user_id);
        if record.as_ref().is_none_or(|r| r.lookup_key != lookup_key) {
            self.index.remove_if(lookup_key, |_, owner| *owner == user_id);
        }
        record
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn save(&self, record: &AuthRecord, timeout: Duration) -> Result<(), StoreError> {
        bounded("memory.save", timeout, async {
            if let Some(previous) = self.records.insert(record.user_id, record.clone()) {
                if previous.lookup_key != record.lookup_key {
                    self.index.remove(&previous.lookup_key);
                }
            }
            self.index.insert(record.lookup_key.clone(), record.user_id);
            Ok(())
        })
        .await
    }

    async fn verify_and_fetch(
        &self,
        token: &RefreshToken,
        timeout: Duration,
    ) -> Result<AuthRecord, StoreError> {
        bounded("memory.verify_and_fetch", timeout, async {
            let candidate = self.candidate(&token.lookup_key());
            verify_candidate(self.hasher.as_ref(), token, candidate).await
        })
        .await
    }
}
