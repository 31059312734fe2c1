#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jwtgate::{
    AuthService, Config, CredentialStore, FixedClock, Identity, MemoryStore, StoreError,
};

pub const ORG: &str = "b43e8794-906c-4ea1-bbf7-98a14da8ea44";
pub const ACCESS_KEY: &str = "4cc3ss-k3y";
pub const SECRET: &str = "test-signing-secret";
pub const NOW: u64 = 1_571_070_343;

pub fn store() -> Arc<MemoryStore> {
    let s = MemoryStore::new();
    s.register(ORG, ACCESS_KEY, Identity::new("davidsmiles", &["ADMIN"])).unwrap();
    Arc::new(s)
}

pub fn service_with(store: Arc<dyn CredentialStore>, clock: Arc<FixedClock>) -> AuthService {
    let mut config = Config::with_secret(SECRET);
    config.lookup_timeout_ms = 200;
    AuthService::new(&config, store, clock).unwrap()
}

pub fn service() -> (AuthService, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(NOW));
    (service_with(store(), clock.clone()), clock)
}

/// Counts lookups and never matches.
#[derive(Default)]
pub struct CountingStore(pub AtomicUsize);

#[async_trait]
impl CredentialStore for CountingStore {
    async fn lookup(&self, _: &str, _: &str) -> Result<Option<Identity>, StoreError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

impl CountingStore {
    pub fn calls(&self) -> usize { self.0.load(Ordering::SeqCst) }
}

/// Answers after `delay`.
pub struct SlowStore(pub Duration);

#[async_trait]
impl CredentialStore for SlowStore {
    async fn lookup(&self, _: &str, _: &str) -> Result<Option<Identity>, StoreError> {
        tokio::time::sleep(self.0).await;
        Ok(Some(Identity::new("late", &[])))
    }
}

/// Always fails.
pub struct BrokenStore;

#[async_trait]
impl CredentialStore for BrokenStore {
    async fn lookup(&self, _: &str, _: &str) -> Result<Option<Identity>, StoreError> {
        Err(StoreError::Invalid("disk on fire".into()))
    }
}
