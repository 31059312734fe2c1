//! Credential stores
//!
//! The issuer never sees how credentials are kept. It asks a
//! [`CredentialStore`] to resolve an `(organisation_uid, access_key)` pair
//! to an [`Identity`] and treats `None` as a bad credential, whatever the
//! reason.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::StoreError;

/// What a credential resolves to: the token subject and its roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn new(subject: impl Into<String>, roles: &[&str]) -> Self {
        Identity { subject: subject.into(), roles: roles.iter().map(|r| r.to_string()).collect() }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` for an unknown organisation and for a wrong key alike.
    async fn lookup(&self, organisation_uid: &str, access_key: &str) -> Result<Option<Identity>, StoreError>;
}

/// Stored form of one organisation's access key. The key itself is never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRecord {
    pub salt: String,
    pub key_hash: String,
    pub identity: Identity,
}

impl OrgRecord {
    pub fn new(access_key: &str, identity: Identity) -> Result<Self, StoreError> {
        let salt = generate_salt()?;
        let key_hash = hash_access_key(&salt, access_key);
        Ok(OrgRecord { salt, key_hash, identity })
    }

    /// Constant-time comparison against the stored hash.
    pub fn matches(&self, access_key: &str) -> bool {
        let computed = hash_access_key(&self.salt, access_key);
        computed.as_bytes().ct_eq(self.key_hash.as_bytes()).into()
    }
}

/// Random salt (16 bytes, hex encoded)
fn generate_salt() -> Result<String, StoreError> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(StoreError::Random)?;
    Ok(hex::encode(bytes))
}

/// SHA-256 of salt then key, hex encoded
fn hash_access_key(salt: &str, access_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(access_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salt hashed against when the organisation is unknown, so that path
/// costs the same as a wrong key.
const DECOY_SALT: &str = "00000000000000000000000000000000";

/// Resolve a fetched record against `access_key`. Hashes once whether or
/// not a record exists.
pub(crate) fn resolve(record: Option<&OrgRecord>, access_key: &str) -> Option<Identity> {
    match record {
        Some(r) if r.matches(access_key) => Some(r.identity.clone()),
        Some(_) => None,
        None => {
            std::hint::black_box(hash_access_key(DECOY_SALT, access_key));
            None
        }
    }
}

/// Reject blank identifiers before they reach a store.
pub(crate) fn check_registration(organisation_uid: &str, access_key: &str, identity: &Identity) -> Result<(), StoreError> {
    if organisation_uid.trim().is_empty() { return Err(StoreError::Invalid("organisation_uid must not be blank".into())); }
    if access_key.trim().is_empty() { return Err(StoreError::Invalid("access_key must not be blank".into())); }
    if identity.subject.trim().is_empty() { return Err(StoreError::Invalid("subject must not be blank".into())); }
    Ok(())
}

/// In-process store. Used by tests and by embedders with their own provisioning.
#[derive(Debug, Default)]
pub struct MemoryStore {
    orgs: RwLock<HashMap<String, OrgRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Add or replace the record for `organisation_uid`.
    pub fn register(&self, organisation_uid: &str, access_key: &str, identity: Identity) -> Result<(), StoreError> {
        check_registration(organisation_uid, access_key, &identity)?;
        let record = OrgRecord::new(access_key, identity)?;
        self.orgs.write().unwrap_or_else(|p| p.into_inner()).insert(organisation_uid.to_string(), record);
        Ok(())
    }

    pub fn remove(&self, organisation_uid: &str) -> bool {
        self.orgs.write().unwrap_or_else(|p| p.into_inner()).remove(organisation_uid).is_some()
    }

    pub fn len(&self) -> usize { self.orgs.read().unwrap_or_else(|p| p.into_inner()).len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn lookup(&self, organisation_uid: &str, access_key: &str) -> Result<Option<Identity>, StoreError> {
        let orgs = self.orgs.read().unwrap_or_else(|p| p.into_inner());
        Ok(resolve(orgs.get(organisation_uid), access_key))
    }
}
