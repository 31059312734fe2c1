//! LMDB-backed credential store
//!
//! Storage pattern: `orgs` database, `organisation_uid` → JSON [`OrgRecord`].

use std::path::Path;

use async_trait::async_trait;
use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};

use crate::error::StoreError;
use crate::store::{check_registration, resolve, CredentialStore, Identity, OrgRecord};

/// LMDB rejects keys longer than this.
const MAX_KEY_BYTES: usize = 511;

type OrgDb = Database<Str, Str>;

#[derive(Clone)]
pub struct LmdbStore {
    env: Env,
    orgs: OrgDb,
}

impl std::fmt::Debug for LmdbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LmdbStore").field("path", &self.env.path()).finish()
    }
}

impl LmdbStore {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let env = unsafe { EnvOpenOptions::new().map_size(1 << 30).max_dbs(1).open(path)? };
        let mut wtxn = env.write_txn()?;
        let orgs: OrgDb = env.create_database(&mut wtxn, Some("orgs"))?;
        wtxn.commit()?;
        tracing::debug!(path = %path.display(), "credential store opened");
        Ok(LmdbStore { env, orgs })
    }

    /// Add or replace the access key for `organisation_uid`.
    pub fn register(&self, organisation_uid: &str, access_key: &str, identity: Identity) -> Result<(), StoreError> {
        check_registration(organisation_uid, access_key, &identity)?;
        if organisation_uid.len() > MAX_KEY_BYTES {
            return Err(StoreError::Invalid(format!("organisation_uid longer than {} bytes", MAX_KEY_BYTES)));
        }
        let record = OrgRecord::new(access_key, identity)?;
        let value = serde_json::to_string(&record).map_err(|source| StoreError::Corrupted {
            organisation_uid: organisation_uid.to_string(),
            source,
        })?;
        let mut wtxn = self.env.write_txn()?;
        self.orgs.put(&mut wtxn, organisation_uid, &value)?;
        wtxn.commit()?;
        tracing::info!(organisation_uid, subject = %record.identity.subject, "organisation registered");
        Ok(())
    }

    pub fn remove(&self, organisation_uid: &str) -> Result<bool, StoreError> {
        if !is_storable(organisation_uid) { return Ok(false); }
        let mut wtxn = self.env.write_txn()?;
        let removed = self.orgs.delete(&mut wtxn, organisation_uid)?;
        wtxn.commit()?;
        Ok(removed)
    }

    /// All organisations with their identities, in key order.
    pub fn list(&self) -> Result<Vec<(String, Identity)>, StoreError> {
        let rtxn = self.env.read_txn()?;
        let mut r = Vec::new();
        for item in self.orgs.iter(&rtxn)? {
            let (org, value) = item?;
            r.push((org.to_string(), parse_record(org, value)?.identity));
        }
        Ok(r)
    }

    /// Fetch the stored record without checking a key.
    pub fn record(&self, organisation_uid: &str) -> Result<Option<OrgRecord>, StoreError> {
        fetch(&self.env, self.orgs, organisation_uid)
    }
}

fn is_storable(organisation_uid: &str) -> bool {
    !organisation_uid.is_empty() && organisation_uid.len() <= MAX_KEY_BYTES
}

fn parse_record(organisation_uid: &str, value: &str) -> Result<OrgRecord, StoreError> {
    serde_json::from_str(value).map_err(|source| StoreError::Corrupted { organisation_uid: organisation_uid.to_string(), source })
}

fn fetch(env: &Env, orgs: OrgDb, organisation_uid: &str) -> Result<Option<OrgRecord>, StoreError> {
    // Unstorable keys cannot exist; answering None keeps them a bad credential, not a store failure.
    if !is_storable(organisation_uid) { return Ok(None); }
    let rtxn = env.read_txn()?;
    match orgs.get(&rtxn, organisation_uid)? {
        Some(value) => Ok(Some(parse_record(organisation_uid, value)?)),
        None => Ok(None),
    }
}

#[async_trait]
impl CredentialStore for LmdbStore {
    async fn lookup(&self, organisation_uid: &str, access_key: &str) -> Result<Option<Identity>, StoreError> {
        let (env, orgs) = (self.env.clone(), self.orgs);
        let org = organisation_uid.to_string();
        let record = tokio::task::spawn_blocking(move || fetch(&env, orgs, &org)).await??;
        Ok(resolve(record.as_ref(), access_key))
    }
}
