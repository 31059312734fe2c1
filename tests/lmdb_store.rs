//! LMDB credential store tests

use std::sync::Arc;

use jwtgate::{Config, Credential, CredentialStore, FixedClock, Identity, LmdbStore, AuthService};
use tempfile::TempDir;

fn setup() -> (TempDir, LmdbStore) {
    let dir = TempDir::new().unwrap();
    let store = LmdbStore::open(dir.path().join("creds.mdb")).unwrap();
    (dir, store)
}

#[tokio::test]
async fn test_register_and_lookup() {
    let (_dir, store) = setup();
    store.register("org-a", "key-a", Identity::new("alice", &["ADMIN", "AUDITOR"])).unwrap();

    let id = store.lookup("org-a", "key-a").await.unwrap().unwrap();
    assert_eq!(id.subject, "alice");
    assert_eq!(id.roles, vec!["ADMIN", "AUDITOR"]);

    assert_eq!(store.lookup("org-a", "key-b").await.unwrap(), None);
    assert_eq!(store.lookup("org-b", "key-a").await.unwrap(), None);
}

#[tokio::test]
async fn test_unstorable_org_is_not_an_error() {
    let (_dir, store) = setup();
    assert_eq!(store.lookup("", "k").await.unwrap(), None);
    let huge = "x".repeat(4096);
    assert_eq!(store.lookup(&huge, "k").await.unwrap(), None);
    assert!(store.register(&huge, "k", Identity::new("a", &[])).is_err());
}

#[test]
fn test_access_key_not_stored_in_clear() {
    let (_dir, store) = setup();
    store.register("org-a", "super-secret-key", Identity::new("alice", &[])).unwrap();
    let rec = store.record("org-a").unwrap().unwrap();
    assert!(!rec.key_hash.contains("super-secret-key"));
    assert!(!rec.salt.contains("super-secret-key"));
    assert!(rec.matches("super-secret-key"));
}

#[tokio::test]
async fn test_register_replaces_key() {
    let (_dir, store) = setup();
    store.register("org-a", "old", Identity::new("alice", &[])).unwrap();
    store.register("org-a", "new", Identity::new("alice", &["ADMIN"])).unwrap();
    assert_eq!(store.lookup("org-a", "old").await.unwrap(), None);
    assert_eq!(store.lookup("org-a", "new").await.unwrap(), Some(Identity::new("alice", &["ADMIN"])));
}

#[tokio::test]
async fn test_remove_and_list() {
    let (_dir, store) = setup();
    store.register("org-b", "kb", Identity::new("bob", &[])).unwrap();
    store.register("org-a", "ka", Identity::new("alice", &[])).unwrap();

    let orgs: Vec<String> = store.list().unwrap().into_iter().map(|(o, _)| o).collect();
    assert_eq!(orgs, vec!["org-a", "org-b"]);

    assert!(store.remove("org-a").unwrap());
    assert!(!store.remove("org-a").unwrap());
    assert!(!store.remove("").unwrap());
    assert_eq!(store.lookup("org-a", "ka").await.unwrap(), None);
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_blank_registration_rejected() {
    let (_dir, store) = setup();
    assert!(store.register("", "k", Identity::new("a", &[])).is_err());
    assert!(store.register("o", " ", Identity::new("a", &[])).is_err());
    assert!(store.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_issuer_over_lmdb() {
    let (_dir, store) = setup();
    store.register("org-a", "ka", Identity::new("alice", &["ADMIN"])).unwrap();
    let svc = AuthService::new(&Config::with_secret("s"), Arc::new(store), Arc::new(FixedClock::new(1_000))).unwrap();

    let issued = svc.authorize(&Credential::new("org-a", "ka")).await.unwrap();
    let p = svc.authenticate(Some(&format!("Bearer {}", issued.token))).unwrap();
    assert_eq!((p.sub.as_str(), p.org.as_str()), ("alice", "org-a"));
    assert_eq!(svc.authorize(&Credential::new("org-a", "kb")).await.unwrap_err().status_code(), 401);
}
