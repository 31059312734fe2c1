//! jwtgate - organisation access-key authorization with HS256 JWTs
//!
//! An [`Issuer`] trades an `(organisation_uid, access_key)` pair for a
//! short-lived signed token. A [`Verifier`] gates protected requests on
//! that token. Both are stateless apart from the shared secret; credentials
//! live behind the [`CredentialStore`] capability.

use std::sync::Arc;

pub mod claims;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod issuer;
pub mod lmdb;
pub mod signing;
pub mod store;
pub mod verifier;

#[cfg(feature = "server")]
pub mod server;

pub use claims::{Claims, Header, Principal, VALIDITY_SECONDS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError};
pub use error::{AuthenticationError, DependencyError, Error, Result, StoreError, ValidationError};
pub use issuer::{Credential, IssuedToken, Issuer};
pub use lmdb::LmdbStore;
pub use signing::SigningKey;
pub use store::{CredentialStore, Identity, MemoryStore};
pub use verifier::Verifier;

/// Issuer and verifier sharing one secret and one clock.
pub struct AuthService {
    pub issuer: Issuer,
    pub verifier: Verifier,
}

impl AuthService {
    pub fn new(config: &Config, store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let key = SigningKey::new(config.secret.as_bytes()).map_err(|_| ConfigError::Blank("secret"))?;
        Ok(AuthService {
            issuer: Issuer::new(key.clone(), store, clock.clone(), config.token_validity_secs, config.lookup_timeout()),
            verifier: Verifier::new(key, clock),
        })
    }

    pub async fn authorize(&self, credential: &Credential) -> Result<IssuedToken> {
        self.issuer.authorize(credential).await
    }

    pub fn authenticate(&self, authorization: Option<&str>) -> std::result::Result<Principal, AuthenticationError> {
        self.verifier.authenticate(authorization)
    }
}
