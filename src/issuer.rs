//! Token issuance: credential check, store lookup, JWT minting

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::claims::{Claims, Header};
use crate::clock::Clock;
use crate::codec;
use crate::error::{AuthenticationError, DependencyError, Error, Result, ValidationError};
use crate::signing::SigningKey;
use crate::store::CredentialStore;

/// Organisation credential as posted to `/authorise`. Missing and `null`
/// fields read as blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(default, deserialize_with = "null_as_blank")]
    pub organisation_uid: String,
    #[serde(default, deserialize_with = "null_as_blank")]
    pub access_key: String,
}

fn null_as_blank<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Credential {
    pub fn new(organisation_uid: impl Into<String>, access_key: impl Into<String>) -> Self {
        Credential { organisation_uid: organisation_uid.into(), access_key: access_key.into() }
    }

    /// First blank field wins, `organisation_uid` before `access_key`.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.organisation_uid.trim().is_empty() { return Err(ValidationError::Blank("organisation_uid")); }
        if self.access_key.trim().is_empty() { return Err(ValidationError::Blank("access_key")); }
        Ok(())
    }
}

/// A freshly minted token together with its decoded claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

pub struct Issuer {
    key: SigningKey,
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    validity: u64,
    lookup_timeout: Duration,
}

impl Issuer {
    pub fn new(key: SigningKey, store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>, validity: u64, lookup_timeout: Duration) -> Self {
        Issuer { key, store, clock, validity, lookup_timeout }
    }

    pub fn validity(&self) -> u64 { self.validity }

    /// Validate, look up and sign. See [`Error`] for the outcomes.
    pub async fn authorize(&self, credential: &Credential) -> Result<IssuedToken> {
        credential.validate()?;
        let org = credential.organisation_uid.as_str();

        let lookup = self.store.lookup(org, &credential.access_key);
        let identity = match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Err(_) => {
                tracing::error!(organisation_uid = org, timeout_ms = self.lookup_timeout.as_millis() as u64, "credential lookup timed out");
                return Err(DependencyError::Timeout.into());
            }
            Ok(Err(e)) => {
                tracing::error!(organisation_uid = org, error = %e, "credential lookup failed");
                return Err(DependencyError::Unavailable(e).into());
            }
            Ok(Ok(None)) => {
                tracing::warn!(organisation_uid = org, "rejected credential");
                return Err(AuthenticationError::InvalidCredential.into());
            }
            Ok(Ok(Some(identity))) => identity,
        };

        let claims = Claims::new(identity.subject, org, identity.roles, self.clock.now(), self.validity);
        let token = self.mint(&claims)?;
        tracing::info!(organisation_uid = org, sub = %claims.sub, exp = claims.exp, "token issued");
        Ok(IssuedToken { token, claims })
    }

    /// Encode and sign `claims` as-is. No credential check.
    pub fn mint(&self, claims: &Claims) -> Result<String> {
        encode_token(&self.key, claims)
    }
}

/// `b64(header).b64(claims).b64(hmac)`
pub fn encode_token(key: &SigningKey, claims: &Claims) -> Result<String> {
    let header = codec::encode_segment(&Header::default()).map_err(Error::Encoding)?;
    let payload = codec::encode_segment(claims).map_err(Error::Encoding)?;
    let input = codec::signing_input(&header, &payload);
    let signature = key.sign(&input);
    Ok(format!("{}.{}", input, signature))
}
