//! Bearer token verification
//!
//! Checks run in a fixed order and the first failure decides the outcome:
//!
//! 1. missing   - no header, or `Bearer` with nothing after it
//! 2. malformed - wrong scheme, not three segments, undecodable header or
//!    payload, unsupported `alg`/`typ`
//! 3. signature - HMAC mismatch (constant-time)
//! 4. expiry    - `now >= exp`
//!
//! A tampered payload therefore reports "invalid" even when it also claims
//! an expired `exp`.

use std::sync::Arc;

use crate::claims::{Claims, Header, Principal};
use crate::clock::Clock;
use crate::codec::{self, Segments};
use crate::error::AuthenticationError;
use crate::signing::SigningKey;

pub const BEARER: &str = "Bearer";

/// Why a token was refused. Finer than what callers see; only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    Missing,
    Scheme,
    Segments,
    Header,
    Payload,
    SignatureEncoding,
    Signature,
    Expired,
}

impl Rejection {
    fn outcome(self) -> AuthenticationError {
        match self {
            Rejection::Missing => AuthenticationError::TokenMissing,
            Rejection::Expired => AuthenticationError::TokenExpired,
            _ => AuthenticationError::TokenInvalid,
        }
    }
}

/// Pull the token out of an `Authorization` header value. The scheme is
/// matched case-insensitively.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthenticationError> {
    extract(authorization).map_err(Rejection::outcome)
}

fn extract(authorization: Option<&str>) -> Result<&str, Rejection> {
    let value = authorization.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(Rejection::Missing);
    }
    let (scheme, token) = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) => (scheme, rest.trim()),
        None => (value, ""),
    };
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return Err(Rejection::Scheme);
    }
    if token.is_empty() {
        return Err(Rejection::Missing);
    }
    Ok(token)
}

pub struct Verifier {
    key: SigningKey,
    clock: Arc<dyn Clock>,
}

impl Verifier {
    pub fn new(key: SigningKey, clock: Arc<dyn Clock>) -> Self {
        Verifier { key, clock }
    }

    /// Gate for protected requests: header value in, principal out.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthenticationError> {
        let claims = extract(authorization).and_then(|token| self.check(token)).map_err(|r| {
            tracing::debug!(reason = ?r, "bearer token rejected");
            r.outcome()
        })?;
        Ok(claims.into())
    }

    /// Verify a bare compact token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthenticationError> {
        if token.trim().is_empty() {
            return Err(AuthenticationError::TokenMissing);
        }
        self.check(token).map_err(Rejection::outcome)
    }

    fn check(&self, token: &str) -> Result<Claims, Rejection> {
        let seg = Segments::split(token).ok_or(Rejection::Segments)?;
        let header: Header = codec::decode_segment(seg.header).ok_or(Rejection::Header)?;
        if !header.is_supported() {
            return Err(Rejection::Header);
        }
        let claims: Claims = codec::decode_segment(seg.payload).ok_or(Rejection::Payload)?;
        let signature = codec::b64_decode(seg.signature).ok_or(Rejection::SignatureEncoding)?;
        if !self.key.verify(&seg.signing_input(), &signature) {
            return Err(Rejection::Signature);
        }
        if claims.is_expired(self.clock.now()) {
            return Err(Rejection::Expired);
        }
        Ok(claims)
    }
}
