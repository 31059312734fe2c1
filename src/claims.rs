//! JWT header, claim set and authenticated principal

use serde::{Deserialize, Serialize};

pub const TYP: &str = "JWT";
pub const ALG: &str = "HS256";

/// Default token lifetime in seconds.
pub const VALIDITY_SECONDS: u64 = 1800;

/// JOSE header. Fixed for this system: `{"typ":"JWT","alg":"HS256"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub typ: String,
    pub alg: String,
}

impl Default for Header {
    fn default() -> Self {
        Header { typ: TYP.into(), alg: ALG.into() }
    }
}

impl Header {
    pub fn is_supported(&self) -> bool {
        self.typ == TYP && self.alg == ALG
    }
}

/// Payload claims. `exp == iat + validity` for every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub org: String,
    pub roles: Vec<String>,
    pub iat: u64,
    pub exp: u64,
}

impl Claims {
    pub fn new(sub: impl Into<String>, org: impl Into<String>, roles: Vec<String>, iat: u64, validity: u64) -> Self {
        Claims { sub: sub.into(), org: org.into(), roles, iat, exp: iat.saturating_add(validity) }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.exp
    }
}

/// Who a verified token speaks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub sub: String,
    pub org: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Principal { sub: c.sub, org: c.org, roles: c.roles }
    }
}
