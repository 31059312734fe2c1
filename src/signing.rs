//! HMAC-SHA256 token signatures

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::codec;

type HmacSha256 = Hmac<Sha256>;

/// Shared secret, pre-keyed. Cloned per operation, never mutated.
#[derive(Clone)]
pub struct SigningKey {
    mac: HmacSha256,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Rejected key material.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("signing secret must not be empty")]
pub struct EmptySecret;

impl SigningKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, EmptySecret> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(EmptySecret);
        }
        // HMAC takes keys of any length.
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| EmptySecret)?;
        Ok(SigningKey { mac })
    }

    /// Raw 32-byte tag over `input`.
    pub fn tag(&self, input: &[u8]) -> [u8; 32] {
        let mut mac = self.mac.clone();
        mac.update(input);
        mac.finalize().into_bytes().into()
    }

    /// base64url signature segment for `signing_input`.
    pub fn sign(&self, signing_input: &str) -> String {
        codec::b64_encode(self.tag(signing_input.as_bytes()))
    }

    /// Constant-time check of a decoded signature.
    pub fn verify(&self, signing_input: &str, signature: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        mac.verify_slice(signature).is_ok()
    }
}
