//! Compact JWT serialization: base64url JSON segments joined by `.`

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// base64url, no padding on encode, padding tolerated on decode
const B64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn b64_encode(data: impl AsRef<[u8]>) -> String {
    B64URL.encode(data)
}

pub fn b64_decode(s: &str) -> Option<Vec<u8>> {
    B64URL.decode(s).ok()
}

/// Serialize `value` to JSON and base64url-encode it.
pub fn encode_segment<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(b64_encode(serde_json::to_vec(value)?))
}

/// Inverse of [`encode_segment`]. `None` on bad base64 or bad JSON.
pub fn decode_segment<T: DeserializeOwned>(segment: &str) -> Option<T> {
    serde_json::from_slice(&b64_decode(segment)?).ok()
}

/// The three raw parts of a compact token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments<'a> {
    pub header: &'a str,
    pub payload: &'a str,
    pub signature: &'a str,
}

impl<'a> Segments<'a> {
    /// Exactly three non-empty dot-separated segments, or `None`.
    pub fn split(token: &'a str) -> Option<Self> {
        let mut it = token.split('.');
        let (header, payload, signature) = (it.next()?, it.next()?, it.next()?);
        if it.next().is_some() || header.is_empty() || payload.is_empty() || signature.is_empty() {
            return None;
        }
        Some(Segments { header, payload, signature })
    }

    /// Bytes covered by the signature.
    pub fn signing_input(&self) -> String {
        signing_input(self.header, self.payload)
    }
}

pub fn signing_input(header: &str, payload: &str) -> String {
    format!("{}.{}", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{Claims, Header};

    #[test]
    fn segment_round_trip_is_lossless() {
        let claims = Claims {
            sub: "davidsmiles".into(),
            org: "b43e8794-906c-4ea1-bbf7-98a14da8ea44".into(),
            roles: vec!["ADMIN".into()],
            iat: 1571070343,
            exp: 1571072143,
        };
        let seg = encode_segment(&claims).unwrap();
        assert_eq!(decode_segment::<Claims>(&seg), Some(claims));
        assert_eq!(decode_segment::<Header>(&encode_segment(&Header::default()).unwrap()), Some(Header::default()));
    }

    #[test]
    fn header_segment_matches_well_known_prefix() {
        // {"typ":"JWT","alg":"HS256"}
        assert_eq!(encode_segment(&Header::default()).unwrap(), "eyJ0eXAiOiJKV1QiLCJhbGciOiJIUzI1NiJ9");
    }

    #[test]
    fn decode_accepts_padding_and_emits_none() {
        assert_eq!(b64_encode(b"a"), "YQ");
        assert_eq!(b64_decode("YQ"), Some(b"a".to_vec()));
        assert_eq!(b64_decode("YQ=="), Some(b"a".to_vec()));
        assert_eq!(b64_decode("Y+Q"), None);
        assert_eq!(b64_encode([0xfb, 0xff]), "-_8");
    }

    #[test]
    fn decode_segment_rejects_garbage() {
        assert_eq!(decode_segment::<Header>("!!!"), None);
        assert_eq!(decode_segment::<Header>(&b64_encode("not json")), None);
        assert_eq!(decode_segment::<Claims>(&b64_encode(r#"{"sub":"x"}"#)), None);
    }

    #[test]
    fn split_requires_three_non_empty_parts() {
        let s = Segments::split("a.b.c").unwrap();
        assert_eq!((s.header, s.payload, s.signature), ("a", "b", "c"));
        assert_eq!(s.signing_input(), "a.b");
        for bad in ["", "a", "a.b", "a.b.c.d", ".b.c", "a..c", "a.b.", "..", "..."] {
            assert_eq!(Segments::split(bad), None, "{bad}");
        }
    }
}
