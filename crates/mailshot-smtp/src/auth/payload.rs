//! AUTH initial-response payloads.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use zeroize::{Zeroize, Zeroizing};

/// Base64-encoded SASL initial response, ready for the wire.
///
/// The bytes are wiped when the payload is dropped, and can be wiped early
/// with [`AuthPayload::wipe`]. `Debug` never shows them.
#[derive(Clone)]
pub struct AuthPayload(Zeroizing<Vec<u8>>);

impl AuthPayload {
    /// Wraps already-encoded bytes.
    #[must_use]
    pub fn new(encoded: Vec<u8>) -> Self {
        Self(Zeroizing::new(encoded))
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns true if the payload holds no bytes (for example after
    /// [`AuthPayload::wipe`]).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overwrites the bytes with zeros and empties the payload.
    pub fn wipe(&mut self) {
        self.0.zeroize();
    }
}

impl From<Vec<u8>> for AuthPayload {
    fn from(encoded: Vec<u8>) -> Self {
        Self::new(encoded)
    }
}

impl fmt::Debug for AuthPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthPayload(****)")
    }
}

/// Base64-encodes a raw SASL message into a payload.
///
/// The output buffer is sized up front and never reallocates, so no copy of
/// the encoded secret is left behind in freed memory.
#[must_use]
pub fn encode_payload(raw: &[u8]) -> AuthPayload {
    let len = base64::encoded_len(raw.len(), true).unwrap_or(0);
    let mut encoded = Zeroizing::new(vec![0u8; len]);
    let written = STANDARD.encode_slice(raw, &mut encoded[..]).unwrap_or(0);
    encoded.truncate(written);
    AuthPayload(encoded)
}

/// Generates the PLAIN initial response (RFC 4616).
///
/// Format: `\0<username>\0<password>`, base64 encoded. The unencoded
/// buffer is zeroed as soon as encoding is done.
#[must_use]
pub fn plain_payload(username: &str, password: &str) -> AuthPayload {
    let mut raw = Zeroizing::new(Vec::with_capacity(username.len() + password.len() + 2));
    raw.push(0);
    raw.extend_from_slice(username.as_bytes());
    raw.push(0);
    raw.extend_from_slice(password.as_bytes());

    let payload = encode_payload(&raw);
    raw.zeroize();
    payload
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_payload_format() {
        let payload = plain_payload("test", "pass");
        let decoded = STANDARD.decode(payload.as_bytes()).unwrap();
        assert_eq!(decoded, b"\0test\0pass");
    }

    #[test]
    fn test_plain_payload_known_value() {
        let payload = plain_payload("user", "pass");
        assert_eq!(payload.as_bytes(), b"AHVzZXIAcGFzcw==");
    }

    #[test]
    fn test_plain_payload_utf8() {
        let payload = plain_payload("jos\u{e9}@example.com", "p\u{e4}ss");
        let decoded = STANDARD.decode(payload.as_bytes()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "\0jos\u{e9}@example.com\0p\u{e4}ss"
        );
    }

    #[test]
    fn test_encode_payload_larger_than_one_chunk() {
        let raw = vec![0x5a_u8; 4000];
        let payload = encode_payload(&raw);
        assert_eq!(payload.as_bytes(), STANDARD.encode(&raw).as_bytes());
        assert_eq!(payload.as_bytes().len(), base64::encoded_len(4000, true).unwrap());
    }

    #[test]
    fn test_encode_payload_empty() {
        assert!(encode_payload(b"").is_empty());
    }

    #[test]
    fn test_wipe_empties_payload() {
        let mut payload = plain_payload("user", "secret");
        assert!(!payload.is_empty());
        payload.wipe();
        assert!(payload.is_empty());
    }

    #[test]
    fn test_debug_is_redacted() {
        let payload = plain_payload("user", "secret");
        let shown = format!("{payload:?}");
        assert_eq!(shown, "AuthPayload(****)");
    }
}
