//! XOAUTH2 SASL layout (Google/Microsoft proprietary).
//!
//! Initial response: `user=<user>\x01auth=Bearer <token>\x01\x01`, base64
//! encoded. When the token is rejected the server answers with a `334`
//! challenge carrying a base64 JSON status object.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mailshot_smtp::AuthPayload;
use mailshot_smtp::auth::encode_payload;
use serde::Deserialize;
use zeroize::Zeroizing;

/// Builds the XOAUTH2 initial response.
///
/// The cleartext layout only lives in a zeroizing buffer.
///
/// # Example
///
/// ```
/// use mailshot_oauth::sasl::xoauth2_payload;
///
/// let payload = xoauth2_payload("user@example.com", "ya29.a0...");
/// assert!(!payload.is_empty());
/// ```
#[must_use]
pub fn xoauth2_payload(user: &str, token: &str) -> AuthPayload {
    const USER: &str = "user=";
    const BEARER: &str = "\x01auth=Bearer ";
    const END: &str = "\x01\x01";

    let mut raw = Zeroizing::new(String::with_capacity(
        USER.len() + user.len() + BEARER.len() + token.len() + END.len(),
    ));
    raw.push_str(USER);
    raw.push_str(user);
    raw.push_str(BEARER);
    raw.push_str(token);
    raw.push_str(END);
    encode_payload(raw.as_bytes())
}

/// Error object sent in an XOAUTH2 failure challenge.
///
/// `{"status":"401","schemes":"bearer","scope":"https://mail.google.com/"}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthError {
    /// HTTP-like status code.
    pub status: String,
    /// Authentication schemes supported.
    #[serde(default)]
    pub schemes: String,
    /// Scope required.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Parses the JSON status object of a failure challenge.
///
/// # Errors
///
/// Returns an error if the text is not the expected JSON object.
pub fn parse_oauth_error(json: &str) -> Result<OAuthError, serde_json::Error> {
    serde_json::from_str(json)
}

/// Finds and decodes the XOAUTH2 failure challenge in a reply text.
///
/// Looks for a `334 <base64>` line; anything else yields `None`.
#[must_use]
pub fn decode_error_challenge(reply_text: &str) -> Option<OAuthError> {
    reply_text.lines().find_map(|line| {
        let encoded = line.strip_prefix("334 ")?;
        let json = STANDARD.decode(encoded.trim()).ok()?;
        parse_oauth_error(std::str::from_utf8(&json).ok()?).ok()
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn decode(payload: &AuthPayload) -> String {
        String::from_utf8(STANDARD.decode(payload.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn test_xoauth2_format() {
        let payload = xoauth2_payload("test@test.com", "abc");
        assert_eq!(decode(&payload), "user=test@test.com\x01auth=Bearer abc\x01\x01");
    }

    #[test]
    fn test_xoauth2_long_token() {
        let token = "x".repeat(2500);
        let payload = xoauth2_payload("user@example.com", &token);
        assert_eq!(
            decode(&payload),
            format!("user=user@example.com\x01auth=Bearer {token}\x01\x01")
        );
    }

    #[test]
    fn test_payload_is_base64() {
        let payload = xoauth2_payload("user@example.com", "token");
        let text = std::str::from_utf8(payload.as_bytes()).unwrap();
        assert!(!text.contains("user@example.com"));
        assert!(!text.contains("token"));
    }

    #[test]
    fn test_parse_oauth_error() {
        let json = r#"{"status":"401","schemes":"bearer","scope":"https://mail.google.com/"}"#;
        let error = parse_oauth_error(json).unwrap();

        assert_eq!(error.status, "401");
        assert_eq!(error.schemes, "bearer");
        assert_eq!(error.scope.as_deref(), Some("https://mail.google.com/"));
    }

    #[test]
    fn test_decode_error_challenge() {
        let encoded = STANDARD.encode(r#"{"status":"400","schemes":"Bearer"}"#);
        let text = format!("334 {encoded}\n535-5.7.8 Username and Password not accepted");

        let error = decode_error_challenge(&text).unwrap();
        assert_eq!(error.status, "400");
        assert_eq!(error.scope, None);
    }

    #[test]
    fn test_decode_error_challenge_absent() {
        assert_eq!(decode_error_challenge("535 5.7.8 Bad credentials"), None);
        assert_eq!(decode_error_challenge("334 not-base64!"), None);
    }
}
