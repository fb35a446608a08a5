//! JWT claim decoding
//!
//! Tokens are only inspected, never verified: the identity service verifies them on
//! every call that matters, and the client only needs `sub` and `exp`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use muvi_common::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub exp: Option<i64>,
    pub email: Option<String>,
    pub token_use: Option<String>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT
    pub fn decode(token: &str) -> Result<Self> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) => payload,
            _ => return Err(Error::Parse("Token is not a JWT".to_string())),
        };

        // Some issuers pad the segment; the URL-safe engine here does not accept padding
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| Error::Parse(format!("Token payload is not base64: {}", e)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Parse(format!("Token payload is not JSON: {}", e)))
    }

    /// True while `exp` lies after `now` (unix seconds)
    pub fn is_valid_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp > now)
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}
