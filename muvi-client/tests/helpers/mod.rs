//! Shared helpers for muvi-client integration tests
#![allow(dead_code)]

pub mod fake_catalog;
pub mod fakes;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Unsigned JWT carrying `sub` and `exp`
pub fn test_token(sub: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{}","exp":{}}}"#, sub, exp));
    format!("{}.{}.sig", header, payload)
}

/// Token valid for the next hour
pub fn fresh_token(sub: &str) -> String {
    test_token(sub, chrono::Utc::now().timestamp() + 3600)
}
