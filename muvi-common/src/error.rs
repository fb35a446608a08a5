//! Common error types for MUVI

use std::collections::BTreeMap;
use thiserror::Error;

/// Common result type for MUVI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Field name → message, ordered so rendering is stable
pub type FieldErrors = BTreeMap<String, String>;

/// Identity provider failure categories
///
/// Derived from the provider's error code (`UserNotConfirmedException` etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityErrorKind {
    UserNotConfirmed,
    NotAuthorized,
    PasswordResetRequired,
    UserNotFound,
    UsernameExists,
    CodeMismatch,
    ExpiredCode,
    InvalidParameter,
    Other,
}

impl IdentityErrorKind {
    /// Map a provider error code to a kind
    ///
    /// Codes may arrive fully qualified (`com.amazonaws...#NotAuthorizedException`);
    /// only the part after the last `#` is significant.
    pub fn from_code(code: &str) -> Self {
        let code = code.rsplit('#').next().unwrap_or(code);
        match code {
            "UserNotConfirmedException" => Self::UserNotConfirmed,
            "NotAuthorizedException" => Self::NotAuthorized,
            "PasswordResetRequiredException" => Self::PasswordResetRequired,
            "UserNotFoundException" => Self::UserNotFound,
            "UsernameExistsException" => Self::UsernameExists,
            "CodeMismatchException" => Self::CodeMismatch,
            "ExpiredCodeException" => Self::ExpiredCode,
            "InvalidParameterException" | "InvalidPasswordException" => Self::InvalidParameter,
            _ => Self::Other,
        }
    }
}

/// Common error types across MUVI crates
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure (connection refused, DNS, TLS, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Remote service answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Identity provider rejected the request
    #[error("Identity error ({kind:?}): {message}")]
    Identity {
        kind: IdentityErrorKind,
        message: String,
    },

    /// Client-side form validation failed; no request was sent
    #[error("Validation failed: {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// Client store error (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Shorthand for an identity error built from a provider code
    pub fn identity(code: &str, message: impl Into<String>) -> Self {
        Error::Identity {
            kind: IdentityErrorKind::from_code(code),
            message: message.into(),
        }
    }

    /// Identity kind, if this is an identity failure
    pub fn identity_kind(&self) -> Option<IdentityErrorKind> {
        match self {
            Error::Identity { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Inline message shown to the user
    pub fn user_message(&self) -> String {
        match self {
            Error::Identity { kind, message } => match kind {
                IdentityErrorKind::UserNotConfirmed => {
                    "Please verify your email before logging in.".to_string()
                }
                IdentityErrorKind::NotAuthorized => "Incorrect username or password.".to_string(),
                IdentityErrorKind::PasswordResetRequired => {
                    "Password reset required. Please reset your password.".to_string()
                }
                IdentityErrorKind::UserNotFound => "User does not exist.".to_string(),
                IdentityErrorKind::UsernameExists => {
                    "You already have an account. Please log in.".to_string()
                }
                _ if !message.is_empty() => message.clone(),
                _ => "Request failed.".to_string(),
            },
            Error::Api { message, .. } if !message.is_empty() => message.clone(),
            Error::InvalidInput(message) => message.clone(),
            Error::Validation(fields) => fields
                .values()
                .cloned()
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_kind_from_plain_code() {
        assert_eq!(
            IdentityErrorKind::from_code("UserNotFoundException"),
            IdentityErrorKind::UserNotFound
        );
        assert_eq!(
            IdentityErrorKind::from_code("SomethingNew"),
            IdentityErrorKind::Other
        );
    }

    #[test]
    fn test_identity_kind_from_qualified_code() {
        let kind = IdentityErrorKind::from_code(
            "com.amazonaws.cognito.identity.idp.model#NotAuthorizedException",
        );
        assert_eq!(kind, IdentityErrorKind::NotAuthorized);
    }

    #[test]
    fn test_user_message_for_login_failures() {
        let err = Error::identity("UserNotConfirmedException", "User is not confirmed.");
        assert_eq!(err.user_message(), "Please verify your email before logging in.");

        let err = Error::identity("NotAuthorizedException", "Incorrect username or password.");
        assert_eq!(err.user_message(), "Incorrect username or password.");

        let err = Error::identity("PasswordResetRequiredException", "");
        assert_eq!(
            err.user_message(),
            "Password reset required. Please reset your password."
        );
    }

    #[test]
    fn test_user_message_falls_back_to_provider_text() {
        let err = Error::identity("CodeMismatchException", "Invalid verification code provided");
        assert_eq!(err.user_message(), "Invalid verification code provided");
    }

    #[test]
    fn test_user_message_for_api_error_prefers_body_message() {
        let err = Error::Api {
            status: 400,
            message: "title already exists".to_string(),
        };
        assert_eq!(err.user_message(), "title already exists");
    }
}
