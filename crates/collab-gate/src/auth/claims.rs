//! Credential claims.
//!
//! The `yuserid` field is redacted in Debug output to keep user identifiers
//! out of logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded payload of a verified credential.
///
/// Only `yuserid` is required for admission, and it is checked after
/// decoding so that a well-signed token without it surfaces as
/// `MissingIdentity` rather than a decode failure. Time claims are optional;
/// they are validated when present.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Authenticated user id - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yuserid: Option<String>,

    /// Expiration timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not-before timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl fmt::Debug for TokenClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClaims")
            .field("yuserid", &self.yuserid.as_ref().map(|_| "[REDACTED]"))
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .finish()
    }
}

impl TokenClaims {
    /// The user id, if present and non-empty.
    pub fn user_id(&self) -> Option<&str> {
        self.yuserid.as_deref().filter(|id| !id.is_empty())
    }
}
