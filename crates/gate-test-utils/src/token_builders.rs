//! Builder for connection credentials.

use crate::crypto_fixtures::TestSigningKey;
use chrono::Utc;
use serde_json::{Map, Value};

/// Default lifetime of a built token.
const DEFAULT_TTL_SECS: i64 = 3600;

/// Builder for credential claims.
///
/// Defaults: `iat` now and `exp` one hour out.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::for_user("alice")
///     .expires_in_secs(60)
///     .sign(&key);
/// ```
#[derive(Debug, Clone)]
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Token carrying `yuserid`.
    pub fn for_user(user_id: &str) -> Self {
        Self::without_user().claim("yuserid", Value::from(user_id))
    }

    /// Well-formed token with no `yuserid`.
    pub fn without_user() -> Self {
        let now = Utc::now().timestamp();
        let mut claims = Map::new();
        claims.insert("iat".to_string(), Value::from(now));
        claims.insert("exp".to_string(), Value::from(now + DEFAULT_TTL_SECS));
        Self { claims }
    }

    /// Drop `exp`, `iat` and `nbf`.
    pub fn without_time_claims(mut self) -> Self {
        for name in ["exp", "iat", "nbf"] {
            self.claims.remove(name);
        }
        self
    }

    /// Set `exp` relative to now. Negative values are in the past.
    pub fn expires_in_secs(self, secs: i64) -> Self {
        let exp = Utc::now().timestamp() + secs;
        self.claim("exp", Value::from(exp))
    }

    /// Expired well beyond any accepted clock skew.
    pub fn expired(self) -> Self {
        self.expires_in_secs(-DEFAULT_TTL_SECS)
    }

    pub fn issued_at(self, iat: i64) -> Self {
        self.claim("iat", Value::from(iat))
    }

    pub fn not_before(self, nbf: i64) -> Self {
        self.claim("nbf", Value::from(nbf))
    }

    /// Set any claim.
    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Sign the claims with `key`.
    pub fn sign(&self, key: &TestSigningKey) -> String {
        key.sign(&self.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_user_sets_defaults() {
        let builder = TestTokenBuilder::for_user("alice");
        let claims = builder.claims();

        assert_eq!(claims["yuserid"], "alice");
        let iat = claims["iat"].as_i64().unwrap();
        let exp = claims["exp"].as_i64().unwrap();
        assert_eq!(exp - iat, DEFAULT_TTL_SECS);
    }

    #[test]
    fn test_without_time_claims() {
        let builder = TestTokenBuilder::for_user("alice")
            .not_before(0)
            .without_time_claims();

        assert_eq!(builder.claims().len(), 1);
        assert!(builder.claims().contains_key("yuserid"));
    }

    #[test]
    fn test_expired_is_in_the_past() {
        let builder = TestTokenBuilder::for_user("alice").expired();
        let exp = builder.claims()["exp"].as_i64().unwrap();
        assert!(exp < Utc::now().timestamp() - 600);
    }
}
