//! Credential verification.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only the verification key's own algorithm is accepted
//! - `exp` and `nbf` are validated with clock skew leeway, `iat` with the same
//!   tolerance, each only when present
//! - All failures surface as `InvalidCredential`; the cause is logged at debug

use crate::auth::claims::TokenClaims;
use crate::auth::key::VerificationKey;
use crate::errors::GateError;
use common::jwt::{check_token_size, validate_iat};
use jsonwebtoken::{decode, Validation};
use std::collections::HashSet;
use std::time::Duration;

/// Verifies credentials against the process-wide key.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    key: VerificationKey,
    clock_skew: Duration,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(key: VerificationKey, clock_skew: Duration) -> Self {
        let mut validation = Validation::new(key.algorithm());
        // Time claims are optional; validated only when present.
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = clock_skew.as_secs();

        Self {
            key,
            clock_skew,
            validation,
        }
    }

    /// Verify a credential and return its claims.
    ///
    /// # Errors
    ///
    /// - `InvalidCredential` - oversized, malformed, bad signature, wrong
    ///   algorithm, expired, not yet valid, or issued in the future
    /// - `MissingIdentity` - verified, but no non-empty `yuserid`
    pub fn verify(&self, token: &str) -> Result<TokenClaims, GateError> {
        check_token_size(token).map_err(|e| {
            tracing::debug!(target: "gate.auth.verifier", error = ?e, "Token rejected before decoding");
            GateError::InvalidCredential
        })?;

        let token_data = decode::<TokenClaims>(token, self.key.decoding_key(), &self.validation)
            .map_err(|e| {
                tracing::debug!(target: "gate.auth.verifier", error = %e, "Token verification failed");
                GateError::InvalidCredential
            })?;
        let claims = token_data.claims;

        if let Some(iat) = claims.iat {
            if let Err(e) = validate_iat(iat, self.clock_skew) {
                tracing::debug!(target: "gate.auth.verifier", error = ?e, "Token iat validation failed");
                return Err(GateError::InvalidCredential);
            }
        }

        if claims.user_id().is_none() {
            tracing::debug!(target: "gate.auth.verifier", "Verified token carries no user id");
            return Err(GateError::MissingIdentity);
        }

        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_JWT_SIZE_BYTES};
    use gate_test_utils::{TestSigningKey, TestTokenBuilder};

    fn verifier_for(signing: &TestSigningKey) -> TokenVerifier {
        let key = VerificationKey::from_jwk_json(&signing.jwk_json()).unwrap();
        TokenVerifier::new(key, DEFAULT_CLOCK_SKEW)
    }

    #[test]
    fn test_valid_ed25519_token() {
        let signing = TestSigningKey::ed25519(1);
        let token = TestTokenBuilder::for_user("alice").sign(&signing);

        let claims = verifier_for(&signing).verify(&token).unwrap();
        assert_eq!(claims.user_id(), Some("alice"));
    }

    #[test]
    fn test_valid_p384_token() {
        let signing = TestSigningKey::p384();
        let token = TestTokenBuilder::for_user("alice").sign(&signing);

        let claims = verifier_for(&signing).verify(&token).unwrap();
        assert_eq!(claims.user_id(), Some("alice"));
    }

    #[test]
    fn test_token_without_time_claims_is_accepted() {
        let signing = TestSigningKey::p256();
        let token = TestTokenBuilder::for_user("alice")
            .without_time_claims()
            .sign(&signing);

        let claims = verifier_for(&signing).verify(&token).unwrap();
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let signing = TestSigningKey::ed25519(1);
        let other = TestSigningKey::ed25519(2);
        let token = TestTokenBuilder::for_user("alice").sign(&other);

        let err = verifier_for(&signing).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::InvalidCredential));
    }

    #[test]
    fn test_algorithm_mismatch_is_invalid() {
        let p384 = TestSigningKey::p384();
        let p256 = TestSigningKey::p256();
        let token = TestTokenBuilder::for_user("alice").sign(&p256);

        let err = verifier_for(&p384).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::InvalidCredential));
    }

    #[test]
    fn test_unsigned_token_is_invalid() {
        let signing = TestSigningKey::ed25519(1);
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"yuserid":"alice"}"#);
        let token = format!("{header}.{payload}.c2ln");

        let err = verifier_for(&signing).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::InvalidCredential));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let signing = TestSigningKey::ed25519(1);
        let token = TestTokenBuilder::for_user("alice").expired().sign(&signing);

        let err = verifier_for(&signing).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::InvalidCredential));
    }

    #[test]
    fn test_recently_expired_token_within_skew_is_accepted() {
        let signing = TestSigningKey::ed25519(1);
        let token = TestTokenBuilder::for_user("alice")
            .expires_in_secs(-30)
            .sign(&signing);

        assert!(verifier_for(&signing).verify(&token).is_ok());
    }

    #[test]
    fn test_not_yet_valid_token_is_invalid() {
        let signing = TestSigningKey::ed25519(1);
        let now = chrono::Utc::now().timestamp();
        let token = TestTokenBuilder::for_user("alice")
            .not_before(now + 3600)
            .sign(&signing);

        let err = verifier_for(&signing).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::InvalidCredential));
    }

    #[test]
    fn test_future_iat_is_invalid() {
        let signing = TestSigningKey::ed25519(1);
        let now = chrono::Utc::now().timestamp();
        let token = TestTokenBuilder::for_user("alice")
            .issued_at(now + 3600)
            .sign(&signing);

        let err = verifier_for(&signing).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::InvalidCredential));
    }

    #[test]
    fn test_missing_user_id_is_missing_identity() {
        let signing = TestSigningKey::ed25519(1);
        let token = TestTokenBuilder::without_user().sign(&signing);

        let err = verifier_for(&signing).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::MissingIdentity));
    }

    #[test]
    fn test_empty_user_id_is_missing_identity() {
        let signing = TestSigningKey::ed25519(1);
        let token = TestTokenBuilder::for_user("").sign(&signing);

        let err = verifier_for(&signing).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::MissingIdentity));
    }

    #[test]
    fn test_oversized_token_is_invalid() {
        let signing = TestSigningKey::ed25519(1);
        let token = "a".repeat(MAX_JWT_SIZE_BYTES + 1);

        let err = verifier_for(&signing).verify(&token).unwrap_err();
        assert!(matches!(err, GateError::InvalidCredential));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let signing = TestSigningKey::ed25519(1);
        let verifier = verifier_for(&signing);

        for token in ["", "not-a-jwt", "a.b", "a.b.c", "!!!.@@@.###"] {
            let err = verifier.verify(token).unwrap_err();
            assert!(
                matches!(err, GateError::InvalidCredential),
                "token {token:?} should be invalid"
            );
        }
    }
}
