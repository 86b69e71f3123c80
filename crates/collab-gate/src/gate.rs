//! Connection gate.
//!
//! Every transport funnels connection attempts through [`ConnectionGate`]:
//!
//! 1. Missing or empty credential: reject before any other work
//! 2. Verify the credential and extract the user id
//! 3. Ask the permission service what the user may do in the room
//!
//! Errors from each step propagate unchanged. No step is cached.

use crate::auth::{TokenVerifier, VerificationKey};
use crate::authz::PermissionResolver;
use crate::config::Config;
use crate::errors::{GateError, StartupError};
use crate::models::{AccessDescriptor, AuthenticatedUser};
use tracing::instrument;

/// Admission logic shared by every transport.
#[derive(Debug, Clone)]
pub struct ConnectionGate {
    verifier: TokenVerifier,
    resolver: PermissionResolver,
}

impl ConnectionGate {
    pub fn new(verifier: TokenVerifier, resolver: PermissionResolver) -> Self {
        Self { verifier, resolver }
    }

    /// Build the gate from configuration.
    ///
    /// # Errors
    ///
    /// Fails if the verification key or the permission callback URL is
    /// unusable. Both are fatal at startup.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let key = VerificationKey::load(config)?;
        let verifier = TokenVerifier::new(key, config.jwt_clock_skew());
        let resolver =
            PermissionResolver::new(&config.perm_callback_url, config.perm_check_timeout)?;

        Ok(Self::new(verifier, resolver))
    }

    /// Verification half: turn a raw credential into an identity.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if `raw_token` is absent or empty
    /// - `InvalidCredential` / `MissingIdentity` from verification
    pub fn identify(&self, raw_token: Option<&str>) -> Result<AuthenticatedUser, GateError> {
        let token = raw_token
            .filter(|token| !token.is_empty())
            .ok_or(GateError::MissingCredential)?;

        let claims = self.verifier.verify(token)?;
        let user_id = claims.user_id().ok_or(GateError::MissingIdentity)?;

        Ok(AuthenticatedUser {
            user_id: user_id.to_string(),
        })
    }

    /// Authorization half: resolve what `user` may do in `room`.
    ///
    /// # Errors
    ///
    /// - `InvalidRoom` if `room` is `.` or `..`
    /// - `PermissionServiceUnavailable` if the service cannot answer
    pub async fn authorize(
        &self,
        room: &str,
        user: &AuthenticatedUser,
    ) -> Result<AccessDescriptor, GateError> {
        self.resolver.resolve(room, &user.user_id).await
    }

    /// Full admission check for a connection to `room`.
    ///
    /// # Errors
    ///
    /// Any error from [`identify`](Self::identify) or
    /// [`authorize`](Self::authorize).
    #[instrument(skip_all, fields(room = %room))]
    pub async fn authenticate(
        &self,
        room: &str,
        raw_token: Option<&str>,
    ) -> Result<AccessDescriptor, GateError> {
        let user = self.identify(raw_token).map_err(|e| {
            tracing::debug!(target: "gate", room = %room, reason = e.kind(), "Credential rejected");
            e
        })?;

        self.authorize(room, &user).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::jwt::DEFAULT_CLOCK_SKEW;
    use gate_test_utils::{TestSigningKey, TestTokenBuilder};
    use std::time::Duration;

    fn gate_with_key(signing: &TestSigningKey) -> ConnectionGate {
        let key = VerificationKey::from_jwk_json(&signing.jwk_json()).unwrap();
        // Nothing listens here; identify never touches the network.
        let resolver =
            PermissionResolver::new("http://127.0.0.1:9/", Duration::from_millis(200)).unwrap();
        ConnectionGate::new(TokenVerifier::new(key, DEFAULT_CLOCK_SKEW), resolver)
    }

    #[test]
    fn test_identify_missing_credential() {
        let gate = gate_with_key(&TestSigningKey::ed25519(1));

        assert!(matches!(
            gate.identify(None).unwrap_err(),
            GateError::MissingCredential
        ));
        assert!(matches!(
            gate.identify(Some("")).unwrap_err(),
            GateError::MissingCredential
        ));
    }

    #[test]
    fn test_identify_valid_credential() {
        let signing = TestSigningKey::ed25519(1);
        let gate = gate_with_key(&signing);
        let token = TestTokenBuilder::for_user("alice").sign(&signing);

        let user = gate.identify(Some(&token)).unwrap();
        assert_eq!(user.user_id, "alice");
    }

    #[test]
    fn test_identify_invalid_credential() {
        let gate = gate_with_key(&TestSigningKey::ed25519(1));
        let token = TestTokenBuilder::for_user("alice").sign(&TestSigningKey::ed25519(2));

        assert!(matches!(
            gate.identify(Some(&token)).unwrap_err(),
            GateError::InvalidCredential
        ));
    }

    #[test]
    fn test_identify_missing_identity() {
        let signing = TestSigningKey::ed25519(1);
        let gate = gate_with_key(&signing);
        let token = TestTokenBuilder::without_user().sign(&signing);

        assert!(matches!(
            gate.identify(Some(&token)).unwrap_err(),
            GateError::MissingIdentity
        ));
    }

    #[tokio::test]
    async fn test_authenticate_short_circuits_on_missing_credential() {
        let gate = gate_with_key(&TestSigningKey::ed25519(1));

        let err = gate.authenticate("doc42", None).await.unwrap_err();
        assert!(matches!(err, GateError::MissingCredential));
    }
}
