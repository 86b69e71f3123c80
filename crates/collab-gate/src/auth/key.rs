//! Verification key store.
//!
//! The key is loaded once at startup from a JWK and shared read-only by every
//! verification. Only public components are read; a private JWK (with `d`) is
//! accepted but `d` is never parsed or retained.
//!
//! Supported keys:
//! - `EC` / `P-256` (ES256)
//! - `EC` / `P-384` (ES384)
//! - `OKP` / `Ed25519` (EdDSA)

use crate::config::Config;
use common::jwt::decode_jwk_component;
use common::secret::ExposeSecret;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Errors loading the verification key. None of them carry key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key is not valid JWK JSON: {0}")]
    InvalidJson(String),

    #[error("unsupported key type '{0}'")]
    UnsupportedKeyType(String),

    #[error("unsupported curve '{0}'")]
    UnsupportedCurve(String),

    #[error("key is missing the '{0}' component")]
    MissingComponent(&'static str),

    #[error("key component '{0}' is malformed")]
    InvalidComponent(&'static str),

    #[error("key declares alg '{declared}' but its curve requires '{expected}'")]
    AlgorithmMismatch {
        declared: String,
        expected: &'static str,
    },
}

/// Public members of a JWK. Unknown members (including `d`) are ignored.
#[derive(Deserialize)]
struct PublicJwk {
    kty: String,

    #[serde(default)]
    crv: Option<String>,

    #[serde(default)]
    x: Option<String>,

    #[serde(default)]
    y: Option<String>,

    #[serde(default)]
    alg: Option<String>,
}

/// Process-wide verification key.
#[derive(Clone)]
pub struct VerificationKey {
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl VerificationKey {
    /// Load the key configured in `AUTH_PUBLIC_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the configured JWK is malformed or unsupported.
    /// Callers treat this as fatal.
    pub fn load(config: &Config) -> Result<Self, KeyError> {
        Self::from_jwk_json(config.auth_public_key.expose_secret())
    }

    /// Parse a JWK JSON document into a verification key.
    ///
    /// # Errors
    ///
    /// Returns `KeyError` if the document is not a supported public key.
    pub fn from_jwk_json(json: &str) -> Result<Self, KeyError> {
        let jwk: PublicJwk =
            serde_json::from_str(json).map_err(|e| KeyError::InvalidJson(e.to_string()))?;

        let (algorithm, decoding_key) = match (jwk.kty.as_str(), jwk.crv.as_deref()) {
            ("EC", Some("P-256")) => (Algorithm::ES256, ec_key(&jwk, 32)?),
            ("EC", Some("P-384")) => (Algorithm::ES384, ec_key(&jwk, 48)?),
            ("OKP", Some("Ed25519")) => (Algorithm::EdDSA, ed25519_key(&jwk)?),
            ("EC", crv) | ("OKP", crv) => {
                return Err(KeyError::UnsupportedCurve(
                    crv.unwrap_or("none").to_string(),
                ))
            }
            (kty, _) => return Err(KeyError::UnsupportedKeyType(kty.to_string())),
        };

        let expected = algorithm_name(algorithm);
        if let Some(declared) = jwk.alg {
            if declared != expected {
                return Err(KeyError::AlgorithmMismatch { declared, expected });
            }
        }

        tracing::debug!(target: "gate.auth.key", alg = expected, "Verification key loaded");

        Ok(Self {
            decoding_key,
            algorithm,
        })
    }

    /// The only algorithm credentials may be signed with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

fn ec_key(jwk: &PublicJwk, coordinate_len: usize) -> Result<DecodingKey, KeyError> {
    let x = jwk.x.as_deref().ok_or(KeyError::MissingComponent("x"))?;
    let y = jwk.y.as_deref().ok_or(KeyError::MissingComponent("y"))?;

    for (name, value) in [("x", x), ("y", y)] {
        let bytes = decode_jwk_component(value).map_err(|_| KeyError::InvalidComponent(name))?;
        if bytes.len() != coordinate_len {
            return Err(KeyError::InvalidComponent(name));
        }
    }

    DecodingKey::from_ec_components(x, y).map_err(|_| KeyError::InvalidComponent("x"))
}

fn ed25519_key(jwk: &PublicJwk) -> Result<DecodingKey, KeyError> {
    let x = jwk.x.as_deref().ok_or(KeyError::MissingComponent("x"))?;
    let bytes = decode_jwk_component(x).map_err(|_| KeyError::InvalidComponent("x"))?;
    if bytes.len() != 32 {
        return Err(KeyError::InvalidComponent("x"));
    }

    Ok(DecodingKey::from_ed_der(&bytes))
}

fn algorithm_name(algorithm: Algorithm) -> &'static str {
    match algorithm {
        Algorithm::ES256 => "ES256",
        Algorithm::ES384 => "ES384",
        Algorithm::EdDSA => "EdDSA",
        _ => "unsupported",
    }
}
