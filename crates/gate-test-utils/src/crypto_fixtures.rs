//! Cryptographic fixtures for testing
//!
//! Ed25519 keys are deterministic from a seed. ECDSA keys are generated fresh
//! with `ring` each time, since ring cannot derive them from a seed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, EcdsaSigningAlgorithm, Ed25519KeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
    ECDSA_P384_SHA384_FIXED_SIGNING,
};
use serde::Serialize;
use serde_json::{json, Value};

/// A signing key together with its public JWK.
pub struct TestSigningKey {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    jwk: Value,
}

impl TestSigningKey {
    /// Deterministic Ed25519 key. The same seed always produces the same key.
    pub fn ed25519(seed: u8) -> Self {
        let mut seed_bytes = [0u8; 32];
        seed_bytes[0] = seed;
        for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
            *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
        }

        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
            .expect("Failed to create test Ed25519 keypair");
        let public_key = key_pair.public_key().as_ref();

        Self {
            algorithm: Algorithm::EdDSA,
            encoding_key: EncodingKey::from_ed_der(&build_pkcs8_from_seed(&seed_bytes)),
            jwk: json!({
                "kty": "OKP",
                "crv": "Ed25519",
                "x": URL_SAFE_NO_PAD.encode(public_key),
                "use": "sig"
            }),
        }
    }

    /// Fresh P-256 key (ES256).
    pub fn p256() -> Self {
        Self::ecdsa(&ECDSA_P256_SHA256_FIXED_SIGNING, Algorithm::ES256, "P-256")
    }

    /// Fresh P-384 key (ES384).
    pub fn p384() -> Self {
        Self::ecdsa(&ECDSA_P384_SHA384_FIXED_SIGNING, Algorithm::ES384, "P-384")
    }

    fn ecdsa(signing: &'static EcdsaSigningAlgorithm, algorithm: Algorithm, crv: &str) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(signing, &rng)
            .expect("Failed to generate test ECDSA key");
        let key_pair = EcdsaKeyPair::from_pkcs8(signing, pkcs8.as_ref(), &rng)
            .expect("Failed to parse generated ECDSA key");

        // Uncompressed point: 0x04 || x || y
        let point = key_pair.public_key().as_ref();
        let coordinate_len = (point.len() - 1) / 2;
        let x = &point[1..=coordinate_len];
        let y = &point[1 + coordinate_len..];

        Self {
            algorithm,
            encoding_key: EncodingKey::from_ec_der(pkcs8.as_ref()),
            jwk: json!({
                "kty": "EC",
                "crv": crv,
                "x": URL_SAFE_NO_PAD.encode(x),
                "y": URL_SAFE_NO_PAD.encode(y),
                "use": "sig"
            }),
        }
    }

    /// Algorithm tokens are signed with.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Public JWK.
    pub fn jwk(&self) -> &Value {
        &self.jwk
    }

    /// Public JWK as the JSON string expected in `AUTH_PUBLIC_KEY`.
    pub fn jwk_json(&self) -> String {
        self.jwk.to_string()
    }

    /// Sign arbitrary claims with this key's algorithm.
    pub fn sign<T: Serialize>(&self, claims: &T) -> String {
        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());

        encode(&header, claims, &self.encoding_key).expect("Failed to sign test token")
    }
}

/// Build PKCS#8 v1 document from Ed25519 seed.
///
/// Ring does not expose PKCS#8 for seeded Ed25519 keys, so it is built here.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    let mut pkcs8 = Vec::with_capacity(48);

    // SEQUENCE, 46 bytes
    pkcs8.extend_from_slice(&[0x30, 0x2e]);
    // Version: INTEGER 0
    pkcs8.extend_from_slice(&[0x02, 0x01, 0x00]);
    // AlgorithmIdentifier: SEQUENCE { OID 1.3.101.112 }
    pkcs8.extend_from_slice(&[0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
    // privateKey: OCTET STRING { OCTET STRING (32-byte seed) }
    pkcs8.extend_from_slice(&[0x04, 0x22, 0x04, 0x20]);
    pkcs8.extend_from_slice(seed);

    pkcs8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ed25519_is_deterministic() {
        assert_eq!(
            TestSigningKey::ed25519(1).jwk_json(),
            TestSigningKey::ed25519(1).jwk_json()
        );
        assert_ne!(
            TestSigningKey::ed25519(1).jwk_json(),
            TestSigningKey::ed25519(2).jwk_json()
        );
    }

    #[test]
    fn test_ecdsa_coordinates_have_curve_length() {
        let p256 = TestSigningKey::p256();
        let x = URL_SAFE_NO_PAD
            .decode(p256.jwk()["x"].as_str().unwrap())
            .unwrap();
        assert_eq!(x.len(), 32);

        let p384 = TestSigningKey::p384();
        let y = URL_SAFE_NO_PAD
            .decode(p384.jwk()["y"].as_str().unwrap())
            .unwrap();
        assert_eq!(y.len(), 48);
    }

    #[test]
    fn test_sign_produces_compact_jws() {
        let key = TestSigningKey::p384();
        let token = key.sign(&json!({"yuserid": "alice"}));
        assert_eq!(token.split('.').count(), 3);
    }
}
