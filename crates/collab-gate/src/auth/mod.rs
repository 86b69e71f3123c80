//! Credential verification.
//!
//! - `key` - process-wide verification key loaded from a JWK
//! - `claims` - decoded credential payload
//! - `verifier` - signature and claim validation

pub mod claims;
pub mod key;
pub mod verifier;

pub use claims::TokenClaims;
pub use key::{KeyError, VerificationKey};
pub use verifier::TokenVerifier;
