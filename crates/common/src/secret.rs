//! Secret types for values that must never reach a log line.
//!
//! Re-exports the [`secrecy`] types used for verification-key JSON and raw
//! bearer credentials. `SecretString` implements `Debug` with redaction, so a
//! struct deriving `Debug` stays safe to log even when it holds one.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct KeySource {
//!     name: String,
//!     jwk: SecretString,
//! }
//!
//! let source = KeySource {
//!     name: "AUTH_PUBLIC_KEY".to_string(),
//!     jwk: SecretString::from(r#"{"kty":"OKP"}"#),
//! };
//!
//! assert!(!format!("{source:?}").contains("OKP"));
//! assert_eq!(source.jwk.expose_secret(), r#"{"kty":"OKP"}"#);
//! ```

pub use secrecy::{ExposeSecret, SecretString};
