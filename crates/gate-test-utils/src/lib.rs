//! # Gate Test Utilities
//!
//! Shared test utilities for collab-gate.
//!
//! This crate provides:
//! - Signing key fixtures (Ed25519, P-256, P-384) with matching public JWKs
//! - Credential builder (`TestTokenBuilder`)
//! - Mock permission service (wiremock)
//! - Recording engine that captures admitted connections
//! - Server test harness (`TestGateServer`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gate_test_utils::*;
//!
//! let key = TestSigningKey::p384();
//! let token = TestTokenBuilder::for_user("alice").sign(&key);
//! ```

pub mod crypto_fixtures;
pub mod permission_service;
pub mod recording_engine;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use permission_service::*;
pub use recording_engine::*;
pub use server_harness::*;
pub use token_builders::*;
