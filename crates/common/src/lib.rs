//! Common utilities shared across collab-gate crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, clock skew, JWK component decoding)
pub mod jwt;
