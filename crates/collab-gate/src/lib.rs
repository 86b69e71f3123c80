//! Collab Gate Library
//!
//! Authentication and authorization gate in front of a collaborative-document
//! synchronization engine. A connection is admitted only after its credential
//! verifies and the external permission service has said what the user may
//! do in the requested room.
//!
//! # Architecture
//!
//! ```text
//! transport/*.rs -> gate.rs -> auth/verifier.rs
//!                           -> authz/permission.rs
//!                -> engine.rs (admitted connections)
//! ```
//!
//! # Modules
//!
//! - `auth` - Verification key and credential verification
//! - `authz` - Permission service client
//! - `config` - Service configuration from environment
//! - `engine` - Seam to the synchronization engine
//! - `errors` - Error types with HTTP status code mapping
//! - `gate` - Admission logic shared by the transports
//! - `models` - Data models
//! - `observability` - Metrics
//! - `server` - Listener lifecycle
//! - `transport` - WebSocket and Socket.IO bootstraps

pub mod auth;
pub mod authz;
pub mod config;
pub mod engine;
pub mod errors;
pub mod gate;
pub mod models;
pub mod observability;
pub mod server;
pub mod transport;
