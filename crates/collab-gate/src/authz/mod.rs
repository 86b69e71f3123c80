//! Room authorization via the external permission service.

pub mod permission;

pub use permission::PermissionResolver;
