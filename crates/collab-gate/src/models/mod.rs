//! Collab Gate models.
//!
//! Data passed between the gate, the authorization service and the engine.

use serde::{Deserialize, Serialize};

/// A verified request for room access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessQuery {
    pub room: String,
    pub user_id: String,
}

impl AccessQuery {
    pub fn new(room: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            user_id: user_id.into(),
        }
    }
}

/// Outcome of a successful admission.
///
/// Only ever constructed after the credential has been verified and the
/// authorization service has answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDescriptor {
    pub room: String,
    pub user_id: String,
    pub has_write_access: bool,
}

/// Identity extracted from a verified credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Body returned by the authorization service.
///
/// Both members are optional. Unknown members are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionResponse {
    #[serde(default)]
    pub yaccess: Option<String>,

    #[serde(default)]
    pub yuserid: Option<String>,
}

impl PermissionResponse {
    /// Only the exact string `rw` grants write access.
    pub fn has_write_access(&self) -> bool {
        self.yaccess.as_deref() == Some("rw")
    }

    /// Build the descriptor for `query`, falling back to the requesting user
    /// when the service returns no (or an empty) user id.
    pub fn into_descriptor(self, query: AccessQuery) -> AccessDescriptor {
        let has_write_access = self.has_write_access();
        let user_id = self
            .yuserid
            .filter(|id| !id.is_empty())
            .unwrap_or(query.user_id);

        AccessDescriptor {
            room: query.room,
            user_id,
            has_write_access,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn parse(body: &str) -> PermissionResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_rw_grants_write_access() {
        let descriptor = parse(r#"{"yaccess":"rw","yuserid":"alice"}"#)
            .into_descriptor(AccessQuery::new("doc42", "alice"));

        assert_eq!(
            descriptor,
            AccessDescriptor {
                room: "doc42".to_string(),
                user_id: "alice".to_string(),
                has_write_access: true,
            }
        );
    }

    #[test]
    fn test_other_access_values_are_read_only() {
        for body in [
            r#"{"yaccess":"r"}"#,
            r#"{"yaccess":"RW"}"#,
            r#"{"yaccess":"rw "}"#,
            r#"{"yaccess":null}"#,
            r#"{}"#,
        ] {
            assert!(!parse(body).has_write_access(), "{body} should be read-only");
        }
    }

    #[test]
    fn test_missing_user_id_falls_back_to_requester() {
        let descriptor =
            parse(r#"{"yaccess":"r"}"#).into_descriptor(AccessQuery::new("doc42", "alice"));
        assert_eq!(descriptor.user_id, "alice");
        assert!(!descriptor.has_write_access);
    }

    #[test]
    fn test_empty_user_id_falls_back_to_requester() {
        let descriptor = parse(r#"{"yaccess":"rw","yuserid":""}"#)
            .into_descriptor(AccessQuery::new("doc42", "alice"));
        assert_eq!(descriptor.user_id, "alice");
    }

    #[test]
    fn test_service_may_rename_user() {
        let descriptor = parse(r#"{"yaccess":"rw","yuserid":"alice@example"}"#)
            .into_descriptor(AccessQuery::new("doc42", "alice"));
        assert_eq!(descriptor.user_id, "alice@example");
    }

    #[test]
    fn test_unknown_members_are_ignored() {
        let response = parse(r#"{"yaccess":"rw","extra":[1,2,3]}"#);
        assert!(response.has_write_access());
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let descriptor = AccessDescriptor {
            room: "doc42".to_string(),
            user_id: "alice".to_string(),
            has_write_access: false,
        };

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"room": "doc42", "userId": "alice", "hasWriteAccess": false})
        );
    }
}
