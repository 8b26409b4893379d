//! Wire types shared across API endpoints.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque server-assigned identifier.
///
/// Servers in the wild disagree on id shape (UUID strings vs sequential
/// integers), so this deserializes from either and keeps the canonical
/// string form for display and request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl FromStr for ResourceId {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = ResourceId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer identifier")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ResourceId(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ResourceId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ResourceId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// Access level granted by a share or link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    View,
    Download,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::View => "view",
            Permission::Download => "download",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Permission::View),
            "download" => Ok(Permission::Download),
            _ => Err(format!(
                "unknown permission '{value}' (expected 'view' or 'download')"
            )),
        }
    }
}

/// An account on the server. Opaque to the client beyond display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Best display name the server gave us.
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}

/// One file owned by (or shared with) the current user.
///
/// This is the canonical shape returned by both the list endpoint and the
/// upload endpoint; the file store appends upload responses verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: ResourceId,
    pub name: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub owner: Option<User>,
}

/// A token-bearing link granting time-limited access to one file without
/// recipient authentication. Expiry and permission are enforced server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLink {
    pub id: ResourceId,
    #[serde(default)]
    pub file: Option<FileRecord>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub permission: Option<Permission>,
    #[serde(default)]
    pub access_count: u64,
    #[serde(default)]
    pub share_url: Option<String>,
}

/// A permission-scoped grant from the file owner to a named recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileShare {
    pub id: ResourceId,
    #[serde(default)]
    pub file: Option<FileRecord>,
    #[serde(default)]
    pub shared_with: Option<User>,
    pub permission: Permission,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// List responses arrive either as a bare array or wrapped in a paginated
/// `{"results": [...]}` envelope depending on server configuration; accept
/// both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Plain(Vec<T>),
    Paginated { results: Vec<T> },
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListEnvelope::Plain(items) => items,
            ListEnvelope::Paginated { results } => results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: ids deserialize from both strings and integers.
    #[test]
    fn test_resource_id_accepts_string_and_integer() {
        let from_int: ResourceId = serde_json::from_str("5").unwrap();
        assert_eq!(from_int.as_str(), "5");

        let from_str: ResourceId =
            serde_json::from_str(r#""0b2e1fa2-6c1a-4b43-9f7e-2a2d4c1f9b11""#).unwrap();
        assert_eq!(from_str.as_str(), "0b2e1fa2-6c1a-4b43-9f7e-2a2d4c1f9b11");
    }

    /// Test: canonical file record parses with optional fields absent.
    #[test]
    fn test_file_record_minimal_shape() {
        let record: FileRecord = serde_json::from_str(
            r#"{"id": 5, "name": "a.txt", "size": 10, "uploaded_at": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(record.id.as_str(), "5");
        assert_eq!(record.name, "a.txt");
        assert_eq!(record.size, 10);
        assert!(record.content_type.is_none());
        assert!(record.owner.is_none());
    }

    /// Test: list envelope accepts both bare arrays and paginated wrappers.
    #[test]
    fn test_list_envelope_both_shapes() {
        let bare: ListEnvelope<FileRecord> = serde_json::from_str(
            r#"[{"id": 1, "name": "x", "size": 1, "uploaded_at": "2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        assert_eq!(bare.into_items().len(), 1);

        let wrapped: ListEnvelope<FileRecord> = serde_json::from_str(
            r#"{"results": [{"id": 1, "name": "x", "size": 1, "uploaded_at": "2024-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_items().len(), 1);
    }

    /// Test: permission round-trips through its lowercase wire form.
    #[test]
    fn test_permission_wire_form() {
        assert_eq!(
            serde_json::to_string(&Permission::Download).unwrap(),
            r#""download""#
        );
        let parsed: Permission = serde_json::from_str(r#""view""#).unwrap();
        assert_eq!(parsed, Permission::View);
        assert!("edit".parse::<Permission>().is_err());
    }

    /// Test: user display name falls back email -> id.
    #[test]
    fn test_user_display_name() {
        let user: User = serde_json::from_str(r#"{"id": 1, "username": "alice"}"#).unwrap();
        assert_eq!(user.display_name(), "alice");

        let email_only: User =
            serde_json::from_str(r#"{"id": 2, "email": "bob@example.com"}"#).unwrap();
        assert_eq!(email_only.display_name(), "bob@example.com");

        let bare: User = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(bare.display_name(), "user #3");
    }
}
