//! Shareable link endpoints, including the unauthenticated public download.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::client::{ApiClient, Auth, DownloadedContent};
use super::error::ApiResult;
use super::types::{ListEnvelope, Permission, ResourceId, ShareLink};

pub const LINKS_PATH: &str = "/api/links/";

/// Payload for minting a time-limited link to a file.
#[derive(Debug, Serialize)]
pub struct CreateLinkRequest<'a> {
    pub file_id: &'a ResourceId,
    pub expires_at: DateTime<Utc>,
    pub permission: Permission,
}

impl ApiClient {
    /// Creates a shareable link for one of the caller's files.
    pub async fn create_link(&self, request: &CreateLinkRequest<'_>) -> ApiResult<ShareLink> {
        self.post_json(
            LINKS_PATH,
            request,
            Auth::Bearer,
            "Failed to create shareable link",
        )
        .await
    }

    /// Lists the caller's shareable links.
    pub async fn list_links(&self) -> ApiResult<Vec<ShareLink>> {
        self.get_json::<ListEnvelope<ShareLink>>(
            LINKS_PATH,
            Auth::Bearer,
            "Failed to fetch shareable links",
        )
        .await
        .map(ListEnvelope::into_items)
    }

    /// Deletes a shareable link; this is the only owner-side revocation.
    pub async fn delete_link(&self, id: &ResourceId) -> ApiResult<()> {
        self.delete(
            &format!("/api/links/{id}/"),
            "Failed to delete shareable link",
        )
        .await
    }

    /// Resolves a bare link id to its content without authentication.
    ///
    /// Expiry and permission are enforced entirely server-side; this client
    /// performs no local expiry check and surfaces the server's message for
    /// expired or unknown links.
    pub async fn fetch_link(&self, id: &ResourceId) -> ApiResult<DownloadedContent> {
        self.get_bytes(
            &format!("/api/links/{id}/download/"),
            Auth::Public,
            "Failed to download file. The link may be expired.",
        )
        .await
    }
}
