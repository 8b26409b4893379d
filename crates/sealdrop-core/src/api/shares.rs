//! Direct share endpoints: permission-scoped grants to named recipients.

use serde::Serialize;

use super::client::{ApiClient, Auth};
use super::error::ApiResult;
use super::types::{FileShare, ListEnvelope, Permission, ResourceId};

pub const SHARES_PATH: &str = "/api/shares/";

/// Payload for granting a named user access to a file.
#[derive(Debug, Serialize)]
pub struct CreateShareRequest<'a> {
    pub file_id: &'a ResourceId,
    pub shared_with_username: &'a str,
    pub permission: Permission,
}

impl ApiClient {
    /// Grants a named recipient access to one of the caller's files.
    pub async fn create_share(&self, request: &CreateShareRequest<'_>) -> ApiResult<FileShare> {
        self.post_json(SHARES_PATH, request, Auth::Bearer, "Failed to share file")
            .await
    }

    /// Lists share grants involving the current user (as owner or recipient).
    pub async fn list_shares(&self) -> ApiResult<Vec<FileShare>> {
        self.get_json::<ListEnvelope<FileShare>>(SHARES_PATH, Auth::Bearer, "Failed to fetch shares")
            .await
            .map(ListEnvelope::into_items)
    }
}
