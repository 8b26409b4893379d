//! File endpoints: list, upload (multipart), download, delete.

use reqwest::multipart;

use super::client::{ApiClient, Auth, DownloadedContent};
use super::error::ApiResult;
use super::types::{FileRecord, ListEnvelope, ResourceId};

pub const FILES_PATH: &str = "/api/files/";

impl ApiClient {
    /// Fetches all files visible to the current user.
    pub async fn list_files(&self) -> ApiResult<Vec<FileRecord>> {
        self.get_json::<ListEnvelope<FileRecord>>(FILES_PATH, Auth::Bearer, "Failed to fetch files")
            .await
            .map(ListEnvelope::into_items)
    }

    /// Uploads file contents under the given display name.
    ///
    /// The server responds with the canonical record in the same shape
    /// `list_files` returns, so callers can append it without a re-fetch.
    pub async fn upload_file(&self, name: &str, bytes: Vec<u8>) -> ApiResult<FileRecord> {
        let part = multipart::Part::bytes(bytes).file_name(name.to_string());
        let form = multipart::Form::new()
            .part("file", part)
            .text("name", name.to_string());

        self.post_multipart(FILES_PATH, form, "Failed to upload file")
            .await
    }

    /// Downloads a file's contents (owner, or recipient of a download grant).
    pub async fn download_file(&self, id: &ResourceId) -> ApiResult<DownloadedContent> {
        self.get_bytes(
            &format!("/api/files/{id}/download/"),
            Auth::Bearer,
            "Failed to download file",
        )
        .await
    }

    /// Deletes a file by id.
    pub async fn delete_file(&self, id: &ResourceId) -> ApiResult<()> {
        self.delete(&format!("/api/files/{id}/"), "Failed to delete file")
            .await
    }
}
