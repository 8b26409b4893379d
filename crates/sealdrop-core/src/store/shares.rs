//! Share store: shareable links and direct grants.
//!
//! Links and direct shares are independent resources; each keeps its own
//! request slot so a failing link operation never masks (or clobbers) the
//! state of a share operation.

use chrono::{DateTime, Utc};

use crate::api::links::CreateLinkRequest;
use crate::api::shares::CreateShareRequest;
use crate::api::types::{FileShare, Permission, ResourceId, ShareLink};
use crate::api::{ApiClient, ApiError, ApiResult};

use super::{RequestState, RequestTicket};

/// In-memory view of the user's outbound links and the grants involving them.
#[derive(Debug, Default)]
pub struct ShareStore {
    links: Vec<ShareLink>,
    shares: Vec<FileShare>,
    link_request: RequestState,
    share_request: RequestState,
}

impl ShareStore {
    pub fn links(&self) -> &[ShareLink] {
        &self.links
    }

    pub fn shares(&self) -> &[FileShare] {
        &self.shares
    }

    pub fn link_error(&self) -> Option<&str> {
        self.link_request.error()
    }

    pub fn share_error(&self) -> Option<&str> {
        self.share_request.error()
    }

    pub fn begin_link(&mut self) -> RequestTicket {
        self.link_request.begin()
    }

    pub fn begin_share(&mut self) -> RequestTicket {
        self.share_request.begin()
    }

    /// Applies a created link: appended on success.
    pub fn apply_create_link(
        &mut self,
        ticket: RequestTicket,
        result: Result<ShareLink, ApiError>,
    ) -> bool {
        if !self.link_request.is_current(ticket) {
            return false;
        }
        match result {
            Ok(link) => {
                self.links.push(link);
                self.link_request.finish(ticket, Ok(()))
            }
            Err(err) => self.link_request.finish(ticket, Err(err.message)),
        }
    }

    /// Applies a link list response: replaces the collection on success.
    pub fn apply_list_links(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<ShareLink>, ApiError>,
    ) -> bool {
        if !self.link_request.is_current(ticket) {
            return false;
        }
        match result {
            Ok(links) => {
                self.links = links;
                self.link_request.finish(ticket, Ok(()))
            }
            Err(err) => self.link_request.finish(ticket, Err(err.message)),
        }
    }

    /// Applies a link deletion: removed locally on server success only.
    pub fn apply_delete_link(
        &mut self,
        ticket: RequestTicket,
        id: &ResourceId,
        result: Result<(), ApiError>,
    ) -> bool {
        if !self.link_request.is_current(ticket) {
            return false;
        }
        match result {
            Ok(()) => {
                self.links.retain(|l| &l.id != id);
                self.link_request.finish(ticket, Ok(()))
            }
            Err(err) => self.link_request.finish(ticket, Err(err.message)),
        }
    }

    /// Applies a created grant.
    pub fn apply_create_share(
        &mut self,
        ticket: RequestTicket,
        result: Result<FileShare, ApiError>,
    ) -> bool {
        if !self.share_request.is_current(ticket) {
            return false;
        }
        match result {
            Ok(share) => {
                self.shares.push(share);
                self.share_request.finish(ticket, Ok(()))
            }
            Err(err) => self.share_request.finish(ticket, Err(err.message)),
        }
    }

    /// Applies a grant list response.
    pub fn apply_list_shares(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<FileShare>, ApiError>,
    ) -> bool {
        if !self.share_request.is_current(ticket) {
            return false;
        }
        match result {
            Ok(shares) => {
                self.shares = shares;
                self.share_request.finish(ticket, Ok(()))
            }
            Err(err) => self.share_request.finish(ticket, Err(err.message)),
        }
    }

    /// Creates a shareable link for a file.
    pub async fn create_link(
        &mut self,
        client: &ApiClient,
        file_id: &ResourceId,
        expires_at: DateTime<Utc>,
        permission: Permission,
    ) -> ApiResult<ShareLink> {
        let ticket = self.begin_link();
        let request = CreateLinkRequest {
            file_id,
            expires_at,
            permission,
        };
        match client.create_link(&request).await {
            Ok(link) => {
                self.apply_create_link(ticket, Ok(link.clone()));
                Ok(link)
            }
            Err(err) => {
                self.apply_create_link(ticket, Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Fetches the caller's links.
    pub async fn refresh_links(&mut self, client: &ApiClient) -> ApiResult<()> {
        let ticket = self.begin_link();
        match client.list_links().await {
            Ok(links) => {
                self.apply_list_links(ticket, Ok(links));
                Ok(())
            }
            Err(err) => {
                self.apply_list_links(ticket, Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Deletes a link on the server and, on success, locally.
    pub async fn delete_link(&mut self, client: &ApiClient, id: &ResourceId) -> ApiResult<()> {
        let ticket = self.begin_link();
        match client.delete_link(id).await {
            Ok(()) => {
                self.apply_delete_link(ticket, id, Ok(()));
                Ok(())
            }
            Err(err) => {
                self.apply_delete_link(ticket, id, Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Grants a named recipient access to a file.
    pub async fn create_share(
        &mut self,
        client: &ApiClient,
        file_id: &ResourceId,
        recipient: &str,
        permission: Permission,
    ) -> ApiResult<FileShare> {
        let ticket = self.begin_share();
        let request = CreateShareRequest {
            file_id,
            shared_with_username: recipient,
            permission,
        };
        match client.create_share(&request).await {
            Ok(share) => {
                self.apply_create_share(ticket, Ok(share.clone()));
                Ok(share)
            }
            Err(err) => {
                self.apply_create_share(ticket, Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Fetches grants involving the current user.
    pub async fn refresh_shares(&mut self, client: &ApiClient) -> ApiResult<()> {
        let ticket = self.begin_share();
        match client.list_shares().await {
            Ok(shares) => {
                self.apply_list_shares(ticket, Ok(shares));
                Ok(())
            }
            Err(err) => {
                self.apply_list_shares(ticket, Err(err.clone()));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::api::ApiErrorKind;

    use super::*;

    fn link(id: &str) -> ShareLink {
        ShareLink {
            id: ResourceId::from(id),
            file: None,
            expires_at: Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
            permission: Some(Permission::Download),
            access_count: 0,
            share_url: None,
        }
    }

    fn grant(id: &str) -> FileShare {
        FileShare {
            id: ResourceId::from(id),
            file: None,
            shared_with: None,
            permission: Permission::View,
            created_at: None,
        }
    }

    /// Created links append; deletion removes by id on success.
    #[test]
    fn test_link_lifecycle() {
        let mut store = ShareStore::default();

        let t = store.begin_link();
        store.apply_create_link(t, Ok(link("l1")));
        let t = store.begin_link();
        store.apply_create_link(t, Ok(link("l2")));
        assert_eq!(store.links().len(), 2);

        let t = store.begin_link();
        store.apply_delete_link(t, &ResourceId::from("l1"), Ok(()));
        assert_eq!(store.links().len(), 1);
        assert_eq!(store.links()[0].id.as_str(), "l2");
    }

    /// A link failure does not disturb the share slot, and vice versa.
    #[test]
    fn test_independent_request_slots() {
        let mut store = ShareStore::default();

        let t = store.begin_share();
        store.apply_list_shares(t, Ok(vec![grant("s1")]));

        let t = store.begin_link();
        store.apply_create_link(
            t,
            Err(ApiError::new(
                ApiErrorKind::Validation,
                "Failed to create shareable link",
            )),
        );

        assert_eq!(store.link_error(), Some("Failed to create shareable link"));
        assert_eq!(store.share_error(), None);
        assert_eq!(store.shares().len(), 1);
    }

    /// Stale share-list responses are discarded.
    #[test]
    fn test_stale_share_list_discarded() {
        let mut store = ShareStore::default();

        let old = store.begin_share();
        let new = store.begin_share();

        store.apply_list_shares(new, Ok(vec![grant("s2")]));
        assert!(!store.apply_list_shares(old, Ok(vec![grant("s1")])));

        assert_eq!(store.shares().len(), 1);
        assert_eq!(store.shares()[0].id.as_str(), "s2");
    }
}
