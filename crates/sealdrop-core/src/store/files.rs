//! File registry store: the current user's files plus request state.

use crate::api::types::{FileRecord, ResourceId};
use crate::api::{ApiClient, ApiError, ApiResult};

use super::{RequestState, RequestTicket};

/// In-memory collection of the current user's files.
///
/// Insertion order is display order; uploads append the server's canonical
/// record (shape-identical to what `list` returns), a refresh replaces the
/// whole collection.
#[derive(Debug, Default)]
pub struct FileStore {
    files: Vec<FileRecord>,
    request: RequestState,
}

impl FileStore {
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn is_loading(&self) -> bool {
        self.request.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.request.error()
    }

    /// Issues a ticket for an operation on this store.
    pub fn begin(&mut self) -> RequestTicket {
        self.request.begin()
    }

    /// Applies a list response: replaces the collection on success.
    /// Stale responses are discarded and leave everything untouched.
    pub fn apply_list(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<FileRecord>, ApiError>,
    ) -> bool {
        if !self.request.is_current(ticket) {
            return false;
        }
        match result {
            Ok(files) => {
                self.files = files;
                self.request.finish(ticket, Ok(()))
            }
            Err(err) => self.request.finish(ticket, Err(err.message)),
        }
    }

    /// Applies an upload response: appends the canonical record on success.
    pub fn apply_upload(
        &mut self,
        ticket: RequestTicket,
        result: Result<FileRecord, ApiError>,
    ) -> bool {
        if !self.request.is_current(ticket) {
            return false;
        }
        match result {
            Ok(record) => {
                self.files.push(record);
                self.request.finish(ticket, Ok(()))
            }
            Err(err) => self.request.finish(ticket, Err(err.message)),
        }
    }

    /// Applies a delete response: removes the record on server success only.
    ///
    /// Deleting an id not present in the collection leaves it unchanged and
    /// raises no local error beyond the server's own.
    pub fn apply_delete(
        &mut self,
        ticket: RequestTicket,
        id: &ResourceId,
        result: Result<(), ApiError>,
    ) -> bool {
        if !self.request.is_current(ticket) {
            return false;
        }
        match result {
            Ok(()) => {
                self.files.retain(|f| &f.id != id);
                self.request.finish(ticket, Ok(()))
            }
            Err(err) => self.request.finish(ticket, Err(err.message)),
        }
    }

    /// Fetches the file list and replaces the collection.
    pub async fn refresh(&mut self, client: &ApiClient) -> ApiResult<()> {
        let ticket = self.begin();
        match client.list_files().await {
            Ok(files) => {
                self.apply_list(ticket, Ok(files));
                Ok(())
            }
            Err(err) => {
                self.apply_list(ticket, Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Uploads contents and appends the returned record.
    pub async fn upload(
        &mut self,
        client: &ApiClient,
        name: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<FileRecord> {
        let ticket = self.begin();
        match client.upload_file(name, bytes).await {
            Ok(record) => {
                self.apply_upload(ticket, Ok(record.clone()));
                Ok(record)
            }
            Err(err) => {
                self.apply_upload(ticket, Err(err.clone()));
                Err(err)
            }
        }
    }

    /// Deletes a file on the server and, on success, locally.
    pub async fn delete(&mut self, client: &ApiClient, id: &ResourceId) -> ApiResult<()> {
        let ticket = self.begin();
        match client.delete_file(id).await {
            Ok(()) => {
                self.apply_delete(ticket, id, Ok(()));
                Ok(())
            }
            Err(err) => {
                self.apply_delete(ticket, id, Err(err.clone()));
                Err(err)
            }
        }
    }
}
