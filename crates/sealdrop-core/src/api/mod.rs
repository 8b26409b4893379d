//! HTTP client for the file-sharing REST API.
//!
//! One thin wrapper (`ApiClient`) owns the transport concerns: bearer-token
//! attachment, the public-endpoint allow-list, and normalization of error
//! payloads into [`ApiError`]. Endpoint calls live in per-resource modules
//! (`auth`, `files`, `shares`, `links`) as `impl ApiClient` blocks.

pub mod auth;
pub mod client;
pub mod error;
pub mod files;
pub mod links;
pub mod shares;
pub mod types;

pub use client::{ApiClient, TokenHandle};
pub use error::{ApiError, ApiErrorKind, ApiResult};
