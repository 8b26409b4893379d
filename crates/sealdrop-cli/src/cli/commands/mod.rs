//! Command handlers.

pub mod auth;
pub mod config;
pub mod files;
pub mod links;
pub mod shares;

use anyhow::Result;
use comfy_table::{ContentArrangement, Table};
use sealdrop_core::api::{ApiClient, ApiError};
use sealdrop_core::config::Config;
use sealdrop_core::credentials::CredentialStore;
use sealdrop_core::session::Session;

/// Session + client pair every network command starts from.
///
/// The session is built first so its token handle can be shared with the
/// client; the client then reads the token fresh on each request.
pub(crate) struct AppContext {
    pub session: Session,
    pub client: ApiClient,
}

pub(crate) fn connect(config: &Config, server_override: Option<&str>) -> Result<AppContext> {
    let base_url = config.resolve_base_url(server_override)?;
    let session = Session::load(CredentialStore::default_path())?;
    let client = ApiClient::new(base_url, session.token_handle())?;
    Ok(AppContext { session, client })
}

/// Fails fast when no token is persisted, before any network dispatch.
pub(crate) fn require_token(session: &Session) -> Result<()> {
    if !session.has_token() {
        anyhow::bail!("Not signed in. Run `sealdrop login` first.");
    }
    Ok(())
}

/// Converts an API failure from a protected operation into the error shown
/// to the user, tearing the session down when the server reported the token
/// invalid. Safe to hit from several failing commands in a row.
pub(crate) fn protected_failure(session: &mut Session, err: ApiError) -> anyhow::Error {
    if err.is_unauthorized() {
        if let Err(teardown) = session.expire() {
            tracing::debug!(%teardown, "session teardown failed");
        }
        anyhow::anyhow!("Session expired or invalid. Run `sealdrop login` to sign in again.")
    } else {
        err.into()
    }
}

/// Table with the shared list-output configuration.
pub(crate) fn resource_table<const N: usize>(header: [&str; N]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Human-readable byte size.
pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
