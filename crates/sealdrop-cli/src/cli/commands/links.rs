//! Shareable-link command handlers, including the public fetch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sealdrop_core::api::types::{Permission, ResourceId};
use sealdrop_core::config::Config;
use sealdrop_core::crypto;
use sealdrop_core::store::ShareStore;

use super::{connect, format_size, protected_failure, require_token, resource_table};

pub async fn create(
    config: &Config,
    server: Option<&str>,
    file_id: &str,
    expires_in_days: i64,
    permission: Permission,
) -> Result<()> {
    if expires_in_days <= 0 {
        anyhow::bail!("--expires-in-days must be positive");
    }

    let mut ctx = connect(config, server)?;
    require_token(&ctx.session)?;

    let file_id = ResourceId::from(file_id);
    let expires_at = Utc::now() + Duration::days(expires_in_days);

    let mut store = ShareStore::default();
    match store
        .create_link(&ctx.client, &file_id, expires_at, permission)
        .await
    {
        Ok(link) => {
            println!("Created link {}", link.id);
            println!("  expires: {}", link.expires_at.format("%Y-%m-%d %H:%M"));
            if let Some(url) = &link.share_url {
                println!("  url:     {url}");
            }
            Ok(())
        }
        Err(err) => Err(protected_failure(&mut ctx.session, err)),
    }
}

pub async fn list(config: &Config, server: Option<&str>) -> Result<()> {
    let mut ctx = connect(config, server)?;
    require_token(&ctx.session)?;

    let mut store = ShareStore::default();
    if let Err(err) = store.refresh_links(&ctx.client).await {
        return Err(protected_failure(&mut ctx.session, err));
    }

    if store.links().is_empty() {
        println!("No links found.");
        return Ok(());
    }

    let mut table = resource_table(["ID", "FILE", "EXPIRES", "ACCESSES"]);
    for link in store.links() {
        let file_name = link
            .file
            .as_ref()
            .map_or("(unknown file)", |f| f.name.as_str());
        table.add_row([
            link.id.to_string(),
            file_name.to_string(),
            link.expires_at.format("%Y-%m-%d %H:%M").to_string(),
            link.access_count.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn delete(config: &Config, server: Option<&str>, id: &str) -> Result<()> {
    let mut ctx = connect(config, server)?;
    require_token(&ctx.session)?;

    let link_id = ResourceId::from(id);
    let mut store = ShareStore::default();
    match store.delete_link(&ctx.client, &link_id).await {
        Ok(()) => {
            println!("Deleted link {id}");
            Ok(())
        }
        Err(err) => Err(protected_failure(&mut ctx.session, err)),
    }
}

/// Resolves a public link and saves its content. Requires no sign-in; the
/// server alone decides whether the link is still valid.
pub async fn fetch(
    config: &Config,
    server: Option<&str>,
    id: &str,
    output: Option<PathBuf>,
    decrypt: Option<&str>,
) -> Result<()> {
    let ctx = connect(config, server)?;

    let link_id = ResourceId::from(id);
    let content = ctx.client.fetch_link(&link_id).await?;

    let bytes = match decrypt {
        Some(passphrase) => crypto::open(&content.bytes, passphrase)?,
        None => content.bytes,
    };

    let target = output
        .or_else(|| content.filename.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(format!("shared-{id}")));

    std::fs::write(&target, &bytes).with_context(|| format!("write {}", target.display()))?;
    println!("Saved {} ({})", target.display(), format_size(bytes.len() as u64));
    Ok(())
}
