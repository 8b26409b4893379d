//! File command handlers: list, upload, download, delete.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sealdrop_core::api::types::ResourceId;
use sealdrop_core::config::Config;
use sealdrop_core::crypto;
use sealdrop_core::store::FileStore;

use super::{connect, format_size, protected_failure, require_token, resource_table};

pub async fn list(config: &Config, server: Option<&str>) -> Result<()> {
    let mut ctx = connect(config, server)?;
    require_token(&ctx.session)?;

    let mut store = FileStore::default();
    if let Err(err) = store.refresh(&ctx.client).await {
        return Err(protected_failure(&mut ctx.session, err));
    }

    if store.files().is_empty() {
        println!("No files found.");
        return Ok(());
    }

    let mut table = resource_table(["ID", "NAME", "SIZE", "UPLOADED"]);
    for file in store.files() {
        table.add_row([
            file.id.to_string(),
            file.name.clone(),
            format_size(file.size),
            file.uploaded_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn upload(
    config: &Config,
    server: Option<&str>,
    path: &Path,
    name: Option<String>,
    encrypt: Option<&str>,
) -> Result<()> {
    let mut ctx = connect(config, server)?;
    require_token(&ctx.session)?;

    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let name = match name {
        Some(name) => name,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .context("upload path has no file name; pass --name")?,
    };

    let bytes = match encrypt {
        Some(passphrase) => crypto::seal(&bytes, passphrase)?,
        None => bytes,
    };

    let mut store = FileStore::default();
    match store.upload(&ctx.client, &name, bytes).await {
        Ok(record) => {
            println!(
                "Uploaded {} ({}, id {})",
                record.name,
                format_size(record.size),
                record.id
            );
            Ok(())
        }
        Err(err) => Err(protected_failure(&mut ctx.session, err)),
    }
}

pub async fn download(
    config: &Config,
    server: Option<&str>,
    id: &str,
    output: Option<PathBuf>,
    decrypt: Option<&str>,
) -> Result<()> {
    let mut ctx = connect(config, server)?;
    require_token(&ctx.session)?;

    let file_id = ResourceId::from(id);
    let content = match ctx.client.download_file(&file_id).await {
        Ok(content) => content,
        Err(err) => return Err(protected_failure(&mut ctx.session, err)),
    };

    let bytes = match decrypt {
        Some(passphrase) => crypto::open(&content.bytes, passphrase)?,
        None => content.bytes,
    };

    let target = output
        .or_else(|| content.filename.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(format!("file-{id}")));

    std::fs::write(&target, &bytes).with_context(|| format!("write {}", target.display()))?;
    println!("Saved {} ({})", target.display(), format_size(bytes.len() as u64));
    Ok(())
}

pub async fn delete(config: &Config, server: Option<&str>, id: &str) -> Result<()> {
    let mut ctx = connect(config, server)?;
    require_token(&ctx.session)?;

    let file_id = ResourceId::from(id);
    let mut store = FileStore::default();
    match store.delete(&ctx.client, &file_id).await {
        Ok(()) => {
            println!("Deleted {id}");
            Ok(())
        }
        Err(err) => Err(protected_failure(&mut ctx.session, err)),
    }
}
