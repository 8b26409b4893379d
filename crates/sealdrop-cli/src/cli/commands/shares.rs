//! Direct-share command handlers.

use anyhow::Result;
use sealdrop_core::api::types::{Permission, ResourceId};
use sealdrop_core::config::Config;
use sealdrop_core::store::ShareStore;

use super::{connect, protected_failure, require_token, resource_table};

pub async fn create(
    config: &Config,
    server: Option<&str>,
    file_id: &str,
    recipient: &str,
    permission: Permission,
) -> Result<()> {
    let mut ctx = connect(config, server)?;
    require_token(&ctx.session)?;

    let file_id = ResourceId::from(file_id);
    let mut store = ShareStore::default();
    match store
        .create_share(&ctx.client, &file_id, recipient, permission)
        .await
    {
        Ok(share) => {
            let file_name = share
                .file
                .as_ref()
                .map_or_else(|| file_id.to_string(), |f| f.name.clone());
            println!("Shared {file_name} with {recipient} ({permission})");
            Ok(())
        }
        Err(err) => Err(protected_failure(&mut ctx.session, err)),
    }
}

pub async fn list(config: &Config, server: Option<&str>) -> Result<()> {
    let mut ctx = connect(config, server)?;
    require_token(&ctx.session)?;

    let mut store = ShareStore::default();
    if let Err(err) = store.refresh_shares(&ctx.client).await {
        return Err(protected_failure(&mut ctx.session, err));
    }

    if store.shares().is_empty() {
        println!("No shares found.");
        return Ok(());
    }

    let mut table = resource_table(["ID", "FILE", "SHARED WITH", "PERMISSION"]);
    for share in store.shares() {
        let file_name = share
            .file
            .as_ref()
            .map_or("(unknown file)", |f| f.name.as_str());
        let recipient = share
            .shared_with
            .as_ref()
            .map_or_else(|| "(unknown user)".to_string(), |u| u.display_name());
        table.add_row([
            share.id.to_string(),
            file_name.to_string(),
            recipient,
            share.permission.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
