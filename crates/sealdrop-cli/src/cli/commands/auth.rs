//! Auth command handlers: login, register, logout, whoami.

use anyhow::Result;
use sealdrop_core::api::ApiError;
use sealdrop_core::config::Config;
use sealdrop_core::credentials::CredentialStore;
use sealdrop_core::session::{LoginOutcome, Session};

use super::connect;

pub async fn login(
    config: &Config,
    server: Option<&str>,
    email: &str,
    password: &str,
    code: Option<&str>,
) -> Result<()> {
    let mut ctx = connect(config, server)?;

    match ctx.session.login(&ctx.client, email, password, code).await? {
        LoginOutcome::LoggedIn(user) => {
            println!("Signed in as {}", user.display_name());
            Ok(())
        }
        LoginOutcome::SecondFactorRequired => {
            anyhow::bail!(
                "A second factor is required. Re-run `sealdrop login` with --code <one-time code>."
            )
        }
    }
}

pub async fn register(
    config: &Config,
    server: Option<&str>,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let mut ctx = connect(config, server)?;

    match ctx
        .session
        .register(&ctx.client, username, email, password)
        .await?
    {
        LoginOutcome::LoggedIn(user) => {
            println!("Account created. Signed in as {}", user.display_name());
            Ok(())
        }
        LoginOutcome::SecondFactorRequired => {
            println!("Account created.");
            anyhow::bail!(
                "A second factor is required. Run `sealdrop login` with --code <one-time code>."
            )
        }
    }
}

pub fn logout() -> Result<()> {
    let mut session = Session::load(CredentialStore::default_path())?;
    session.logout()?;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(config: &Config, server: Option<&str>) -> Result<()> {
    let mut ctx = connect(config, server)?;

    if !ctx.session.has_token() {
        println!("Not signed in.");
        return Ok(());
    }

    match ctx.session.validate(&ctx.client).await {
        Ok(user) => {
            println!("Signed in as {}", user.display_name());
            if let Some(email) = &user.email {
                println!("  email: {email}");
            }
            println!("  id:    {}", user.id);
            Ok(())
        }
        Err(err) => {
            // validate() already tore the session down on failure.
            if err
                .downcast_ref::<ApiError>()
                .is_some_and(ApiError::is_unauthorized)
            {
                anyhow::bail!("Session expired or invalid. Run `sealdrop login` to sign in again.")
            }
            Err(err)
        }
    }
}
