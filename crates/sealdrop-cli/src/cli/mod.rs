//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sealdrop_core::api::types::Permission;
use sealdrop_core::config::Config;

mod commands;

#[derive(Parser)]
#[command(name = "sealdrop")]
#[command(version = "0.1")]
#[command(about = "Client for a sealdrop file-sharing server")]
struct Cli {
    /// Server base URL (overrides config and SEALDROP_SERVER_URL)
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in and persist the session token
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// One-time code, when the account has a second factor enabled
        #[arg(long)]
        code: Option<String>,
    },

    /// Create an account and sign in with it
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Sign out and clear the persisted token
    Logout,

    /// Validate the session and show the signed-in account
    Whoami,

    /// Manage your files
    Files {
        #[command(subcommand)]
        command: FilesCommands,
    },

    /// Manage direct shares with named users
    Shares {
        #[command(subcommand)]
        command: SharesCommands,
    },

    /// Manage shareable links
    Links {
        #[command(subcommand)]
        command: LinksCommands,
    },

    /// Download the file behind a public link (no sign-in required)
    Fetch {
        /// The link id from the shared URL
        #[arg(value_name = "LINK_ID")]
        id: String,

        /// Output path (defaults to the server-provided filename)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Passphrase to open a sealed file after download
        #[arg(long, value_name = "PASSPHRASE")]
        decrypt: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum FilesCommands {
    /// List your files
    List,
    /// Upload a file
    Upload {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Display name (defaults to the file's name)
        #[arg(long)]
        name: Option<String>,

        /// Seal the contents under this passphrase before upload
        #[arg(long, value_name = "PASSPHRASE")]
        encrypt: Option<String>,
    },
    /// Download a file you own or that was shared with you
    Download {
        #[arg(value_name = "FILE_ID")]
        id: String,

        /// Output path (defaults to the server-provided filename)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Passphrase to open a sealed file after download
        #[arg(long, value_name = "PASSPHRASE")]
        decrypt: Option<String>,
    },
    /// Delete a file
    Delete {
        #[arg(value_name = "FILE_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum SharesCommands {
    /// Share a file with a named user
    Create {
        /// Id of the file to share
        #[arg(long = "file", value_name = "FILE_ID")]
        file_id: String,

        /// Recipient username
        #[arg(long = "with", value_name = "USERNAME")]
        recipient: String,

        /// Access level: view or download
        #[arg(long, default_value = "view")]
        permission: Permission,
    },
    /// List shares involving you
    List,
}

#[derive(clap::Subcommand)]
enum LinksCommands {
    /// Create a time-limited shareable link for a file
    Create {
        /// Id of the file to link
        #[arg(long = "file", value_name = "FILE_ID")]
        file_id: String,

        /// Days until the link expires
        #[arg(long, value_name = "DAYS", default_value_t = 7)]
        expires_in_days: i64,

        /// Access level: view or download
        #[arg(long, default_value = "view")]
        permission: Permission,
    },
    /// List your shareable links
    List,
    /// Delete a shareable link
    Delete {
        #[arg(value_name = "LINK_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the server base URL in the config file
    SetServer {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;
    let server = cli.server.as_deref();

    match cli.command {
        Commands::Login {
            email,
            password,
            code,
        } => commands::auth::login(&config, server, &email, &password, code.as_deref()).await,

        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(&config, server, &username, &email, &password).await,

        Commands::Logout => commands::auth::logout(),

        Commands::Whoami => commands::auth::whoami(&config, server).await,

        Commands::Files { command } => match command {
            FilesCommands::List => commands::files::list(&config, server).await,
            FilesCommands::Upload {
                path,
                name,
                encrypt,
            } => commands::files::upload(&config, server, &path, name, encrypt.as_deref()).await,
            FilesCommands::Download {
                id,
                output,
                decrypt,
            } => commands::files::download(&config, server, &id, output, decrypt.as_deref()).await,
            FilesCommands::Delete { id } => commands::files::delete(&config, server, &id).await,
        },

        Commands::Shares { command } => match command {
            SharesCommands::Create {
                file_id,
                recipient,
                permission,
            } => {
                commands::shares::create(&config, server, &file_id, &recipient, permission).await
            }
            SharesCommands::List => commands::shares::list(&config, server).await,
        },

        Commands::Links { command } => match command {
            LinksCommands::Create {
                file_id,
                expires_in_days,
                permission,
            } => {
                commands::links::create(&config, server, &file_id, expires_in_days, permission)
                    .await
            }
            LinksCommands::List => commands::links::list(&config, server).await,
            LinksCommands::Delete { id } => commands::links::delete(&config, server, &id).await,
        },

        Commands::Fetch {
            id,
            output,
            decrypt,
        } => commands::links::fetch(&config, server, &id, output, decrypt.as_deref()).await,

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetServer { url } => commands::config::set_server(&url),
        },
    }
}
