//! Configuration management for sealdrop.
//!
//! Loads configuration from ${SEALDROP_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, edit default_config.toml directly.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// This ensures new comments/sections from the template are always present,
/// while preserving user's customized values.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for sealdrop configuration and data directories.
    //!
    //! SEALDROP_HOME resolution order:
    //! 1. SEALDROP_HOME environment variable (if set)
    //! 2. ~/.config/sealdrop (default)

    use std::path::PathBuf;

    /// Returns the sealdrop home directory.
    ///
    /// Checks SEALDROP_HOME env var first, falls back to ~/.config/sealdrop
    pub fn sealdrop_home() -> PathBuf {
        if let Ok(home) = std::env::var("SEALDROP_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("sealdrop"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        sealdrop_home().join("config.toml")
    }

    /// Returns the path to the credentials cache file.
    pub fn credentials_path() -> PathBuf {
        sealdrop_home().join("credentials.json")
    }
}

/// Server connection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the file-sharing server.
    pub base_url: Option<String>,
}

impl ServerConfig {
    /// Returns the configured base URL if set and non-empty.
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server connection configuration.
    pub server: ServerConfig,
}

impl Config {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the server base URL.
    ///
    /// Precedence: explicit override (e.g. --server flag) > SEALDROP_SERVER_URL
    /// env var > config file > built-in default. The winning URL is validated.
    pub fn resolve_base_url(&self, override_url: Option<&str>) -> Result<String> {
        if let Some(url) = override_url {
            let trimmed = url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        if let Ok(env_url) = std::env::var("SEALDROP_SERVER_URL") {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        if let Some(config_url) = self.server.effective_base_url() {
            validate_url(config_url)?;
            return Ok(config_url.trim_end_matches('/').to_string());
        }

        Ok(Self::DEFAULT_BASE_URL.to_string())
    }

    /// Saves only the server base URL to the config file.
    ///
    /// Creates the file with the default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    pub fn save_base_url(url: &str) -> Result<()> {
        Self::save_base_url_to(&paths::config_path(), url)
    }

    /// Saves only the server base URL to a specific config file path.
    pub fn save_base_url_to(path: &Path, url: &str) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        validate_url(url)?;

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["server"]["base_url"] = value(url.trim_end_matches('/'));

        Self::write_config(path, &doc.to_string())
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid server base URL: {url}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    /// Config loading: missing file returns defaults.
    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.server.base_url, None);
    }

    /// Config loading: base_url read from [server] table.
    #[test]
    fn test_load_base_url_from_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "[server]\nbase_url = \"https://files.example.com\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(
            config.server.effective_base_url(),
            Some("https://files.example.com")
        );
    }

    /// Base URL: empty/whitespace treated as unset.
    #[test]
    fn test_base_url_empty_is_none() {
        let config = Config {
            server: ServerConfig {
                base_url: Some("   ".to_string()),
            },
        };
        assert_eq!(config.server.effective_base_url(), None);
    }

    /// Resolution: falls back to built-in default when nothing is set.
    #[test]
    fn test_resolve_base_url_default() {
        let config = Config::default();
        let url = config.resolve_base_url(None).unwrap();
        assert_eq!(url, Config::DEFAULT_BASE_URL);
    }

    /// Resolution: explicit override wins over config.
    #[test]
    fn test_resolve_base_url_override_wins() {
        let config = Config {
            server: ServerConfig {
                base_url: Some("https://config.example.com".to_string()),
            },
        };
        let url = config
            .resolve_base_url(Some("https://flag.example.com/"))
            .unwrap();
        assert_eq!(url, "https://flag.example.com");
    }

    /// Resolution: malformed override is rejected.
    #[test]
    fn test_resolve_base_url_rejects_invalid() {
        let config = Config::default();
        assert!(config.resolve_base_url(Some("not a url")).is_err());
    }

    /// Config init: creates file with template, creates parent dirs.
    #[test]
    fn test_init_creates_config_with_template() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# Sealdrop Configuration"));
        assert!(contents.contains("# base_url ="));
    }

    /// Config init: fails if file exists (no silent overwrite).
    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        let result = Config::init(&config_path);
        assert!(result.is_err());
    }

    /// save_base_url: creates new config file with template if missing.
    #[test]
    fn test_save_base_url_creates_file_with_template() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        Config::save_base_url_to(&config_path, "https://files.example.com").unwrap();

        assert!(config_path.exists());

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(
            config.server.effective_base_url(),
            Some("https://files.example.com")
        );

        // Template comments are preserved
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# Sealdrop Configuration"));
    }

    /// save_base_url: preserves other fields in existing config.
    #[test]
    fn test_save_base_url_preserves_user_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "[server]\nbase_url = \"https://old.example.com\"\n",
        )
        .unwrap();

        Config::save_base_url_to(&config_path, "https://new.example.com").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(
            config.server.effective_base_url(),
            Some("https://new.example.com")
        );
    }

    /// save_base_url: trailing slash is normalized away.
    #[test]
    fn test_save_base_url_strips_trailing_slash() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        Config::save_base_url_to(&config_path, "https://files.example.com/").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(
            config.server.effective_base_url(),
            Some("https://files.example.com")
        );
    }
}
