//! Configuration loading and resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback, where one exists)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ENV_ROOT_FOLDER: &str = "MUVI_ROOT_FOLDER";
pub const ENV_CATALOG_URL: &str = "MUVI_CATALOG_URL";
pub const ENV_IDENTITY_REGION: &str = "MUVI_IDENTITY_REGION";
pub const ENV_IDENTITY_CLIENT_ID: &str = "MUVI_IDENTITY_CLIENT_ID";

/// Region of the user pool the application was deployed against
pub const DEFAULT_IDENTITY_REGION: &str = "ap-south-1";

const DATABASE_FILE: &str = "muvi.db";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub catalog_url: Option<String>,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[identity]` table
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentityConfig {
    pub region: Option<String>,
    pub client_id: Option<String>,
}

/// `[logging]` table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub catalog_url: Option<String>,
    pub identity_region: Option<String>,
    pub identity_client_id: Option<String>,
}

/// Fully resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub root_folder: PathBuf,
    /// Catalog API base URL without a trailing slash
    pub catalog_url: String,
    pub identity_region: String,
    pub identity_client_id: String,
    pub log_level: String,
}

impl ClientConfig {
    /// Resolve every setting from overrides, environment and TOML
    pub fn resolve(overrides: &ConfigOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let root_folder = resolve_root_folder(
            overrides.root_folder.as_deref(),
            toml_config.root_folder.as_deref(),
        );

        let catalog_url = resolve_setting(
            overrides.catalog_url.as_deref(),
            ENV_CATALOG_URL,
            toml_config.catalog_url.as_deref(),
        )
        .ok_or_else(|| {
            missing_setting(
                "Catalog API URL",
                "--catalog-url",
                ENV_CATALOG_URL,
                "catalog_url = \"https://...\"",
            )
        })?;

        let identity_region = resolve_setting(
            overrides.identity_region.as_deref(),
            ENV_IDENTITY_REGION,
            toml_config.identity.region.as_deref(),
        )
        .unwrap_or_else(|| DEFAULT_IDENTITY_REGION.to_string());

        let identity_client_id = resolve_setting(
            overrides.identity_client_id.as_deref(),
            ENV_IDENTITY_CLIENT_ID,
            toml_config.identity.client_id.as_deref(),
        )
        .ok_or_else(|| {
            missing_setting(
                "Identity app client id",
                "--identity-client-id",
                ENV_IDENTITY_CLIENT_ID,
                "[identity] client_id = \"...\"",
            )
        })?;

        Ok(Self {
            root_folder,
            catalog_url: catalog_url.trim_end_matches('/').to_string(),
            identity_region,
            identity_client_id,
            log_level: toml_config.logging.level.clone(),
        })
    }
}

fn missing_setting(what: &str, flag: &str, env_var: &str, toml_line: &str) -> Error {
    Error::Config(format!(
        "{} not configured. Please configure using one of:\n\
         1. Command line: {} <value>\n\
         2. Environment: {}=<value>\n\
         3. TOML config: ~/.config/muvi/config.toml ({})",
        what, flag, env_var, toml_line
    ))
}

/// Pick the first non-blank value in priority order
pub fn resolve_setting(
    cli_arg: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    let env_value = std::env::var(env_var_name).ok();
    let value = [cli_arg, env_value.as_deref(), toml_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string);
    value
}

/// Root folder resolution (CLI → `MUVI_ROOT_FOLDER` → TOML → platform default)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_value: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ENV_ROOT_FOLDER) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    default_root_folder()
}

/// Platform config file location (`~/.config/muvi/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("muvi").join("config.toml"))
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("muvi"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\muvi"))
    } else {
        // ~/.local/share/muvi on Linux, ~/Library/Application Support/muvi on macOS
        dirs::data_local_dir()
            .map(|d| d.join("muvi"))
            .unwrap_or_else(|| PathBuf::from("./muvi_data"))
    }
}

/// Prepares the root folder that holds the client store
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the folder if needed (idempotent)
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}
