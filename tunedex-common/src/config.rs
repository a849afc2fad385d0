//! Configuration loading and resolution
//!
//! Every setting resolves through the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`TUNEDEX_*`)
//! 3. TOML config file (`~/.config/tunedex/config.toml`)
//! 4. Compiled default (fallback)
//!
//! The data source location is part of this resolution: a remote base URL
//! selects HTTP fetching, a local folder selects filesystem reads, and the
//! choice is fixed for the lifetime of the process.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Default HTTP listen port for the search & discovery service
pub const DEFAULT_PORT: u16 = 5750;

/// Default seconds between play-tracking heartbeats
pub const DEFAULT_HEARTBEAT_SECS: u64 = 15;

pub const ENV_PORT: &str = "TUNEDEX_PORT";
pub const ENV_DATA_URL: &str = "TUNEDEX_DATA_URL";
pub const ENV_DATA_DIR: &str = "TUNEDEX_DATA_DIR";
pub const ENV_DATABASE: &str = "TUNEDEX_DB";
pub const ENV_HEARTBEAT_SECS: &str = "TUNEDEX_HEARTBEAT_SECS";

/// Where catalog data is fetched from, fixed at process start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataLocation {
    /// Fetch `{path}` as `{base_url}/{path}` over HTTP
    Remote { base_url: String },
    /// Read `{path}` under a local folder
    Local { root: PathBuf },
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen port
    pub port: u16,
    /// Catalog data source location
    pub data: DataLocation,
    /// SQLite play-history database path
    pub database_path: PathBuf,
    /// Seconds between play-tracking heartbeats
    pub heartbeat_secs: u64,
}

/// Settings supplied on the command line; `None` falls through to the
/// next priority tier
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub data_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub heartbeat_secs: Option<u64>,
    /// Explicit config file path; skips the platform search
    pub config_path: Option<PathBuf>,
}

/// Settings read from the TOML config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub data_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub heartbeat_secs: Option<u64>,
}

/// Resolve the full service configuration from all four tiers
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ServiceConfig> {
    let file = load_file_config(overrides.config_path.as_deref())?;

    let port = match overrides.port {
        Some(port) => port,
        None => match env_var(ENV_PORT) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("{} is not a valid port: '{}'", ENV_PORT, raw)))?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        },
    };

    let heartbeat_secs = match overrides.heartbeat_secs {
        Some(secs) => secs,
        None => match env_var(ENV_HEARTBEAT_SECS) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                Error::Config(format!(
                    "{} is not a valid interval: '{}'",
                    ENV_HEARTBEAT_SECS, raw
                ))
            })?,
            None => file.heartbeat_secs.unwrap_or(DEFAULT_HEARTBEAT_SECS),
        },
    };
    if heartbeat_secs == 0 {
        return Err(Error::Config(
            "heartbeat_secs must be at least 1".to_string(),
        ));
    }

    let database_path = overrides
        .database_path
        .clone()
        .or_else(|| env_var(ENV_DATABASE).map(PathBuf::from))
        .or_else(|| file.database_path.clone())
        .unwrap_or_else(|| default_data_folder().join("tunedex.db"));

    let data = resolve_data_location(overrides, &file);

    Ok(ServiceConfig {
        port,
        data,
        database_path,
        heartbeat_secs,
    })
}

/// Resolve the data source location
///
/// Within one tier a remote URL wins over a local folder; across tiers the
/// higher tier always wins regardless of which form it uses.
fn resolve_data_location(overrides: &ConfigOverrides, file: &FileConfig) -> DataLocation {
    // Priority 1: Command-line argument
    if let Some(url) = &overrides.data_url {
        return DataLocation::Remote {
            base_url: url.clone(),
        };
    }
    if let Some(dir) = &overrides.data_dir {
        return DataLocation::Local { root: dir.clone() };
    }

    // Priority 2: Environment variable
    if let Some(url) = env_var(ENV_DATA_URL) {
        return DataLocation::Remote { base_url: url };
    }
    if let Some(dir) = env_var(ENV_DATA_DIR) {
        return DataLocation::Local {
            root: PathBuf::from(dir),
        };
    }

    // Priority 3: TOML config file
    if let Some(url) = &file.data_url {
        return DataLocation::Remote {
            base_url: url.clone(),
        };
    }
    if let Some(dir) = &file.data_dir {
        return DataLocation::Local { root: dir.clone() };
    }

    // Priority 4: Compiled default
    DataLocation::Local {
        root: default_data_folder(),
    }
}

fn env_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

/// Load the TOML config file, or defaults when no file exists
///
/// An explicit path that is missing or malformed is an error; a discovered
/// file that fails to parse is also an error, since silently ignoring an
/// operator's config hides mistakes.
fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match find_config_file(explicit)? {
        Some(path) => path,
        None => return Ok(FileConfig::default()),
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Locate the config file for this platform
fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    if let Some(user) = dirs::config_dir().map(|d| d.join("tunedex").join("config.toml")) {
        if user.exists() {
            return Ok(Some(user));
        }
    }

    if cfg!(target_os = "linux") {
        let system = PathBuf::from("/etc/tunedex/config.toml");
        if system.exists() {
            return Ok(Some(system));
        }
    }

    Ok(None)
}

/// OS-dependent default folder for the database and local catalog data
fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tunedex"))
        .unwrap_or_else(|| PathBuf::from("./tunedex_data"))
}
