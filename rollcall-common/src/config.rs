//! Configuration file loading and platform paths
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are handled by each binary's argument parser. This module
//! covers tiers 3 and 4. A missing or malformed TOML file never aborts
//! startup: it is logged and the defaults are used.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::{Error, Result};

/// Directory name used under the platform config/data folders
pub const APP_DIR: &str = "rollcall";

/// `<config_dir>/rollcall/<file_name>`, if the platform has a config dir
pub fn default_config_path(file_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join(file_name))
}

/// OS-dependent default data folder
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./rollcall_data"))
}

/// Parse a TOML config file
pub fn read_toml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load a TOML config file, falling back to defaults on any failure
pub fn load_toml_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> T {
    let Some(path) = path else {
        return T::default();
    };

    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return T::default();
    }

    match read_toml_config(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            T::default()
        }
    }
}

/// Remove surrounding and embedded double quotes from an env-style value
pub fn strip_quotes(value: &str) -> String {
    value.replace('"', "")
}
