//! Configuration resolution for rollcall-kiosk
//!
//! Priority: command line → environment → TOML file → compiled default.

use std::path::PathBuf;

use clap::Parser;
use rollcall_common::config::{default_config_path, default_data_dir, load_toml_config};
use serde::Deserialize;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:10000/api";
pub const CONFIG_FILE_NAME: &str = "rollcall-kiosk.toml";

#[derive(Parser, Debug, Default)]
#[command(name = "rollcall-kiosk")]
#[command(about = "Operator console for attendance capture")]
#[command(version)]
pub struct KioskArgs {
    /// TOML config file (default: <config dir>/rollcall/rollcall-kiosk.toml)
    #[arg(short, long, env = "ROLLCALL_KIOSK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Attendance server API root
    #[arg(short, long, env = "ROLLCALL_SERVER")]
    pub server: Option<String>,

    /// Directory holding the local mirror
    #[arg(long, env = "ROLLCALL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Where downloaded exports are saved when no directory is given
    #[arg(long, env = "ROLLCALL_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KioskToml {
    pub server: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskConfig {
    pub server_url: String,
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
}

impl KioskConfig {
    pub fn resolve(args: KioskArgs, toml: KioskToml) -> Self {
        Self {
            server_url: args
                .server
                .or(toml.server)
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            data_dir: args
                .data_dir
                .or(toml.data_dir)
                .unwrap_or_else(default_data_dir),
            download_dir: args
                .download_dir
                .or(toml.download_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn load(args: KioskArgs) -> Self {
        let path = args
            .config
            .clone()
            .or_else(|| default_config_path(CONFIG_FILE_NAME));
        let toml: KioskToml = load_toml_config(path.as_deref());
        Self::resolve(args, toml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KioskConfig::resolve(KioskArgs::default(), KioskToml::default());
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.data_dir, default_data_dir());
        assert_eq!(config.download_dir, PathBuf::from("."));
    }

    #[test]
    fn test_args_override_toml() {
        let args = KioskArgs {
            server: Some("http://10.0.0.5:10000/api".to_string()),
            ..Default::default()
        };
        let toml = KioskToml {
            server: Some("http://ignored/api".to_string()),
            data_dir: Some(PathBuf::from("/var/lib/rollcall")),
            download_dir: None,
        };
        let config = KioskConfig::resolve(args, toml);
        assert_eq!(config.server_url, "http://10.0.0.5:10000/api");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/rollcall"));
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = KioskArgs::parse_from([
            "rollcall-kiosk",
            "--server",
            "http://kiosk-host/api",
            "--data-dir",
            "/tmp/mirror",
        ]);
        assert_eq!(args.server.as_deref(), Some("http://kiosk-host/api"));
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/mirror")));
    }
}
