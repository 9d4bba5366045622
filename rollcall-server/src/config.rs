//! Configuration resolution for rollcall-server
//!
//! Priority: command line → environment → TOML file → compiled default.
//! Command line and environment are merged by clap; the TOML file fills
//! whatever is still unset.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use rollcall_common::config::{default_config_path, load_toml_config, strip_quotes};
use rollcall_common::display_name::UsernameStrategy;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_PORTAL_BASE_URL: &str = "https://portal.dlsl.edu.ph";
pub const DEFAULT_PORTAL_HELPER_PATH: &str = "/registration/event/helper.php";
pub const DEFAULT_REG_KEY: &str = "20250515U60HB0";
pub const DEFAULT_EVENT_NAME: &str = "Attendance";
pub const DIRECTORY_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_EXPORT_CLEANUP: Duration = Duration::from_secs(30);
pub const CONFIG_FILE_NAME: &str = "rollcall-server.toml";

/// Command-line arguments for rollcall-server
#[derive(Parser, Debug, Default)]
#[command(name = "rollcall-server")]
#[command(about = "Attendance capture and reconciliation service")]
#[command(version)]
pub struct ServerArgs {
    /// TOML config file (default: <config dir>/rollcall/rollcall-server.toml)
    #[arg(short, long, env = "ROLLCALL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "ROLLCALL_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Directory service base URL
    #[arg(long, env = "PORTAL_BASE_URL")]
    pub portal_base_url: Option<String>,

    /// Directory lookup path appended to the base URL
    #[arg(long, env = "PORTAL_HELPER_PATH")]
    pub portal_helper_path: Option<String>,

    /// Directory lookup key
    #[arg(long, env = "REG_KEY")]
    pub reg_key: Option<String>,

    /// Accept invalid TLS certificates from the directory
    #[arg(long, env = "PORTAL_INSECURE_TLS")]
    pub portal_insecure_tls: Option<bool>,

    /// Name of the event open at startup
    #[arg(long, env = "ROLLCALL_EVENT_NAME")]
    pub event_name: Option<String>,

    /// Directory where export files are staged before download
    #[arg(long, env = "ROLLCALL_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// Username layout for student-info: dot, concat, firstInitialLast, lastFirstInitial
    #[arg(long, env = "USERNAME_STRATEGY")]
    pub username_strategy: Option<String>,
}

/// Optional settings read from the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerToml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub portal_base_url: Option<String>,
    pub portal_helper_path: Option<String>,
    pub reg_key: Option<String>,
    pub portal_insecure_tls: Option<bool>,
    pub event_name: Option<String>,
    pub export_dir: Option<PathBuf>,
    pub export_cleanup_secs: Option<u64>,
    pub username_strategy: Option<String>,
}

/// External directory connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub helper_path: String,
    pub reg_key: String,
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl DirectoryConfig {
    pub fn lookup_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.helper_path)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PORTAL_BASE_URL.to_string(),
            helper_path: DEFAULT_PORTAL_HELPER_PATH.to_string(),
            reg_key: DEFAULT_REG_KEY.to_string(),
            accept_invalid_certs: true,
            timeout: DIRECTORY_TIMEOUT,
        }
    }
}

/// Fully resolved server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub directory: DirectoryConfig,
    pub initial_event_name: String,
    pub export_dir: PathBuf,
    pub export_cleanup: Duration,
    pub username_strategy: UsernameStrategy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            directory: DirectoryConfig::default(),
            initial_event_name: DEFAULT_EVENT_NAME.to_string(),
            export_dir: std::env::temp_dir().join("rollcall-exports"),
            export_cleanup: DEFAULT_EXPORT_CLEANUP,
            username_strategy: UsernameStrategy::default(),
        }
    }
}

impl ServerConfig {
    /// Merge command line/environment over TOML over compiled defaults
    pub fn resolve(args: ServerArgs, toml: ServerToml) -> Self {
        let defaults = Self::default();

        let reg_key = args
            .reg_key
            .or(toml.reg_key)
            .map(|k| strip_quotes(&k))
            .unwrap_or(defaults.directory.reg_key);

        let username_strategy = match args.username_strategy.or(toml.username_strategy) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
                warn!("{}; using default", e);
                defaults.username_strategy
            }),
            None => defaults.username_strategy,
        };

        Self {
            host: args.host.or(toml.host).unwrap_or(defaults.host),
            port: args.port.or(toml.port).unwrap_or(defaults.port),
            directory: DirectoryConfig {
                base_url: args
                    .portal_base_url
                    .or(toml.portal_base_url)
                    .unwrap_or(defaults.directory.base_url),
                helper_path: args
                    .portal_helper_path
                    .or(toml.portal_helper_path)
                    .unwrap_or(defaults.directory.helper_path),
                reg_key,
                accept_invalid_certs: args
                    .portal_insecure_tls
                    .or(toml.portal_insecure_tls)
                    .unwrap_or(defaults.directory.accept_invalid_certs),
                timeout: defaults.directory.timeout,
            },
            initial_event_name: args
                .event_name
                .or(toml.event_name)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(defaults.initial_event_name),
            export_dir: args
                .export_dir
                .or(toml.export_dir)
                .unwrap_or(defaults.export_dir),
            export_cleanup: toml
                .export_cleanup_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.export_cleanup),
            username_strategy,
        }
    }

    /// Resolve from parsed arguments, loading the TOML file they point to
    pub fn load(args: ServerArgs) -> Self {
        let path = args
            .config
            .clone()
            .or_else(|| default_config_path(CONFIG_FILE_NAME));
        let toml: ServerToml = load_toml_config(path.as_deref());
        Self::resolve(args, toml)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ServerConfig::resolve(ServerArgs::default(), ServerToml::default());
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "127.0.0.1:10000");
        assert_eq!(
            config.directory.lookup_url(),
            "https://portal.dlsl.edu.ph/registration/event/helper.php"
        );
        assert_eq!(config.directory.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_args_override_toml() {
        let args = ServerArgs {
            port: Some(8080),
            ..Default::default()
        };
        let toml = ServerToml {
            port: Some(9090),
            host: Some("0.0.0.0".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(args, toml);
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_reg_key_quotes_are_stripped() {
        let toml = ServerToml {
            reg_key: Some("\"ABC123\"".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(ServerArgs::default(), toml);
        assert_eq!(config.directory.reg_key, "ABC123");
    }

    #[test]
    fn test_blank_event_name_falls_back() {
        let args = ServerArgs {
            event_name: Some("   ".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(args, ServerToml::default());
        assert_eq!(config.initial_event_name, DEFAULT_EVENT_NAME);
    }

    #[test]
    fn test_username_strategy_resolution() {
        let toml = ServerToml {
            username_strategy: Some("firstInitialLast".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(ServerArgs::default(), toml);
        assert_eq!(config.username_strategy, UsernameStrategy::FirstInitialLast);

        let args = ServerArgs {
            username_strategy: Some("bogus".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::resolve(args, ServerToml::default());
        assert_eq!(config.username_strategy, UsernameStrategy::Dot);
    }

    #[test]
    fn test_lookup_url_joins_without_double_slash() {
        let directory = DirectoryConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            directory.lookup_url(),
            "http://localhost:9000/registration/event/helper.php"
        );
    }

    #[test]
    fn test_load_reads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 7001\nexport_cleanup_secs = 5").unwrap();
        let args = ServerArgs {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = ServerConfig::load(args);
        assert_eq!(config.port, 7001);
        assert_eq!(config.export_cleanup, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_environment_feeds_args() {
        std::env::set_var("PORT", "7444");
        std::env::set_var("PORTAL_BASE_URL", "http://directory.test");
        let args = ServerArgs::try_parse_from(["rollcall-server"]).unwrap();
        std::env::remove_var("PORT");
        std::env::remove_var("PORTAL_BASE_URL");

        let config = ServerConfig::resolve(args, ServerToml::default());
        assert_eq!(config.port, 7444);
        assert_eq!(config.directory.base_url, "http://directory.test");
    }

    #[test]
    #[serial]
    fn test_command_line_beats_environment() {
        std::env::set_var("PORT", "7444");
        let args = ServerArgs::try_parse_from(["rollcall-server", "--port", "7555"]).unwrap();
        std::env::remove_var("PORT");
        assert_eq!(args.port, Some(7555));
    }
}
