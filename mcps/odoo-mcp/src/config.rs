//! Configuration for the Odoo MCP server
//!
//! Configuration is layered, later sources winning:
//! 1. Defaults
//! 2. Config file: `--config`, `ODOO_MCP_CONFIG` (or `MCP_CONFIG_FILE`), or
//!    `~/.config/odoo-mcp/config.toml` (TOML; JSON if the file ends in `.json`)
//! 3. Environment: `ODOO_URL`, `ODOO_DB`, `ODOO_USERNAME`, `ODOO_PASSWORD`,
//!    `ODOO_TIMEOUT`, `ODOO_VERIFY_SSL`, `MCP_TRANSPORT`, `HOST`, `PORT`,
//!    `LOG_LEVEL`
//! 4. Command-line flags (applied by `main`)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use odoo_rpc::Credentials;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config from {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Which front-end serves the MCP protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Newline-delimited JSON-RPC over stdin/stdout
    #[default]
    Stdio,
    /// Streamable HTTP (`sse` is accepted as a legacy name)
    #[serde(alias = "sse")]
    #[value(alias = "sse")]
    Http,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(TransportMode::Stdio),
            "http" | "sse" => Ok(TransportMode::Http),
            _ => Err(ConfigError::InvalidValue {
                name: "transport",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Stdio => f.write_str("stdio"),
            TransportMode::Http => f.write_str("http"),
        }
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub odoo: OdooConfig,
    #[serde(default, alias = "mcp")]
    pub server: ServerConfig,
    /// File the configuration was read from; `None` when built from the
    /// environment alone
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Backend connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct OdooConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "db")]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout", alias = "timeout")]
    pub timeout_secs: u64,
    /// Verify the server's TLS certificate
    #[serde(default)]
    pub verify_ssl: bool,
}

/// MCP front-end settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub transport: TransportMode,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_timeout() -> u64 {
    60
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for OdooConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            database: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout(),
            verify_ssl: false,
        }
    }
}

impl fmt::Debug for OdooConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdooConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::default(),
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

impl OdooConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.url, &self.database, &self.username, &self.password)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load file and environment layers, then validate
    ///
    /// Runs before logging is set up, so the file used is recorded in
    /// [`source`](Self::source) for the caller to report.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_path(|key| std::env::var(key).ok()).filter(|p| p.exists()),
        };
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file, TOML or JSON by extension
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let parsed = if is_json {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };

        let mut config: Self = parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    fn find_config_path<F>(lookup: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("ODOO_MCP_CONFIG").or_else(|| lookup("MCP_CONFIG_FILE")) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("odoo-mcp").join("config.toml"))
    }

    /// Apply environment-style overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ODOO_URL") {
            self.odoo.url = v;
        }
        if let Some(v) = lookup("ODOO_DB") {
            self.odoo.database = v;
        }
        if let Some(v) = lookup("ODOO_USERNAME") {
            self.odoo.username = v;
        }
        if let Some(v) = lookup("ODOO_PASSWORD") {
            self.odoo.password = v;
        }
        if let Some(v) = lookup("ODOO_TIMEOUT") {
            self.odoo.timeout_secs = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "ODOO_TIMEOUT",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("ODOO_VERIFY_SSL") {
            self.odoo.verify_ssl = v.trim().eq_ignore_ascii_case("true") || v.trim() == "1";
        }
        if let Some(v) = lookup("MCP_TRANSPORT") {
            self.server.transport = v.parse()?;
        }
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.server.log_level = v.to_ascii_lowercase();
        }
        Ok(())
    }

    /// Check required values and normalise the URL
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.odoo.url.trim().is_empty() {
            return Err(ConfigError::Missing("ODOO_URL"));
        }
        if self.odoo.database.trim().is_empty() {
            return Err(ConfigError::Missing("ODOO_DB"));
        }
        if self.odoo.username.trim().is_empty() {
            return Err(ConfigError::Missing("ODOO_USERNAME"));
        }
        if self.odoo.password.is_empty() {
            return Err(ConfigError::Missing("ODOO_PASSWORD"));
        }
        if self.odoo.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "timeout_secs",
                value: "0".to_string(),
            });
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                name: "port",
                value: "0".to_string(),
            });
        }

        self.odoo.url = self.odoo.url.trim().trim_end_matches('/').to_string();
        Ok(())
    }

    /// Loggable view of the configuration, password hidden
    pub fn redacted(&self) -> serde_json::Value {
        json!({
            "odoo": {
                "url": self.odoo.url,
                "database": self.odoo.database,
                "username": self.odoo.username,
                "password": "***",
                "timeout_secs": self.odoo.timeout_secs,
                "verify_ssl": self.odoo.verify_ssl,
            },
            "server": {
                "transport": self.server.transport.to_string(),
                "host": self.server.host,
                "port": self.server.port,
                "log_level": self.server.log_level,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("ODOO_URL", "https://erp.example.com/"),
            ("ODOO_DB", "prod"),
            ("ODOO_USERNAME", "bot@example.com"),
            ("ODOO_PASSWORD", "s3cret"),
        ]
    }

    #[test]
    fn test_env_only_config() {
        let mut config = Config::default();
        config.apply_overrides(env(&complete_env())).unwrap();
        config.validate().unwrap();

        assert_eq!(config.odoo.url, "https://erp.example.com");
        assert_eq!(config.odoo.timeout_secs, 60);
        assert!(!config.odoo.verify_ssl);
        assert_eq!(config.server.transport, TransportMode::Stdio);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_missing_values_are_reported_by_name() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("ODOO_URL", "http://x"), ("ODOO_DB", "db")]))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "ODOO_USERNAME is required");
    }

    #[test]
    fn test_transport_and_port_overrides() {
        let mut vars = complete_env();
        vars.extend([("MCP_TRANSPORT", "sse"), ("PORT", "9100"), ("ODOO_VERIFY_SSL", "TRUE")]);

        let mut config = Config::default();
        config.apply_overrides(env(&vars)).unwrap();
        assert_eq!(config.server.transport, TransportMode::Http);
        assert_eq!(config.server.port, 9100);
        assert!(config.odoo.verify_ssl);
    }

    #[test]
    fn test_invalid_overrides() {
        let mut config = Config::default();
        assert!(config
            .apply_overrides(env(&[("MCP_TRANSPORT", "carrier-pigeon")]))
            .is_err());
        assert!(config.apply_overrides(env(&[("PORT", "70000")])).is_err());
        assert!(config.apply_overrides(env(&[("ODOO_TIMEOUT", "soon")])).is_err());
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[odoo]
url = "http://localhost:8069"
db = "demo"
username = "admin"
password = "admin"
timeout_secs = 15

[server]
transport = "http"
port = 8765
"#
        )
        .unwrap();

        let mut config = Config::from_file(file.path()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.source.as_deref(), Some(file.path()));
        assert_eq!(config.odoo.database, "demo");
        assert_eq!(config.odoo.timeout(), Duration::from_secs(15));
        assert_eq!(config.server.transport, TransportMode::Http);
        assert_eq!(config.server.port, 8765);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_json_file_with_legacy_section_names() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"odoo": {{"url": "http://localhost:8069", "database": "demo",
                "username": "admin", "password": "admin", "timeout": 30}},
               "mcp": {{"transport": "stdio"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.odoo.timeout_secs, 30);
        assert_eq!(config.server.transport, TransportMode::Stdio);
    }

    #[test]
    fn test_config_file_env_names() {
        assert_eq!(
            Config::find_config_path(env(&[("MCP_CONFIG_FILE", "/etc/odoo-mcp.toml")])),
            Some(PathBuf::from("/etc/odoo-mcp.toml"))
        );
        assert_eq!(
            Config::find_config_path(env(&[
                ("MCP_CONFIG_FILE", "/etc/odoo-mcp.toml"),
                ("ODOO_MCP_CONFIG", "/srv/odoo.json"),
            ])),
            Some(PathBuf::from("/srv/odoo.json"))
        );
    }

    #[test]
    fn test_env_only_config_has_no_source() {
        let mut config = Config::default();
        config.apply_overrides(env(&complete_env())).unwrap();
        assert!(config.source.is_none());
    }

    #[test]
    fn test_unparsable_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "this is = = not toml").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_redacted_hides_password() {
        let mut config = Config::default();
        config.apply_overrides(env(&complete_env())).unwrap();
        let shown = config.redacted().to_string();
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("bot@example.com"));
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
