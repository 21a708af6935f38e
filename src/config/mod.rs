// Configuration module entry point
// Loads layered configuration and builds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::path::Path;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LogFormat, LogLevel, LoggingConfig, PerformanceConfig, ServerConfig,
    StoreConfig,
};

/// Default config file (without extension) when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the optional
    /// config file, then `REPLAY__SECTION__KEY` environment variables.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("REPLAY").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("store.root", "")?
            .set_default("store.preview_header", "X-Purpose")?
            .set_default("store.preview_value", "preview")?
            .set_default("store.preview_suffix", ".preview")?
            .set_default("logging.level", "info")?
            .set_default("logging.replay_log", true)?
            .set_default("logging.format", "text")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "replay-server")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.store.root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "store.root is required".to_string(),
            ));
        }
        if !Path::new(&self.store.root).is_dir() {
            return Err(config::ConfigError::Message(format!(
                "store.root '{}' is not a directory",
                self.store.root
            )));
        }
        if self.store.preview_header.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "store.preview_header must not be empty".to_string(),
            ));
        }
        if self.store.preview_suffix.contains(['/', '\\']) {
            return Err(config::ConfigError::Message(format!(
                "store.preview_suffix '{}' must not contain path separators",
                self.store.preview_suffix
            )));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
pub(crate) fn test_config(root: &Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: None,
        },
        store: StoreConfig {
            root: root.display().to_string(),
            preview_header: "X-Purpose".to_string(),
            preview_value: "preview".to_string(),
            preview_suffix: ".preview".to_string(),
        },
        logging: LoggingConfig {
            level: LogLevel::Info,
            replay_log: true,
            format: LogFormat::Text,
            access_log_file: None,
            error_log_file: None,
        },
        performance: PerformanceConfig {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
        },
        http: HttpConfig {
            server_name: "replay-server".to_string(),
            max_body_size: 1024,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_from_file_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("data");
        fs::create_dir(&root).unwrap();
        let cfg_path = dir.path().join("replay.toml");
        fs::write(
            &cfg_path,
            format!("[store]\nroot = \"{}\"\n\n[server]\nport = 9090\n", root.display()),
        )
        .unwrap();

        let cfg = Config::load_from(cfg_path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.store.preview_header, "X-Purpose");
        assert_eq!(cfg.store.preview_suffix, ".preview");
        assert_eq!(cfg.logging.level, LogLevel::Info);
        assert_eq!(cfg.logging.format, LogFormat::Text);
        assert_eq!(cfg.http.max_body_size, 10_485_760);
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 9090);
    }

    #[test]
    fn test_missing_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("empty.toml");
        fs::write(&cfg_path, "[server]\nport = 9090\n").unwrap();

        let err = Config::load_from(cfg_path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("store.root is required"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();

        let mut cfg = test_config(&dir.path().join("missing"));
        assert!(cfg.validate().is_err());

        cfg = test_config(dir.path());
        assert!(cfg.validate().is_ok());

        cfg.store.preview_suffix = "/preview".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_address() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        cfg.server.host = "not an ip".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
