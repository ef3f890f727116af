// src/core/config.rs
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use log::LevelFilter;

// Configuration for the server and auth layers
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Web interface
    pub host: String,
    pub port: u16,

    // Session
    pub jwt_secret: Option<String>,
    pub session_duration: Duration,
    pub session_dir: Option<PathBuf>,

    // Logging
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/keyhaven.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            jwt_secret: None, // Generated and persisted on first run
            session_duration: Duration::from_secs(60 * 60), // 1 hour
            session_dir: None, // Will be initialized in load()
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    // Load configuration from environment variables
    pub fn load() -> Self {
        let mut config = Config::default();

        // Set session directory based on app data dir
        config.session_dir = crate::utils::get_app_data_dir().map(|path| path.join("sessions"));

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }

        if let Ok(val) = env::var("PORT") {
            if let Ok(port) = val.parse() {
                config.port = port;
            }
        }

        if let Ok(secret) = env::var("JWT_SECRET") {
            if !secret.trim().is_empty() {
                config.jwt_secret = Some(secret);
            }
        }

        if let Ok(val) = env::var("SESSION_DURATION_MINUTES") {
            if let Ok(duration) = val.parse::<u64>() {
                config.session_duration = Duration::from_secs(duration * 60);
            }
        }

        if let Ok(dir) = env::var("SESSION_DIRECTORY") {
            config.session_dir = Some(PathBuf::from(dir));
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            match level.to_lowercase().as_str() {
                "error" => config.log_level = LevelFilter::Error,
                "warn" => config.log_level = LevelFilter::Warn,
                "info" => config.log_level = LevelFilter::Info,
                "debug" => config.log_level = LevelFilter::Debug,
                "trace" => config.log_level = LevelFilter::Trace,
                _ => {}
            }
        }

        config
    }

    // Normalize the configured URL for the backend dispatcher
    pub fn get_database_url(&self) -> String {
        let url = &self.database_url;
        if url.starts_with("sqlite:")
            || url.starts_with("postgres://")
            || url.starts_with("postgresql://")
        {
            url.clone()
        } else {
            // A bare path means SQLite
            format!("sqlite:{}", url)
        }
    }

    // Create directories needed for operation
    pub fn ensure_directories_exist(&self) {
        if let Some(session_dir) = &self.session_dir {
            if !session_dir.exists() {
                if let Err(e) = std::fs::create_dir_all(session_dir) {
                    log::warn!("Failed to create session directory: {}", e);
                }
            }
        }

        let db_url = self.get_database_url();
        if let Some(db_path) = db_url.strip_prefix("sqlite:") {
            if let Some(parent) = PathBuf::from(db_path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        log::warn!("Failed to create SQLite database directory: {}", e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_paths_are_treated_as_sqlite() {
        let config = Config {
            database_url: "./data/test.db".into(),
            ..Config::default()
        };
        assert_eq!(config.get_database_url(), "sqlite:./data/test.db");
    }

    #[test]
    fn scheme_prefixed_urls_pass_through() {
        for url in [
            "sqlite:./data/test.db",
            "postgres://user:pw@localhost/keyhaven",
            "postgresql://user:pw@localhost/keyhaven",
        ] {
            let config = Config {
                database_url: url.into(),
                ..Config::default()
            };
            assert_eq!(config.get_database_url(), url);
        }
    }
}
