use std::{net::SocketAddr, path::PathBuf};

use serde::Deserialize;
use tower_cookies::Key;

/// Runtime settings, read from `YATUBE_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Postgres connection string. Without it posts live in process memory.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_db_pool_size")]
    pub db_pool_size: usize,
    /// Must be at least 64 bytes long.
    #[serde(default)]
    pub cookies_secret: Option<String>,
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    #[serde(default = "default_media_url")]
    pub media_url: String,
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: i64,
    #[serde(default = "default_index_cache_ttl_secs")]
    pub index_cache_ttl_secs: u64,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        envy::prefixed("YATUBE_").from_env::<Config>()
    }

    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn cookies_key(&self) -> Option<Key> {
        let secret = self.cookies_secret.as_ref()?;

        Key::try_from(secret.as_bytes())
            .map_err(|e| {
                tracing::error!("invalid cookies secret: {e}");
            })
            .ok()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            db_pool_size: default_db_pool_size(),
            cookies_secret: None,
            media_root: default_media_root(),
            media_url: default_media_url(),
            posts_per_page: default_posts_per_page(),
            index_cache_ttl_secs: default_index_cache_ttl_secs(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

fn default_host() -> String {
    String::from("127.0.0.1")
}

fn default_port() -> u16 {
    6060
}

fn default_db_pool_size() -> usize {
    5
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_media_url() -> String {
    String::from("/media/")
}

fn default_posts_per_page() -> i64 {
    10
}

fn default_index_cache_ttl_secs() -> u64 {
    20
}

fn default_session_ttl_hours() -> i64 {
    48
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_cookies_secret_is_rejected() {
        let config = Config {
            cookies_secret: Some(String::from("too short")),
            ..Default::default()
        };

        assert!(config.cookies_key().is_none());
    }

    #[test]
    fn long_cookies_secret_builds_a_key() {
        let config = Config {
            cookies_secret: Some("k".repeat(64)),
            ..Default::default()
        };

        assert!(config.cookies_key().is_some());
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();

        assert_eq!(config.posts_per_page, 10);
        assert_eq!(config.index_cache_ttl_secs, 20);
        assert_eq!(config.addr().unwrap().port(), 6060);
    }
}
