use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub media: MediaConfig,
    pub moderation: ModerationConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on cached pages.
    pub capacity: usize,
    pub index_ttl_secs: u64,
    /// Drop cached feed pages whenever a post is created, edited or deleted.
    pub invalidate_on_post: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: String,
    pub url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    pub comment_denylist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub per_page: usize,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:social_network.db".to_string(),
                max_connections: 5,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            cache: CacheConfig {
                capacity: 1000,
                index_ttl_secs: 20,
                invalidate_on_post: true,
            },
            media: MediaConfig {
                root: "media".to_string(),
                url: "/media/".to_string(),
                max_upload_bytes: 5 * 1024 * 1024,
            },
            moderation: ModerationConfig {
                comment_denylist: vec!["Пушкин".to_string(), "Толстой".to_string()],
            },
            pagination: PaginationConfig { per_page: 10 },
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let mut media_url = env::var("MEDIA_URL").unwrap_or(defaults.media.url);
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        let config = Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", defaults.database.max_connections),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env_or("SERVER_PORT", defaults.server.port),
            },
            cache: CacheConfig {
                capacity: env_or("CACHE_CAPACITY", defaults.cache.capacity),
                index_ttl_secs: env_or("INDEX_CACHE_TTL_SECS", defaults.cache.index_ttl_secs),
                invalidate_on_post: env_or(
                    "INDEX_CACHE_INVALIDATE_ON_POST",
                    defaults.cache.invalidate_on_post,
                ),
            },
            media: MediaConfig {
                root: env::var("MEDIA_ROOT").unwrap_or(defaults.media.root),
                url: media_url,
                max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.media.max_upload_bytes),
            },
            moderation: ModerationConfig {
                comment_denylist: env::var("COMMENT_DENYLIST")
                    .map(|raw| parse_list(&raw))
                    .unwrap_or(defaults.moderation.comment_denylist),
            },
            pagination: PaginationConfig {
                per_page: env_or("POSTS_PER_PAGE", defaults.pagination.per_page),
            },
        };

        if config.pagination.per_page == 0 {
            anyhow::bail!("POSTS_PER_PAGE must be greater than zero");
        }
        if !config.media.url.starts_with('/') {
            anyhow::bail!("MEDIA_URL must be an absolute path, got {}", config.media.url);
        }

        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site_settings() {
        let config = Config::default();
        assert_eq!(config.pagination.per_page, 10);
        assert_eq!(config.moderation.comment_denylist, vec!["Пушкин", "Толстой"]);
        assert!(config.cache.invalidate_on_post);
        assert_eq!(config.server_address(), "0.0.0.0:8000");
    }

    #[test]
    fn denylist_parsing_drops_blanks() {
        assert_eq!(parse_list(" spam, ,eggs,"), vec!["spam", "eggs"]);
        assert!(parse_list("").is_empty());
    }
}
