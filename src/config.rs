use std::env;
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_CACHE_DIR: &str = ".portfolio-cache";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("API_BASE_URL must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),

    #[error("PORTFOLIO_CACHE_DIR must not be empty")]
    EmptyCacheDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub cache_dir: PathBuf,
}

impl AppConfig {
    /// Loads `.env.{RUST_ENV}` (falling back to `.env`) into the process
    /// environment, then reads the configuration from it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let env_file = format!(".env.{}", env_name);
        if dotenvy::from_filename(&env_file).is_err() {
            dotenvy::dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup("API_BASE_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(api_base_url));
        }

        let cache_dir = match lookup("PORTFOLIO_CACHE_DIR") {
            Some(dir) if dir.trim().is_empty() => return Err(ConfigError::EmptyCacheDir),
            Some(dir) => PathBuf::from(dir.trim()),
            None => PathBuf::from(DEFAULT_CACHE_DIR),
        };

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            cache_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let config =
            AppConfig::from_lookup(lookup_from(&[("API_BASE_URL", "https://api.example.com/api/")]))
                .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com/api");
    }

    #[test]
    fn rejects_non_http_base_url() {
        assert_eq!(
            AppConfig::from_lookup(lookup_from(&[("API_BASE_URL", "ftp://nope")])),
            Err(ConfigError::InvalidBaseUrl("ftp://nope".into()))
        );
    }

    #[test]
    fn rejects_blank_cache_dir() {
        assert_eq!(
            AppConfig::from_lookup(lookup_from(&[("PORTFOLIO_CACHE_DIR", "  ")])),
            Err(ConfigError::EmptyCacheDir)
        );
    }
}
