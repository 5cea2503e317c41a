//! Server configuration, read once from the environment at startup.

use crate::cms::sanity::SanitySettings;
use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {key} value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
    /// Public origin used for canonical links and JSON-LD.
    pub site_url: String,
    /// Hosted CMS settings; `None` means the local sled store.
    pub sanity: Option<SanitySettings>,
    pub preview_password: Option<String>,
    pub session_secret: Option<Vec<u8>>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind = try_load(&var, "HOTEL_BIND", "127.0.0.1:3000")?;
        let db_path = try_load(&var, "HOTEL_DB_PATH", ".hotel_db")?;
        let static_dir = try_load(&var, "STATIC_DIR", "static")?;
        let site_url: String = try_load(&var, "SITE_URL", "http://127.0.0.1:3000")?;

        let sanity = match var("SANITY_PROJECT_ID") {
            Some(project_id) => {
                let timeout_secs: u64 = try_load(&var, "CMS_TIMEOUT_SECS", "10")?;
                Some(SanitySettings {
                    project_id,
                    dataset: try_load(&var, "SANITY_DATASET", "production")?,
                    api_version: try_load(&var, "SANITY_API_VERSION", "2024-01-01")?,
                    read_token: var("SANITY_READ_TOKEN"),
                    write_token: var("SANITY_WRITE_TOKEN"),
                    timeout: Duration::from_secs(timeout_secs),
                })
            }
            None => {
                info!("SANITY_PROJECT_ID not set, using the local document store");
                None
            }
        };

        let preview_password = var("PREVIEW_PASSWORD");
        if preview_password.is_none() {
            warn!("PREVIEW_PASSWORD not set, preview editing is disabled");
        }

        Ok(Self {
            bind,
            db_path,
            static_dir,
            site_url: site_url.trim_end_matches('/').to_string(),
            sanity,
            preview_password,
            session_secret: var("PREVIEW_SESSION_SECRET").map(String::into_bytes),
        })
    }

    pub fn uses_local_store(&self) -> bool {
        self.sanity.is_none()
    }

    pub fn can_write(&self) -> bool {
        match &self.sanity {
            Some(s) => s.write_token.is_some(),
            None => true,
        }
    }
}

fn try_load<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.db_path, PathBuf::from(".hotel_db"));
        assert!(config.uses_local_store());
        assert!(config.can_write());
        assert!(config.preview_password.is_none());
        assert!(config.session_secret.is_none());
    }

    #[test]
    fn test_sanity_settings() {
        let config = load(&[
            ("SANITY_PROJECT_ID", "abc123"),
            ("SANITY_READ_TOKEN", "read"),
            ("CMS_TIMEOUT_SECS", "4"),
            ("SITE_URL", "https://seaview.example/"),
        ])
        .unwrap();
        let sanity = config.sanity.as_ref().unwrap();
        assert_eq!(sanity.project_id, "abc123");
        assert_eq!(sanity.dataset, "production");
        assert_eq!(sanity.timeout, Duration::from_secs(4));
        assert_eq!(sanity.read_token.as_deref(), Some("read"));
        assert!(!config.can_write());
        assert_eq!(config.site_url, "https://seaview.example");
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = load(&[("PREVIEW_PASSWORD", "   "), ("SANITY_PROJECT_ID", "")]).unwrap();
        assert!(config.preview_password.is_none());
        assert!(config.uses_local_store());
    }

    #[test]
    fn test_invalid_value() {
        let err = load(&[("HOTEL_BIND", "not-an-address")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "HOTEL_BIND", .. }));
    }
}
