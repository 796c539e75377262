pub mod global;
pub mod local;
pub mod secrets;

use std::{path::PathBuf, str::FromStr};

use thiserror::Error;

use global::GlobalConfig;
use local::{LocalConfig, Provider};
use secrets::{GcpSecrets, Secrets};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub local: LocalConfig,
    pub global: GlobalConfig,
    pub secrets: Secrets,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults
    /// for unset optional keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let local_defaults = LocalConfig::default();
        let global_defaults = GlobalConfig::default();

        let provider = parse_or(
            "STORAGE_PROVIDER",
            get("STORAGE_PROVIDER"),
            local_defaults.provider,
        )?;

        let local = LocalConfig {
            provider,
            host: get("APP_HOST").unwrap_or(local_defaults.host),
            port: parse_or("APP_PORT", get("APP_PORT"), local_defaults.port)?,
            storage_root: get("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(local_defaults.storage_root),
        };

        let extensions = get("ALLOWED_EXTENSIONS")
            .map(|raw| {
                raw.split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|ext| !ext.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or(global_defaults.extensions);

        let worker_count = parse_or(
            "TRANSFER_WORKERS",
            get("TRANSFER_WORKERS"),
            global_defaults.worker_count,
        )?;
        if worker_count == 0 {
            return Err(ConfigError::Invalid {
                key: "TRANSFER_WORKERS",
                value: "0".to_string(),
                reason: "at least one worker is required".to_string(),
            });
        }

        let batch_timeout_secs = parse_or(
            "TRANSFER_TIMEOUT_SECS",
            get("TRANSFER_TIMEOUT_SECS"),
            global_defaults.batch_timeout_secs,
        )?;
        if batch_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "TRANSFER_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "timeout must be positive".to_string(),
            });
        }

        let global = GlobalConfig {
            extensions,
            max_size: parse_or("FILE_LIMIT", get("FILE_LIMIT"), global_defaults.max_size)?,
            worker_count,
            batch_timeout_secs,
        };

        let gcp_secrets = match provider {
            Provider::Gcp => Some(GcpSecrets {
                bucket_name: get("GCP_BUCKET").ok_or(ConfigError::Missing("GCP_BUCKET"))?,
                credentials: get("GCP_CREDENTIALS"),
                access_token: get("GCP_ACCESS_TOKEN"),
                endpoint: get("GCS_ENDPOINT"),
            }),
            Provider::Local => None,
        };

        Ok(Self {
            local,
            global,
            secrets: Secrets { gcp_secrets },
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}
