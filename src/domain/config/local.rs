use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    #[serde(rename = "gcp")]
    Gcp,
    #[serde(rename = "local")]
    Local,
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gcp" => Ok(Provider::Gcp),
            "local" => Ok(Provider::Local),
            other => Err(format!("unknown storage provider '{}'", other)),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gcp => f.write_str("gcp"),
            Provider::Local => f.write_str("local"),
        }
    }
}

/// Settings owned by this instance: which backend it writes to and how local
/// files are addressed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LocalConfig {
    pub provider: Provider,
    pub host: String,
    pub port: u16,
    #[serde(rename = "storageRoot")]
    pub storage_root: PathBuf,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Local,
            host: "127.0.0.1".to_string(),
            port: 3000,
            storage_root: PathBuf::from("./assets/images"),
        }
    }
}
