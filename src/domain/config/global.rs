use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_WORKER_COUNT: usize = 5;
pub const DEFAULT_BATCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_SIZE: u64 = 2 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GlobalConfig {
    #[serde(rename = "extensions")]
    pub extensions: Vec<String>,
    #[serde(rename = "maxSize")]
    pub max_size: u64,
    #[serde(rename = "workerCount")]
    pub worker_count: usize,
    #[serde(rename = "batchTimeoutSecs")]
    pub batch_timeout_secs: u64,
}

impl GlobalConfig {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
            max_size: DEFAULT_MAX_SIZE,
            worker_count: DEFAULT_WORKER_COUNT,
            batch_timeout_secs: DEFAULT_BATCH_TIMEOUT_SECS,
        }
    }
}
