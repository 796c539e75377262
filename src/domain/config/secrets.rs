use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GcpSecrets {
    #[serde(rename = "bucketName")]
    pub bucket_name: String,
    /// Service-account key file contents.
    #[serde(rename = "credentials")]
    pub credentials: Option<String>,
    /// Pre-issued bearer token, used instead of `credentials` when set.
    #[serde(rename = "accessToken")]
    pub access_token: Option<String>,
    #[serde(rename = "endpoint")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Secrets {
    #[serde(rename = "gcpSecrets")]
    pub gcp_secrets: Option<GcpSecrets>,
}
