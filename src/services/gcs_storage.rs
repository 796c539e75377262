use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tracing::debug;

use crate::{
    domain::config::secrets::GcpSecrets,
    services::{error::StorageError, remote_storage::ObjectStoreClient},
};

pub const GCS_DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
const GCS_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.full_control";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    generation: String,
}

enum GcsAuth {
    ServiceAccount(ServiceAccountCredentials),
    AccessToken(String),
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Google Cloud Storage JSON API client.
pub struct GcsClient {
    client: Client,
    endpoint: String,
    bucket: String,
    auth: GcsAuth,
    access_token: tokio::sync::Mutex<Option<CachedToken>>,
}

impl GcsClient {
    pub fn new(secrets: GcpSecrets) -> Result<Self, StorageError> {
        let auth = match (secrets.access_token, secrets.credentials) {
            (Some(token), _) => GcsAuth::AccessToken(token),
            (None, Some(raw)) => GcsAuth::ServiceAccount(
                serde_json::from_str(&raw)
                    .map_err(|e| StorageError::InvalidCredentials(e.to_string()))?,
            ),
            (None, None) => {
                return Err(StorageError::InvalidCredentials(
                    "GCP credentials or access token required".to_string(),
                ))
            }
        };

        let endpoint = secrets
            .endpoint
            .unwrap_or_else(|| GCS_DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        Url::parse(&endpoint)
            .map_err(|e| StorageError::InvalidCredentials(format!("invalid endpoint: {}", e)))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            bucket: secrets.bucket_name,
            auth,
            access_token: tokio::sync::Mutex::new(None),
        })
    }

    /// Root that object keys are appended to for their public URL.
    pub fn public_root(&self) -> String {
        format!("{}/{}", self.endpoint, self.bucket)
    }

    async fn get_access_token(&self) -> Result<String, StorageError> {
        let credentials = match &self.auth {
            GcsAuth::AccessToken(token) => return Ok(token.clone()),
            GcsAuth::ServiceAccount(credentials) => credentials,
        };

        let mut cached = self.access_token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) {
                return Ok(token.value.clone());
            }
        }

        let jwt = self.create_jwt(credentials)?;

        let response = self
            .client
            .post(&credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(StorageError::Unauthorized(format!(
                "token exchange failed with status {}: {}",
                status, error_text
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Unauthorized(e.to_string()))?;

        debug!("Obtained GCS access token for {}", credentials.client_email);

        let expires_in = token_response.expires_in.unwrap_or(TOKEN_LIFETIME_SECS);
        *cached = Some(CachedToken {
            value: token_response.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(expires_in),
        });

        Ok(token_response.access_token)
    }

    fn create_jwt(&self, credentials: &ServiceAccountCredentials) -> Result<String, StorageError> {
        use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
        use serde::Serialize;

        #[derive(Serialize)]
        struct Claims {
            iss: String,
            scope: String,
            aud: String,
            exp: i64,
            iat: i64,
        }

        let now = Utc::now().timestamp();

        let claims = Claims {
            iss: credentials.client_email.clone(),
            scope: GCS_SCOPE.to_string(),
            aud: credentials.token_uri.clone(),
            exp: now + TOKEN_LIFETIME_SECS,
            iat: now,
        };

        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| StorageError::InvalidCredentials(e.to_string()))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| StorageError::InternalError(e.to_string()))
    }

    /// `{endpoint}/{prefix...}/b/{bucket}/o[/{key}][/{suffix}]`, with the key
    /// encoded as a single path segment.
    fn object_url(
        &self,
        prefix: &[&str],
        key: Option<&str>,
        suffix: Option<&str>,
    ) -> Result<Url, StorageError> {
        let mut url =
            Url::parse(&self.endpoint).map_err(|e| StorageError::InternalError(e.to_string()))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StorageError::InternalError("endpoint cannot be a base".to_string())
            })?;
            segments.pop_if_empty();
            segments.extend(prefix);
            segments.extend(["b", self.bucket.as_str(), "o"]);
            if let Some(key) = key {
                segments.push(key);
            }
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    async fn check(response: Response, context: &str) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response.text().await.unwrap_or_default();
        Err(StorageError::from_status(
            status,
            format!("{}: {}", context, error_text),
        ))
    }
}

#[async_trait]
impl ObjectStoreClient for GcsClient {
    async fn write_object(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let token = self.get_access_token().await?;
        let url = self.object_url(&["upload", "storage", "v1"], None, None)?;

        let response = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", key)])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content)
            .send()
            .await
            .map_err(StorageError::from)?;

        Self::check(response, &format!("upload {}", key)).await?;
        Ok(())
    }

    async fn grant_public_read(&self, key: &str) -> Result<(), StorageError> {
        let token = self.get_access_token().await?;
        let url = self.object_url(&["storage", "v1"], Some(key), Some("acl"))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&serde_json::json!({
                "entity": "allUsers",
                "role": "READER",
            }))
            .send()
            .await
            .map_err(StorageError::from)?;

        Self::check(response, &format!("set acl on {}", key)).await?;
        Ok(())
    }

    async fn object_generation(&self, key: &str) -> Result<i64, StorageError> {
        let token = self.get_access_token().await?;
        let url = self.object_url(&["storage", "v1"], Some(key), None)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(StorageError::from)?;

        let object: ObjectResource = Self::check(response, &format!("attrs of {}", key))
            .await?
            .json()
            .await
            .map_err(|e| StorageError::ProviderError(e.to_string()))?;

        object.generation.parse().map_err(|_| {
            StorageError::ProviderError(format!(
                "invalid generation '{}' for {}",
                object.generation, key
            ))
        })
    }

    async fn delete_generation(&self, key: &str, generation: i64) -> Result<(), StorageError> {
        let token = self.get_access_token().await?;
        let url = self.object_url(&["storage", "v1"], Some(key), None)?;

        let response = self
            .client
            .delete(url)
            .query(&[("ifGenerationMatch", generation.to_string())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(StorageError::from)?;

        Self::check(response, &format!("delete {}", key)).await?;
        Ok(())
    }
}
