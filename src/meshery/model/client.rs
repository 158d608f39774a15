use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Serialize, Serializer};
use tracing::{debug, instrument};

use crate::meshery::model::archive::ModelPayload;
use crate::meshery::model::error::{ImportError, Result};
use crate::meshery::model::response::{RESPONSE_BODY, RegistryResponse};

/// Server used when neither a flag nor the environment names one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:9081";
/// Environment variable holding the server base URL.
pub const SERVER_URL_ENV: &str = "MESHERY_SERVER_URL";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "MESHERY_TIMEOUT_SECS";
/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Registration endpoint, relative to the server base URL.
pub const REGISTER_PATH: &str = "/api/meshmodels/register";

/// Where and how to reach the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl RegistryConfig {
    /// Creates a configuration for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the registration endpoint.
    pub fn register_url(&self) -> String {
        format!("{}{REGISTER_PATH}", self.base_url.trim_end_matches('/'))
    }
}

/// Upload mode understood by the registry. Only `File` is produced here;
/// `Url` is reserved for URL-based imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    File,
    Url,
}

/// Payload section of a registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportBody {
    #[serde(serialize_with = "serialize_base64")]
    pub model_file: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub file_name: String,
}

/// JSON body POSTed to the registration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub import_body: ImportBody,
    pub upload_type: UploadType,
}

impl RegistrationRequest {
    /// Wraps a prepared payload as a file upload.
    pub fn from_payload(payload: ModelPayload) -> Self {
        Self {
            import_body: ImportBody {
                model_file: payload.data,
                url: None,
                file_name: payload.file_name,
            },
            upload_type: UploadType::File,
        }
    }
}

fn serialize_base64<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// Blocking client for the registration endpoint.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    config: RegistryConfig,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ImportError::HttpClient)?;
        Ok(Self::with_http_client(config, client))
    }

    /// Uses a caller-built HTTP client, e.g. one with custom proxy or TLS
    /// settings. The configured timeout is not applied to it.
    pub fn with_http_client(config: RegistryConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Submits one registration request and decodes the reply.
    ///
    /// Any status outside the 2xx range is an error naming the method and
    /// URL. The body is read in full before decoding.
    #[instrument(
        level = "info",
        skip_all,
        fields(url = %self.config.register_url(), file_name = %request.import_body.file_name)
    )]
    pub fn register(&self, request: &RegistrationRequest) -> Result<RegistryResponse> {
        let method = Method::POST;
        let url = self.config.register_url();
        let body = serde_json::to_vec(request).map_err(ImportError::Serialize)?;
        debug!(body_size = body.len(), "sending registration request");

        let response = self
            .client
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|source| ImportError::Transport {
                method: method.to_string(),
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ImportError::Status {
                method: method.to_string(),
                url,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().map_err(|source| ImportError::DataRead {
            origin: RESPONSE_BODY,
            source,
        })?;
        debug!(status = status.as_u16(), size = bytes.len(), "received registry response");
        RegistryResponse::from_slice(&bytes)
    }
}
