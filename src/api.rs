// API client module: a small blocking HTTP client for the shop's theme
// asset endpoints. Requests are issued one at a time by the engine, so
// a single client is built per process and shared by reference.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::OnceCell;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::EngineError;
use crate::payload::AssetPayload;

/// Port every request goes to.
pub const API_PORT: u16 = 443;

/// Timeout applied to each request. A timed-out call surfaces as a
/// `RequestError`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const INVALID_REQUEST_ERROR: &str = "ShopifyInvalidRequestError";
pub const GENERIC_ERROR: &str = "ShopifyError";
pub const REQUEST_ERROR: &str = "RequestError";
pub const PARSE_ERROR: &str = "ResponseParseError";

/// Private app credentials and the shop host they belong to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub password: String,
    pub host: String,
}

impl Credentials {
    /// `api_key:password`, as sent in the basic auth header
    pub fn auth(&self) -> String {
        format!("{}:{}", self.api_key, self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("password", &"***")
            .field("host", &self.host)
            .finish()
    }
}

/// A theme as listed by the shop.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.name)?;
        if let Some(role) = &self.role {
            write!(f, " ({})", role)?;
        }
        Ok(())
    }
}

/// Response of the theme list endpoint. `themes` is absent when the
/// shop answers with something unexpected.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ThemeList {
    #[serde(default)]
    pub themes: Option<Vec<Theme>>,
}

/// Validation detail attached to invalid request errors.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetail {
    #[serde(default)]
    pub asset: Vec<String>,
}

/// Error returned by the remote service or the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: String,
    pub detail: Option<ErrorDetail>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            detail: None,
            message: message.into(),
        }
    }

    /// Invalid request error carrying asset validation messages
    pub fn invalid(asset_messages: Vec<String>) -> Self {
        Self {
            kind: INVALID_REQUEST_ERROR.to_string(),
            message: asset_messages.join(", "),
            detail: Some(ErrorDetail {
                asset: asset_messages,
            }),
        }
    }

    /// Asset validation messages, when the error is an invalid request
    /// with structured detail.
    pub fn asset_messages(&self) -> Option<&[String]> {
        if self.kind != INVALID_REQUEST_ERROR {
            return None;
        }
        self.detail
            .as_ref()
            .filter(|d| !d.asset.is_empty())
            .map(|d| d.asset.as_slice())
    }

    fn from_status(status: StatusCode, body: &str) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            errors: serde_json::Value,
        }

        let errors = serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.errors);
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let asset = errors
                .as_ref()
                .and_then(|e| e.get("asset"))
                .and_then(|a| serde_json::from_value::<Vec<String>>(a.clone()).ok());
            if let Some(asset) = asset {
                return Self::invalid(asset);
            }
            return Self::new(INVALID_REQUEST_ERROR, format!("{} - {}", status, body));
        }

        let message = match errors {
            Some(serde_json::Value::String(s)) => format!("{} - {}", status, s),
            _ => format!("{} - {}", status, body),
        };
        Self::new(GENERIC_ERROR, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Remote operations the sync engine depends on.
pub trait ThemeApi {
    fn list_themes(&self) -> Result<ThemeList, ApiError>;

    /// Create or update an asset. `None` targets the legacy unscoped
    /// asset store (the shop's main theme).
    fn update_asset(
        &self,
        theme_id: Option<u64>,
        payload: &AssetPayload,
    ) -> Result<serde_json::Value, ApiError>;

    fn delete_asset(&self, theme_id: Option<u64>, key: &str)
        -> Result<serde_json::Value, ApiError>;
}

/// Blocking client bound to one shop and one credential set.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client for `credentials`. No request is sent.
    pub fn new(credentials: &Credentials) -> Result<Self, EngineError> {
        Self::with_base_url(credentials, base_url(&credentials.host), REQUEST_TIMEOUT)
    }

    /// Build a client talking to `base_url` instead of the shop host.
    pub fn with_base_url(
        credentials: &Credentials,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .default_headers(auth_headers(credentials)?)
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Client(e.to_string()))?;
        let base_url: String = base_url.into();
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn assets_url(&self, theme_id: Option<u64>) -> String {
        match theme_id {
            Some(id) => format!("{}/admin/themes/{}/assets.json", self.base_url, id),
            None => format!("{}/admin/assets.json", self.base_url),
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(res: Response) -> Result<T, ApiError> {
        let status = res.status();
        let body = res
            .text()
            .map_err(|e| ApiError::new(REQUEST_ERROR, e.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }
        let body = if body.trim().is_empty() { "{}" } else { &body };
        serde_json::from_str(body).map_err(|e| ApiError::new(PARSE_ERROR, e.to_string()))
    }
}

impl ThemeApi for ApiClient {
    fn list_themes(&self) -> Result<ThemeList, ApiError> {
        let url = format!("{}/admin/themes.json", self.base_url);
        debug!("GET {}", url);
        let res = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ApiError::new(REQUEST_ERROR, e.to_string()))?;
        Self::read_json(res)
    }

    fn update_asset(
        &self,
        theme_id: Option<u64>,
        payload: &AssetPayload,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.assets_url(theme_id);
        debug!("PUT {} key={}", url, payload.key());
        let res = self
            .client
            .put(&url)
            .json(payload)
            .send()
            .map_err(|e| ApiError::new(REQUEST_ERROR, e.to_string()))?;
        Self::read_json(res)
    }

    fn delete_asset(
        &self,
        theme_id: Option<u64>,
        key: &str,
    ) -> Result<serde_json::Value, ApiError> {
        // Keys are already percent-encoded
        let url = format!("{}?asset[key]={}", self.assets_url(theme_id), key);
        debug!("DELETE {}", url);
        let res = self
            .client
            .delete(&url)
            .send()
            .map_err(|e| ApiError::new(REQUEST_ERROR, e.to_string()))?;
        Self::read_json(res)
    }
}

/// Hands out the one client of a sync session. The first call builds
/// it; later calls return the same instance whatever credentials they
/// pass.
#[derive(Default)]
pub struct ApiHolder {
    client: OnceCell<Arc<ApiClient>>,
}

impl ApiHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_api(&self, credentials: &Credentials) -> Result<Arc<ApiClient>, EngineError> {
        self.client
            .get_or_try_init(|| ApiClient::new(credentials).map(Arc::new))
            .map(Arc::clone)
    }
}

/// Helper to build the Authorization header from the combined
/// `api_key:password` string.
fn auth_headers(credentials: &Credentials) -> Result<HeaderMap, EngineError> {
    let mut headers = HeaderMap::new();
    let val = format!("Basic {}", STANDARD.encode(credentials.auth()));
    let mut val =
        HeaderValue::from_str(&val).map_err(|e| EngineError::Client(e.to_string()))?;
    val.set_sensitive(true);
    headers.insert(AUTHORIZATION, val);
    Ok(headers)
}

/// `https://<host>:443`, tolerating a scheme or trailing slash in `host`.
fn base_url(host: &str) -> String {
    let host = host
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("https://{}:{}", host, API_PORT)
}
