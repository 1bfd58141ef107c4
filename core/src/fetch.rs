//! Async host that executes requests built by `ApiClient`.
//!
//! # Design
//! `Fetcher` pairs an `ApiClient` with a `reqwest::Client`. A call suspends
//! twice: once while the request is sent and once while the response body is
//! read. Serialization happens before the first suspension, so a body that
//! cannot be encoded never reaches the network. There is no retry and no
//! timeout; dropping the future is the only way to abandon a call.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, RequestCredentials};

#[derive(Debug, Clone)]
pub struct Fetcher {
    api: ApiClient,
    http: reqwest::Client,
}

impl Fetcher {
    /// Build a fetcher for `config`.
    ///
    /// `RequestCredentials::Include` gives the underlying client a cookie
    /// jar, so cookies set by one response are sent with later requests.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .cookie_store(config.options.credentials == RequestCredentials::Include)
            .build()?;
        Ok(Self::with_client(config, http))
    }

    /// Use a caller-supplied `reqwest::Client`. Its cookie policy wins over
    /// `config.options.credentials`.
    pub fn with_client(config: ApiConfig, http: reqwest::Client) -> Self {
        Self {
            api: ApiClient::new(config),
            http,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// POST `body` as JSON to `address` and return the parsed response body.
    ///
    /// Non-2xx responses are not errors; their body is parsed like any other.
    pub async fn post_json<B>(&self, address: &str, body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.post_json_as(address, body).await
    }

    /// Like `post_json`, deserializing the response body into `T`.
    pub async fn post_json_as<B, T>(&self, address: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.api.build_post_json(address, body)?;
        let response = self.execute(request).await?;
        self.api.parse_json_as(response)
    }

    /// Send `request` and collect the response as plain data.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in &request.headers {
            let invalid = || ApiError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::try_from(name.as_str()).map_err(|_| invalid())?;
            let header_value = HeaderValue::try_from(value.as_str()).map_err(|_| invalid())?;
            headers.insert(header_name, header_value);
        }

        debug!(method = %request.method, url = request.url.as_str(), "execute::send");
        let mut builder = self.http.post(request.url.as_str()).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        debug!(status, "execute::read_body");
        let bytes = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

static DEFAULT_FETCHER: OnceLock<Fetcher> = OnceLock::new();

/// The fetcher behind the crate-level `post_json`, built from
/// `ApiConfig::default()` on first use.
pub fn default_fetcher() -> Result<&'static Fetcher, ApiError> {
    if let Some(fetcher) = DEFAULT_FETCHER.get() {
        return Ok(fetcher);
    }
    let fetcher = Fetcher::new(ApiConfig::default())?;
    Ok(DEFAULT_FETCHER.get_or_init(|| fetcher))
}

/// POST `body` as JSON to `address`, resolved against `API_URL`, and return
/// the parsed response body.
pub async fn post_json<B>(address: &str, body: &B) -> Result<Value, ApiError>
where
    B: Serialize + ?Sized,
{
    default_fetcher()?.post_json(address, body).await
}
