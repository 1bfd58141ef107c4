//! Stateless request builder and response parser for JSON POST calls.
//!
//! # Design
//! `ApiClient` holds only an `ApiConfig` and carries no mutable state between
//! calls. `build_post_json` resolves the address and serializes the body into
//! an `HttpRequest`; `parse_json` turns an `HttpResponse` body into a JSON
//! value. Everything that can fail before the network is touched fails in
//! `build_post_json`.

use reqwest::header::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestMode};

/// Synchronous, stateless client for JSON POST calls.
#[derive(Debug, Clone, Default)]
pub struct ApiClient {
    config: ApiConfig,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Resolve `address` against the base URL using standard URL-reference
    /// rules. Absolute addresses replace the base entirely.
    pub fn resolve(&self, address: &str) -> Result<Url, ApiError> {
        Ok(self.config.base_url.join(address)?)
    }

    /// Build a POST request carrying `body` as JSON text.
    ///
    /// The returned request holds a copy of the default options with the
    /// method and body filled in.
    pub fn build_post_json<B>(&self, address: &str, body: &B) -> Result<HttpRequest, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(address)?;
        let options = &self.config.options;

        if options.mode == RequestMode::SameOrigin && url.origin() != self.config.base_url.origin() {
            return Err(ApiError::CrossOrigin {
                url: url.to_string(),
                origin: self.config.base_url.origin().ascii_serialization(),
            });
        }

        for (name, value) in &options.headers {
            if HeaderName::try_from(name.as_str()).is_err() || HeaderValue::try_from(value.as_str()).is_err() {
                return Err(ApiError::InvalidHeader { name: name.clone() });
            }
        }

        let body = serde_json::to_string(body).map_err(ApiError::Serialization)?;
        debug!(%url, bytes = body.len(), "build_post_json");

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            mode: options.mode,
            credentials: options.credentials,
            headers: options.headers.clone(),
            body: Some(body),
        })
    }

    /// Parse the response body as JSON. The status code is not inspected.
    pub fn parse_json(&self, response: HttpResponse) -> Result<Value, ApiError> {
        self.parse_json_as(response)
    }

    /// Parse the response body as `T`. The status code is not inspected.
    ///
    /// A single leading byte-order mark is dropped before parsing.
    pub fn parse_json_as<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        debug!(status = response.status, bytes = response.body.len(), "parse_json");
        let body = response.body.strip_prefix('\u{feff}').unwrap_or(&response.body);
        serde_json::from_str(body).map_err(ApiError::Deserialization)
    }
}
