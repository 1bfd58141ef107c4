//! Base URL and default request options.
//!
//! `ApiConfig` is built once and shared by reference. Nothing in the crate
//! mutates it after construction.

use serde::Deserialize;
use url::Url;

use crate::error::ApiError;
use crate::http::{RequestCredentials, RequestMode};

/// Origin that relative addresses resolve against by default.
pub const API_URL: &str = "http://localhost:8080";

/// Options merged into every request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub mode: RequestMode,
    pub credentials: RequestCredentials,
    pub headers: Vec<(String, String)>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            mode: RequestMode::Cors,
            credentials: RequestCredentials::Include,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    #[serde(default)]
    pub options: FetchOptions,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            options: FetchOptions::default(),
        })
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            options: FetchOptions::default(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(API_URL).expect("API_URL is an absolute URL")
}
