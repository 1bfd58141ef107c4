//! JSON POST client for the API served at `API_URL`.
//!
//! # Overview
//! Resolves an address against a fixed base URL, merges the default request
//! options (CORS mode, credentials included, JSON content type), POSTs a
//! serialized body, and parses the JSON response.
//!
//! # Design
//! - `ApiClient` is stateless and does no I/O: `build_post_json` produces an
//!   `HttpRequest`, `parse_json` consumes an `HttpResponse` (host-does-IO).
//! - `Fetcher` is the async host built on `reqwest`; `post_json` runs a
//!   default `Fetcher` bound to `API_URL`.
//! - Response status codes are never interpreted. A 4xx with a JSON body
//!   parses exactly like a 200.

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;

pub use client::ApiClient;
pub use config::{ApiConfig, FetchOptions, API_URL};
pub use error::ApiError;
pub use fetch::{default_fetcher, post_json, Fetcher};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestCredentials, RequestMode};
