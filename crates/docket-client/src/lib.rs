//! HTTP client for the Docket API.
//!
//! Provides a minimal client with configurable auth (Bearer token or
//! x-api-key), generic JSON helpers, the domain methods in [`api`], and the
//! upload status poller in [`poller`].

pub mod api;
pub mod poller;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {key}`
    Bearer(String),
    /// `x-api-key: {key}`
    XApiKey(String),
}

/// API version prefix (e.g. "/api/v1"). Set DOCKET_API_VERSION to match the server.
pub fn api_prefix() -> String {
    let version = std::env::var("DOCKET_API_VERSION").unwrap_or_else(|_| "v1".to_string());
    format!("/api/{}", version)
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create client from environment: DOCKET_API_URL and DOCKET_API_KEY.
    /// Uses Bearer auth.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("DOCKET_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let api_key = std::env::var("DOCKET_API_KEY")
            .context("Missing API key. Set DOCKET_API_KEY")?;

        Self::new(base_url, Auth::Bearer(api_key))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Bearer(key) => request.header("Authorization", format!("Bearer {}", key)),
            Auth::XApiKey(key) => request.header("x-api-key", key.as_str()),
        }
    }

    /// Send with auth, fail on a non-2xx status and decode the JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.client.get(self.build_url(path))).await
    }

    pub async fn get_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        self.send_json(self.client.get(self.build_url(path)).query(query))
            .await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(self.client.post(self.build_url(path)).json(body))
            .await
    }

    pub async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(self.client.put(self.build_url(path)).json(body))
            .await
    }

    /// POST with an empty body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(self.client.post(self.build_url(path))).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        self.send_json(self.client.post(self.build_url(path)).multipart(form))
            .await
    }
}

pub use api::{BulkDeleteResponse, ReprocessResponse};
pub use docket_core::models::{
    Account, CorporationLookup, FileResponse, FileStatus, FileSummary, PartnerResponse, User,
};
pub use poller::{poll_until_settled, reconcile, LocalState, PollConfig, Reconciliation};
