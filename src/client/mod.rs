//! HTTP client for the QuestMate API.
//!
//! Used by the `submit` and `dashboard` CLI commands. Configuration is via
//! environment variables:
//! - `QUESTMATE_URL` - Base URL (default: `http://localhost:3000/api/v1`)
//! - `QUESTMATE_API_KEY` - API key for authentication (optional for local)

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::*;

/// Default URL for local development.
const DEFAULT_URL: &str = "http://localhost:3000/api/v1";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

/// HTTP client for the QuestMate API.
#[derive(Debug, Clone)]
pub struct QuestClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl QuestClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var("QUESTMATE_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_key = std::env::var("QUESTMATE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        Self::new(base_url, api_key)
    }

    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    /// Build a request with optional auth header.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_for(status, response.text().await.unwrap_or_default()))
        }
    }

    pub async fn health(&self) -> Result<(), ClientError> {
        let response = self.request(Method::GET, "/health").send().await?;
        self.handle_response::<serde_json::Value>(response)
            .await
            .map(|_| ())
    }

    /// Submit code for the user's current task.
    ///
    /// A failing submission comes back as `Ok` with `success == false`, the
    /// same as calling the grader directly.
    pub async fn submit(&self, username: &str, code: &str) -> Result<SubmissionResult, ClientError> {
        let response = self
            .request(Method::POST, &format!("/users/{}/submissions", username))
            .json(&SubmitInput {
                code: code.to_string(),
            })
            .send()
            .await?;

        // Graded failures are sent as 400 with a result body
        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return serde_json::from_str(&body).map_err(|_| ClientError::BadRequest(body));
        }
        self.handle_response(response).await
    }

    pub async fn dashboard(&self, username: &str) -> Result<Dashboard, ClientError> {
        let response = self
            .request(Method::GET, &format!("/users/{}/dashboard", username))
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn skills(&self) -> Result<Vec<SkillInfo>, ClientError> {
        let response = self.request(Method::GET, "/skills").send().await?;
        self.handle_response(response).await
    }
}

fn error_for(status: StatusCode, body: String) -> ClientError {
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(body),
        StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
        StatusCode::CONFLICT => ClientError::Conflict(body),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        _ => ClientError::Server(format!("{}: {}", status, body)),
    }
}
