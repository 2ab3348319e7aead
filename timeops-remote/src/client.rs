use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{multipart, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::domain::{
    AnalyticsReport, EntriesResponse, EntryPayload, RemoteEntry, RemoteTag, TagPayload,
    TagsResponse, UserResponse, ValidationBody,
};
use crate::{ApiUrl, RemoteConfig};

/// Fallback text when a 400 response carries no parseable error body.
const VALIDATION_FALLBACK: &str = "Validation failed";

/// Header carrying the client's timezone offset in seconds, read by the
/// server for date-bucketed operations.
const UTC_OFFSET_HEADER: &str = "X-UTC-Offset";

#[derive(Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Requests an API token from the `/user` endpoint. This is the only
    /// unauthenticated call, made before any token is stored.
    pub async fn request_token(base_url: &str) -> Result<String, RemoteError> {
        let url = ApiUrl::new(base_url).append_path("user");
        let resp = reqwest::Client::new()
            .get(url.as_ref())
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let resp = check_status(resp).await?;

        let body = resp
            .json::<UserResponse>()
            .await
            .map_err(|e| RemoteError::Parsing(format!("failed to parse user response: {}", e)))?;
        body.user.api_token.ok_or(RemoteError::TokenNotFound)
    }

    /// Opens the `/events` push-notification stream. The caller owns the
    /// response and reads `data-update` signals from its byte stream.
    pub async fn subscribe_events(&self) -> Result<Response, RemoteError> {
        let url = self.endpoint("events");
        self.send(self.client.get(url.as_ref()).header(ACCEPT, "text/event-stream"))
            .await
    }

    pub async fn fetch_entries(&self) -> Result<Vec<RemoteEntry>, RemoteError> {
        let response: EntriesResponse = self.fetch(self.endpoint("entries")).await?;
        Ok(response.entries)
    }

    pub async fn fetch_tags(&self) -> Result<Vec<RemoteTag>, RemoteError> {
        let response: TagsResponse = self.fetch(self.endpoint("tags")).await?;
        Ok(response.tags)
    }

    pub async fn create_entry(&self, entry: &EntryPayload) -> Result<(), RemoteError> {
        self.send_json(Method::POST, self.endpoint("entries"), entry)
            .await
    }

    pub async fn update_entry(
        &self,
        remote_id: i64,
        entry: &EntryPayload,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint("entries").append_path(&remote_id.to_string());
        self.send_json(Method::PUT, url, entry).await
    }

    pub async fn create_tag(&self, tag: &TagPayload) -> Result<(), RemoteError> {
        self.send_json(Method::POST, self.endpoint("tags"), tag)
            .await
    }

    pub async fn update_tag(&self, id: i64, tag: &TagPayload) -> Result<(), RemoteError> {
        let url = self.endpoint("tags").append_path(&id.to_string());
        self.send_json(Method::PUT, url, tag).await
    }

    pub async fn delete_all_entries(&self) -> Result<(), RemoteError> {
        let url = self.endpoint("entries");
        self.send(self.client.delete(url.as_ref())).await?;
        Ok(())
    }

    /// Fetches the full remote dataset as a JSON document.
    pub async fn export_all(&self) -> Result<String, RemoteError> {
        let url = self.endpoint("db");
        let resp = self.send(self.client.get(url.as_ref())).await?;
        resp.text()
            .await
            .map_err(|e| RemoteError::Parsing(format!("failed to read export body: {}", e)))
    }

    /// Uploads a dataset file as multipart form data. Format translation is
    /// entirely server-side.
    pub async fn import_file(
        &self,
        file_name: &str,
        contents: Vec<u8>,
        utc_offset_seconds: i64,
    ) -> Result<(), RemoteError> {
        let part = multipart::Part::bytes(contents).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);

        let url = self.endpoint("db");
        self.send(
            self.client
                .post(url.as_ref())
                .header(UTC_OFFSET_HEADER, utc_offset_seconds.to_string())
                .multipart(form),
        )
        .await?;
        Ok(())
    }

    pub async fn fetch_analytics(
        &self,
        utc_offset_seconds: i64,
    ) -> Result<AnalyticsReport, RemoteError> {
        let url = self.endpoint("analytics");
        let resp = self
            .send(
                self.client
                    .get(url.as_ref())
                    .header(UTC_OFFSET_HEADER, utc_offset_seconds.to_string()),
            )
            .await?;
        resp.json::<AnalyticsReport>()
            .await
            .map_err(|e| RemoteError::Parsing(format!("failed to parse analytics: {}", e)))
    }

    fn endpoint(&self, path: &str) -> ApiUrl {
        self.config.api_url().append_path(path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, RemoteError> {
        let resp = request
            .header(AUTHORIZATION, self.config.bearer())
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        check_status(resp).await
    }

    async fn send_json(
        &self,
        method: Method,
        url: ApiUrl,
        body: &impl Serialize,
    ) -> Result<(), RemoteError> {
        self.send(self.client.request(method, url.as_ref()).json(body))
            .await?;
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(&self, url: ApiUrl) -> Result<T, RemoteError> {
        let resp = self.send(self.client.get(url.as_ref())).await?;
        resp.json::<T>()
            .await
            .map_err(|e| RemoteError::Parsing(format!("failed to parse response as JSON: {}", e)))
    }
}

/// Maps a 400 response to a validation error carrying the first server
/// message; every other failure status becomes a transport error.
async fn check_status(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    if status == StatusCode::BAD_REQUEST {
        let msg = resp
            .json::<ValidationBody>()
            .await
            .ok()
            .and_then(ValidationBody::first_message)
            .unwrap_or_else(|| VALIDATION_FALLBACK.to_string());
        return Err(RemoteError::Validation(msg));
    }

    tracing::warn!(%status, "unexpected response status");
    Err(RemoteError::Transport(format!(
        "unexpected status: {}",
        status
    )))
}

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Remote API is not configured")]
    Configuration,
    #[error("Validation: {0}")]
    Validation(String),
    #[error("Transport: {0}")]
    Transport(String),
    #[error("Token not found in response")]
    TokenNotFound,
    #[error("Parsing: {0}")]
    Parsing(String),
}
