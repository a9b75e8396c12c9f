//! reqwest-based remote.

use super::{RemotePost, RemoteSource};
use crate::config::SyncSettings;
use crate::models::Quote;
use crate::{Error, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

/// Reference list endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// Body sent when posting a quote.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPost<'a> {
    title: &'a str,
    body: &'a str,
    user_id: u32,
}

/// HTTP remote over a shared async client.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemote {
    /// Creates a remote for `endpoint` with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let defaults = SyncSettings::default();
        Self::build(endpoint.into(), defaults.timeout_ms, defaults.connect_timeout_ms)
    }

    /// Creates a remote from sync settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_settings(settings: &SyncSettings) -> Result<Self> {
        Self::build(
            settings.endpoint.clone(),
            settings.timeout_ms,
            settings.connect_timeout_ms,
        )
    }

    fn build(endpoint: String, timeout_ms: u64, connect_timeout_ms: u64) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        if connect_timeout_ms > 0 {
            builder = builder.connect_timeout(Duration::from_millis(connect_timeout_ms));
        }

        let client = builder.build().map_err(|e| Error::Remote {
            operation: "build_client".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self { client, endpoint })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn check_status(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            operation,
            status = %status,
            body = %body,
            "Remote returned error status"
        );
        Err(Error::Remote {
            operation: operation.to_string(),
            cause: format!("status {status}"),
        })
    }
}

/// Maps a transport error, logging its kind.
fn transport_error(operation: &str, e: &reqwest::Error) -> Error {
    let error_kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else if e.is_decode() {
        "decode"
    } else {
        "unknown"
    };
    tracing::error!(
        operation,
        error = %e,
        error_kind,
        is_timeout = e.is_timeout(),
        is_connect = e.is_connect(),
        "Remote request failed"
    );
    Error::Remote {
        operation: operation.to_string(),
        cause: format!("{error_kind} error: {e}"),
    }
}

impl RemoteSource for HttpRemote {
    #[instrument(skip_all, fields(operation = "remote.fetch_posts", endpoint = %self.endpoint))]
    async fn fetch_posts(&self) -> Result<Vec<RemotePost>> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| transport_error("fetch_posts", &e))?;
        let response = Self::check_status("fetch_posts", response).await?;

        let posts: Vec<RemotePost> = response
            .json()
            .await
            .map_err(|e| transport_error("fetch_posts", &e))?;

        tracing::debug!(count = posts.len(), "Fetched remote posts");
        Ok(posts)
    }

    #[instrument(skip_all, fields(operation = "remote.post_quote", quote_id = %quote.id))]
    async fn post_quote(&self, quote: &Quote) -> Result<serde_json::Value> {
        let body = NewPost {
            title: &quote.text,
            body: &quote.category,
            user_id: 1,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("post_quote", &e))?;
        let response = Self::check_status("post_quote", response).await?;

        response
            .json()
            .await
            .map_err(|e| transport_error("post_quote", &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_wire_shape() {
        let body = NewPost {
            title: "Alpha",
            body: "Cats",
            user_id: 1,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"title": "Alpha", "body": "Cats", "userId": 1})
        );
    }

    #[test]
    fn test_from_settings_keeps_endpoint() {
        let settings = SyncSettings {
            endpoint: "http://127.0.0.1:9/posts".to_string(),
            ..SyncSettings::default()
        };
        let remote = HttpRemote::from_settings(&settings).unwrap();
        assert_eq!(remote.endpoint(), "http://127.0.0.1:9/posts");
        assert_eq!(HttpRemote::new(DEFAULT_ENDPOINT).unwrap().endpoint(), DEFAULT_ENDPOINT);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_remote_error() {
        let settings = SyncSettings {
            endpoint: "http://127.0.0.1:9/posts".to_string(),
            timeout_ms: 2_000,
            connect_timeout_ms: 500,
            ..SyncSettings::default()
        };
        let remote = HttpRemote::from_settings(&settings).unwrap();
        assert!(matches!(
            remote.fetch_posts().await,
            Err(Error::Remote { .. })
        ));
    }
}
