use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config;

pub mod push_id;

pub use push_id::PushIdGenerator;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid database location: {0}")]
    InvalidPath(String),
    #[error("failed to reach database: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("database rejected write ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

/// Remote key-value tree addressed by slash-separated paths.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// A new unique child key; ordering follows creation time.
    fn generate_key(&self) -> String;

    /// Apply every `relative/path -> value` entry below `path` in one atomic request.
    async fn update_children(
        &self,
        path: &str,
        updates: Map<String, Value>,
    ) -> Result<(), StoreError>;
}

/// REST client for a Firebase-style realtime database.
#[derive(Clone)]
pub struct RealtimeDbClient {
    http: Client,
    base_url: Url,
    auth: Option<String>,
    keys: Arc<PushIdGenerator>,
}

impl fmt::Debug for RealtimeDbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeDbClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl RealtimeDbClient {
    pub fn new(
        base_url: &str,
        auth: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let base_url = parse_base_url(base_url)?;
        let http = Client::builder()
            .user_agent("sensor-scan/0.1")
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            http,
            base_url,
            auth,
            keys: Arc::new(PushIdGenerator::new()),
        })
    }

    pub fn from_config(cfg: &config::Store) -> Result<Self, StoreError> {
        Self::new(
            &cfg.database_url,
            cfg.auth().map(str::to_owned),
            Duration::from_secs(cfg.request_timeout_seconds),
        )
    }

    /// `{base}/{path}.json`, with the auth token as query parameter when set.
    pub fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        let mut url = self
            .base_url
            .join(&format!("{}.json", trimmed))
            .map_err(|e| StoreError::InvalidPath(format!("{}: {}", path, e)))?;
        if let Some(token) = &self.auth {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    pub fn build_update_request(
        &self,
        path: &str,
        updates: &Map<String, Value>,
    ) -> Result<reqwest::Request, StoreError> {
        let endpoint = self.endpoint(path)?;
        Ok(self
            .http
            .patch(endpoint)
            .header("Content-Type", "application/json")
            .json(updates)
            .build()?)
    }

    async fn execute_update(
        &self,
        path: &str,
        updates: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let request = self.build_update_request(path, &updates)?;
        debug!(
            path = request.url().path(),
            entries = updates.len(),
            "sending multi-path update"
        );

        let res = self.http.execute(request).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = error_message(&body);
            warn!(%status, %message, "database rejected update");
            return Err(StoreError::Rejected { status, message });
        }
        debug!(%status, "update applied");
        Ok(())
    }
}

#[async_trait]
impl RealtimeStore for RealtimeDbClient {
    fn generate_key(&self) -> String {
        self.keys.next_id()
    }

    async fn update_children(
        &self,
        path: &str,
        updates: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.execute_update(path, updates).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, StoreError> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&with_slash)
        .map_err(|e| StoreError::InvalidPath(format!("{}: {}", raw, e)))
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// The database answers `{"error": "..."}`; fall back to the raw body otherwise.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(auth: Option<&str>) -> RealtimeDbClient {
        RealtimeDbClient::new(
            "https://demo.firebaseio.com",
            auth.map(str::to_owned),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_appends_json_suffix() {
        let url = client(None).endpoint("/projekt/sensors/").unwrap();
        assert_eq!(url.as_str(), "https://demo.firebaseio.com/projekt/sensors.json");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let c = RealtimeDbClient::new(
            "http://localhost:9000/ns",
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        let url = c.endpoint("projekt/sensors").unwrap();
        assert_eq!(url.path(), "/ns/projekt/sensors.json");
    }

    #[test]
    fn endpoint_rejects_root() {
        for path in ["/", " / ", "", "  "] {
            assert!(matches!(
                client(None).endpoint(path),
                Err(StoreError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn endpoint_ignores_surrounding_whitespace() {
        let url = client(None).endpoint(" /projekt/sensors/ ").unwrap();
        assert_eq!(url.path(), "/projekt/sensors.json");
    }

    #[test]
    fn build_update_request_is_patch_with_body() {
        let c = client(Some("secret"));
        let mut updates = Map::new();
        updates.insert("ABC123/status".into(), json!(1));
        let request = c.build_update_request("projekt/sensors", &updates).unwrap();

        assert_eq!(request.method(), reqwest::Method::PATCH);
        assert_eq!(request.url().path(), "/projekt/sensors.json");
        assert_eq!(request.url().query(), Some("auth=secret"));
        assert_eq!(
            request
                .headers()
                .get("Content-Type")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "application/json"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let parsed: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(parsed, json!({ "ABC123/status": 1 }));
    }

    #[test]
    fn debug_redacts_auth() {
        let rendered = format!("{:?}", client(Some("secret")));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(error_message(r#"{"error":"Permission denied"}"#), "Permission denied");
        assert_eq!(error_message(" bad gateway \n"), "bad gateway");
    }

    #[test]
    fn generated_keys_are_unique() {
        let c = client(None);
        let a = c.generate_key();
        let b = c.generate_key();
        assert_ne!(a, b);
        assert_eq!(a.len(), 20);
    }
}
