//! HTTP client for a remote best-move service

use std::time::Duration;

use async_trait::async_trait;
use chess::{format_fen, Snapshot};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::error::{AiError, ClientError, ClientResult};
use crate::resolve::resolve_move;
use crate::retry::RetryPolicy;
use crate::traits::{AiMove, MoveOracle};
use crate::wire::{BestMoveRequest, BestMoveResponse, Evaluation};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for [`RemoteAiClient`].
#[derive(Debug, Clone)]
pub struct RemoteAiConfig {
    /// Base URL; requests go to `{base_url}/bestmove`.
    pub base_url: String,
    /// Sent as a bearer token when present and non-empty.
    pub api_key: Option<String>,
    /// Hard bound on each attempt.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Passed through verbatim as the request's `options` object.
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl RemoteAiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            options: serde_json::Map::new(),
        }
    }
}

/// Network oracle talking JSON over HTTP/1 to an AI service
pub struct RemoteAiClient {
    client: Client<HttpConnector, Full<Bytes>>,
    endpoint: Uri,
    authorization: Option<String>,
    timeout: Duration,
    retry: RetryPolicy,
    options: serde_json::Map<String, serde_json::Value>,
}

impl RemoteAiClient {
    pub fn new(config: RemoteAiConfig) -> ClientResult<Self> {
        let base = config.base_url.trim().trim_end_matches('/');
        let endpoint: Uri = format!("{}/bestmove", base)
            .parse()
            .map_err(|e: http::uri::InvalidUri| ClientError::InvalidAddress(e.to_string()))?;
        match endpoint.scheme_str() {
            Some("http") => {}
            Some(_) => return Err(ClientError::UnsupportedScheme(config.base_url)),
            None => return Err(ClientError::InvalidAddress(config.base_url)),
        }

        let authorization = config
            .api_key
            .filter(|key| !key.is_empty())
            .map(|key| format!("Bearer {}", key));

        let client = Client::builder(TokioExecutor::new()).build_http();

        Ok(Self {
            client,
            endpoint,
            authorization,
            timeout: config.timeout,
            retry: config.retry,
            options: config.options,
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    /// Serialize the request body for `snapshot`. Retries reuse these bytes.
    pub fn encode_request(&self, snapshot: &Snapshot, think: Duration) -> Result<Bytes, AiError> {
        let request = BestMoveRequest {
            fen: format_fen(&snapshot.state),
            history_uci: snapshot.history_uci.clone(),
            think_ms: u64::try_from(think.as_millis()).unwrap_or(u64::MAX),
            options: self.options.clone(),
        };
        serde_json::to_vec(&request)
            .map(Bytes::from)
            .map_err(|e| AiError::MalformedResponse(format!("cannot encode request: {}", e)))
    }

    /// One attempt, bounded by the configured timeout.
    async fn send_once(&self, body: Bytes) -> Result<BestMoveResponse, AiError> {
        match tokio::time::timeout(self.timeout, self.exchange(body)).await {
            Ok(result) => result,
            Err(_) => Err(AiError::Timeout(self.timeout)),
        }
    }

    async fn exchange(&self, body: Bytes) -> Result<BestMoveResponse, AiError> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(auth) = &self.authorization {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let request = builder
            .body(Full::new(body))
            .map_err(|e| AiError::Unreachable(format!("cannot build request: {}", e)))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| AiError::Unreachable(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| AiError::Unreachable(format!("reading response body: {}", e)))?
            .to_bytes();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AiError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let detail = String::from_utf8_lossy(&bytes);
            return Err(AiError::MalformedResponse(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail.chars().take(200).collect::<String>()
            )));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| AiError::MalformedResponse(format!("invalid JSON body: {}", e)))
    }
}

#[async_trait]
impl MoveOracle for RemoteAiClient {
    async fn request_move(
        &self,
        snapshot: &Snapshot,
        think: Duration,
    ) -> Result<AiMove, AiError> {
        let body = self.encode_request(snapshot, think)?;
        tracing::info!(
            endpoint = %self.endpoint,
            generation = snapshot.generation,
            think_ms = think.as_millis() as u64,
            "requesting AI move"
        );

        let response = self
            .retry
            .run(|_| self.send_once(body.clone()))
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "AI request failed"))?;

        let text = response
            .mv
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| AiError::MalformedResponse("response has no move".to_string()))?;
        let mv = resolve_move(snapshot, text)?;
        tracing::info!(mv = %mv, generation = snapshot.generation, "AI move received");

        Ok(AiMove {
            mv,
            evaluation: Evaluation::from(&response),
            generation: snapshot.generation,
        })
    }

    fn name(&self) -> &str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Game;

    #[test]
    fn rejects_non_http_endpoints() {
        assert!(matches!(
            RemoteAiClient::new(RemoteAiConfig::new("https://ai.example.com")),
            Err(ClientError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            RemoteAiClient::new(RemoteAiConfig::new("not a url")),
            Err(ClientError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn endpoint_appends_bestmove() {
        let client = RemoteAiClient::new(RemoteAiConfig::new("http://127.0.0.1:9000/api/")).unwrap();
        assert_eq!(client.endpoint().to_string(), "http://127.0.0.1:9000/api/bestmove");
    }

    #[tokio::test]
    async fn encodes_snapshot_fields() {
        let client = RemoteAiClient::new(RemoteAiConfig::new("http://127.0.0.1:9000")).unwrap();
        let mut game = Game::new();
        game.apply_move(&chess::parse_uci("e2e4").unwrap()).unwrap();
        let body = client
            .encode_request(&game.snapshot(), Duration::from_millis(1500))
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["fen"], game.fen());
        assert_eq!(value["history_uci"], serde_json::json!(["e2e4"]));
        assert_eq!(value["think_ms"], 1500);
        assert_eq!(value["options"], serde_json::json!({}));
    }
}
