//! JSON-RPC provider abstraction and the reqwest-backed HTTP implementation
//!
//! The HTTP provider makes exactly one attempt per request. Retries,
//! reconnects and idle handling belong to whoever owns the provider.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC code some nodes use for `execution reverted`
pub const CODE_SERVER_ERROR: i64 = -32000;
/// JSON-RPC code geth uses for reverts carrying return data
pub const CODE_EXECUTION_ERROR: i64 = 3;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("http request failed: status {status}")]
    Http { status: u16 },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

impl RpcError {
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Application-level revert, as opposed to a provider failure
    pub fn is_revert(&self) -> bool {
        match self {
            RpcError::Rpc { code, message, .. } => {
                (*code == CODE_SERVER_ERROR || *code == CODE_EXECUTION_ERROR)
                    && message.starts_with("execution reverted")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        RpcError::Transport(err.to_string())
    }
}

/// Anything that can answer JSON-RPC requests
#[async_trait::async_trait]
pub trait JsonRpcProvider: Send + Sync {
    /// Send one request and return its `result`
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;

    /// Endpoint display name
    fn endpoint_name(&self) -> String;
}

/// HTTP provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub url: String,
    /// Per-request timeout; zero disables it
    pub request_timeout: Duration,
}

impl ProviderConfig {
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        self.url.clone()
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// JSON-RPC 2.0 over HTTP POST
pub struct HttpProvider {
    http: reqwest::Client,
    config: ProviderConfig,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, RpcError> {
        let mut builder = reqwest::Client::builder();
        if !config.request_timeout.is_zero() {
            builder = builder.timeout(config.request_timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl JsonRpcProvider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(endpoint = %self.config.url, method, id, "json-rpc request");

        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params: &params,
        };
        let response = self.http.post(&self.config.url).json(&body).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(method, id, status = %response.status(), "json-rpc http failure");
            return Err(RpcError::Http {
                status: response.status().as_u16(),
            });
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::InvalidResponse(format!("expected json: {}", e)))?;
        parse_response(parsed)
    }

    fn endpoint_name(&self) -> String {
        self.config.display()
    }
}

fn parse_response(response: RpcResponse) -> Result<Value, RpcError> {
    if let Some(error) = response.error {
        return Err(RpcError::Rpc {
            code: error.code,
            message: error.message.unwrap_or_else(|| "unknown error".to_string()),
            data: error.data,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result() {
        let response: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0x01"}"#).unwrap();
        assert_eq!(parse_response(response).unwrap(), Value::from("0x01"));
    }

    #[test]
    fn test_parse_error() {
        let response: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#,
        )
        .unwrap();
        let err = parse_response(response).unwrap_err();
        assert_eq!(err.code(), Some(-32000));
        assert!(err.is_revert());
    }

    #[test]
    fn test_revert_detection() {
        let revert = RpcError::Rpc {
            code: 3,
            message: "execution reverted: not owner".to_string(),
            data: None,
        };
        assert!(revert.is_revert());

        let other = RpcError::Rpc {
            code: -32000,
            message: "header not found".to_string(),
            data: None,
        };
        assert!(!other.is_revert());
        assert!(!RpcError::Http { status: 502 }.is_revert());
    }

    #[test]
    fn test_request_envelope() {
        let params = serde_json::json!(["latest"]);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "eth_getCode",
            params: &params,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 7);
        assert_eq!(json["method"], "eth_getCode");
        assert_eq!(json["params"][0], "latest");
    }
}
