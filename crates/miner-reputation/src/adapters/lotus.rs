//! Lotus Full Node Adapter
//!
//! Implements `ChainGateway` and `ParticipantDirectory` against a Lotus
//! node's JSON-RPC 2.0 endpoint:
//!
//! | Port call | RPC method |
//! |-----------|------------|
//! | `list_participants` | `Filecoin.StateListMiners` |
//! | `resolve_peer_identity` | `Filecoin.StateMinerPeerID` |
//! | `query_state` | `Filecoin.StateCall` |

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serde_with::{serde_as, DurationMilliSeconds};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

use crate::domain::{
    Address, GatewayError, MethodNum, PeerId, StateCallResult, StateQuery, TipSetKey,
    IS_SLASHED_METHOD,
};
use crate::ports::{ChainGateway, ParticipantDirectory};

/// Default Lotus API endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:1234/rpc/v0";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Lotus connection settings.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotusConfig {
    /// JSON-RPC endpoint URL.
    pub endpoint: String,
    /// Per-request timeout.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "request_timeout_ms")]
    pub request_timeout: Duration,
    /// Method number of the miner actor's `IsSlashed`.
    pub is_slashed_method: u64,
    /// API token sent as a bearer credential, if the node requires one.
    pub auth_token: Option<String>,
}

impl Default for LotusConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            is_slashed_method: IS_SLASHED_METHOD.0,
            auth_token: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Receipt {
    #[serde(rename = "ExitCode")]
    exit_code: i64,
    #[serde(rename = "Return", default)]
    return_data: Option<String>,
}

/// `StateCall` answers with a full invocation result on current nodes and
/// with a bare receipt on some older ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StateCallResponse {
    Invocation {
        #[serde(rename = "MsgRct")]
        receipt: Receipt,
    },
    Receipt(Receipt),
}

impl StateCallResponse {
    fn into_result(self) -> Result<StateCallResult, GatewayError> {
        let receipt = match self {
            Self::Invocation { receipt } | Self::Receipt(receipt) => receipt,
        };
        let return_data = match receipt.return_data.as_deref() {
            None | Some("") => Vec::new(),
            Some(encoded) => STANDARD.decode(encoded).map_err(|e| {
                GatewayError::InvalidResponse(format!("return value is not base64: {e}"))
            })?,
        };
        Ok(StateCallResult {
            exit_code: receipt.exit_code,
            return_data,
        })
    }
}

/// HTTP JSON-RPC client for a Lotus full node.
pub struct LotusGateway {
    http_client: reqwest::Client,
    config: LotusConfig,
    request_id: AtomicU64,
}

impl LotusGateway {
    /// Create a gateway for `config.endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the HTTP client cannot be built.
    pub fn new(config: LotusConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
            request_id: AtomicU64::new(1),
        })
    }

    /// Connection settings.
    pub fn config(&self) -> &LotusConfig {
        &self.config
    }

    async fn call_optional<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<R>, GatewayError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };
        trace!(method, id, "lotus request");

        let mut builder = self.http_client.post(&self.config.endpoint).json(&request);
        if let Some(token) = &self.config.auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Transport(format!("HTTP {status} from {method}")));
        }

        let body: JsonRpcResponse<R> = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::InvalidResponse(e.to_string())
            }
        })?;

        if let Some(error) = body.error {
            debug!(method, code = error.code, message = %error.message, "lotus rpc error");
            return Err(GatewayError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(body.result)
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, GatewayError> {
        self.call_optional(method, params).await?.ok_or_else(|| {
            GatewayError::InvalidResponse(format!("{method} response missing result"))
        })
    }
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(e.to_string())
    }
}

/// Encode a tipset key the way Lotus expects: a list of CID links, or null
/// for the chain head.
fn encode_tipset(tipset: Option<&TipSetKey>) -> Value {
    match tipset {
        None => Value::Null,
        Some(key) => Value::Array(key.cids().iter().map(|cid| json!({ "/": cid })).collect()),
    }
}

/// Encode a read-only message for `StateCall`.
fn encode_message(query: &StateQuery) -> Value {
    json!({
        "Version": 0,
        "To": query.to.as_str(),
        "From": query.from.as_str(),
        "Nonce": 0,
        "Value": "0",
        "GasLimit": 0,
        "GasFeeCap": "0",
        "GasPremium": "0",
        "Method": query.method.0,
        "Params": Value::Null,
    })
}

#[async_trait]
impl ChainGateway for LotusGateway {
    async fn resolve_peer_identity(&self, participant: &Address) -> Result<PeerId, GatewayError> {
        let peer: Option<String> = self
            .call_optional(
                "Filecoin.StateMinerPeerID",
                json!([participant.as_str(), Value::Null]),
            )
            .await?;

        match peer {
            Some(id) if !id.is_empty() => Ok(PeerId::new(id)),
            _ => Err(GatewayError::NotFound(format!("peer id of {participant}"))),
        }
    }

    async fn query_state(&self, query: &StateQuery) -> Result<StateCallResult, GatewayError> {
        let response: StateCallResponse = self
            .call("Filecoin.StateCall", json!([encode_message(query), Value::Null]))
            .await?;
        response.into_result()
    }

    fn slashed_method(&self) -> MethodNum {
        MethodNum(self.config.is_slashed_method)
    }
}

#[async_trait]
impl ParticipantDirectory for LotusGateway {
    async fn list_participants(
        &self,
        tipset: Option<&TipSetKey>,
    ) -> Result<Vec<Address>, GatewayError> {
        let listed: Vec<String> = self
            .call("Filecoin.StateListMiners", json!([encode_tipset(tipset)]))
            .await?;

        let mut participants = Vec::with_capacity(listed.len());
        for raw in listed {
            match Address::parse(&raw) {
                Ok(addr) => participants.push(addr),
                Err(e) => debug!(address = %raw, error = %e, "skipping unparseable miner address"),
            }
        }
        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CBOR_FALSE, CBOR_TRUE};

    #[test]
    fn test_default_config() {
        let config = LotusConfig::default();
        assert_eq!(config.endpoint, "http://127.0.0.1:1234/rpc/v0");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.is_slashed_method, 15);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let json = r#"{"endpoint":"http://node:1234/rpc/v0","request_timeout_ms":2500}"#;
        let config: LotusConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.endpoint, "http://node:1234/rpc/v0");
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.is_slashed_method, 15);
    }

    #[test]
    fn test_slashed_method_from_config() {
        let gateway = LotusGateway::new(LotusConfig {
            is_slashed_method: 21,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(gateway.slashed_method(), MethodNum(21));
    }

    #[test]
    fn test_encode_head_tipset_is_null() {
        assert_eq!(encode_tipset(None), Value::Null);
    }

    #[test]
    fn test_encode_tipset_cids() {
        let key = TipSetKey(vec!["bafy1".into(), "bafy2".into()]);
        assert_eq!(
            encode_tipset(Some(&key)),
            json!([{ "/": "bafy1" }, { "/": "bafy2" }])
        );
    }

    #[test]
    fn test_encode_self_call_message() {
        let addr = Address::from_actor_id(1000);
        let msg = encode_message(&StateQuery::self_call(&addr, MethodNum(15)));
        assert_eq!(msg["To"], "t01000");
        assert_eq!(msg["From"], "t01000");
        assert_eq!(msg["Method"], 15);
        assert_eq!(msg["Value"], "0");
        assert!(msg["Params"].is_null());
    }

    #[test]
    fn test_decode_invocation_result() {
        let encoded = STANDARD.encode(CBOR_TRUE);
        let raw = json!({
            "MsgCid": { "/": "bafy" },
            "MsgRct": { "ExitCode": 0, "Return": encoded, "GasUsed": 0 },
            "Error": ""
        });
        let response: StateCallResponse = serde_json::from_value(raw).unwrap();
        let result = response.into_result().unwrap();
        assert!(result.is_success());
        assert_eq!(result.return_data, CBOR_TRUE.to_vec());
    }

    #[test]
    fn test_decode_bare_receipt() {
        let raw = json!({ "ExitCode": 0, "Return": STANDARD.encode(CBOR_FALSE) });
        let response: StateCallResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.into_result().unwrap().return_data, CBOR_FALSE.to_vec());
    }

    #[test]
    fn test_decode_rejected_receipt_without_return() {
        let raw = json!({ "MsgRct": { "ExitCode": 16, "Return": null } });
        let response: StateCallResponse = serde_json::from_value(raw).unwrap();
        let result = response.into_result().unwrap();
        assert_eq!(result.exit_code, 16);
        assert!(result.return_data.is_empty());
    }

    #[test]
    fn test_decode_bad_base64() {
        let raw = json!({ "ExitCode": 0, "Return": "not base64!" });
        let response: StateCallResponse = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            response.into_result(),
            Err(GatewayError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_decode_rpc_error_envelope() {
        let raw = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 1, "message": "actor not found" }
        });
        let response: JsonRpcResponse<Vec<String>> = serde_json::from_value(raw).unwrap();
        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, 1);
        assert_eq!(error.message, "actor not found");
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let gateway = LotusGateway::new(LotusConfig {
            endpoint: "http://127.0.0.1:1/rpc/v0".to_string(),
            request_timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();

        let err = gateway.list_participants(None).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_) | GatewayError::Timeout));
    }
}
