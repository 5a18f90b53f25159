//! EVM Client Module
//!
//! JSON-RPC access to one EVM endpoint. The `RpcCall` trait is the seam the
//! bridge functions program against; `EvmClient` is the HTTP implementation.
//! `eth_estimateGas` and `eth_chainId` are answered locally because public
//! providers disagree on both, which breaks transaction building.

use anyhow::{Context, Result};
use chain_clients_common::{normalize_hex, parse_hex_u64, strip_hex_prefix, to_hex_quantity};
use ethereum_types::U256;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::RpcError;
use crate::logs::{EvmLog, LogFilter};

/// Gas limit returned for every `eth_estimateGas` call (0x1e8480).
pub const DEFAULT_GAS_LIMIT_OVERRIDE: u64 = 2_000_000;

/// Per-request timeout when none is configured.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// API RESPONSE STRUCTURES
// ============================================================================

/// EVM JSON-RPC request wrapper
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

// ============================================================================
// RPC INTERFACE
// ============================================================================

/// A JSON-RPC endpoint bound to one chain.
///
/// Implementors only provide `call`; the typed helpers decode the common
/// `eth_*` results on top of it.
#[allow(async_fn_in_trait)]
pub trait RpcCall {
    /// Endpoint as shown in errors and logs.
    fn url(&self) -> &str;

    /// Executes one JSON-RPC method and returns the raw `result` value.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError>;

    /// Executes a method and deserializes its result.
    async fn call_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| RpcError::Decode {
            url: self.url().to_string(),
            method: method.to_string(),
            reason: e.to_string(),
        })
    }

    /// Current block height (`eth_blockNumber`).
    async fn get_block_number(&self) -> Result<u64, RpcError> {
        let hex: String = self.call_as("eth_blockNumber", vec![]).await?;
        quantity_u64(self.url(), "eth_blockNumber", &hex)
    }

    /// Logs matching `filter` (`eth_getLogs`).
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<EvmLog>, RpcError> {
        let logs: Option<Vec<EvmLog>> = self.call_as("eth_getLogs", vec![filter.to_json()]).await?;
        Ok(logs.unwrap_or_default())
    }

    /// Read-only contract call against the latest block (`eth_call`).
    ///
    /// # Arguments
    ///
    /// * `to` - Contract address
    /// * `data` - ABI-encoded calldata
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` - Raw return data
    /// * `Err(RpcError)` - The call reverted or the endpoint failed
    async fn eth_call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let params = vec![
            serde_json::json!({
                "to": normalize_hex(to),
                "data": format!("0x{}", hex::encode(data)),
            }),
            serde_json::json!("latest"),
        ];
        let hex_result: String = self.call_as("eth_call", params).await?;
        hex::decode(strip_hex_prefix(&hex_result)).map_err(|e| RpcError::Decode {
            url: self.url().to_string(),
            method: "eth_call".to_string(),
            reason: e.to_string(),
        })
    }

    /// Next nonce for `address`, counting pending transactions.
    async fn get_transaction_count(&self, address: &str) -> Result<u64, RpcError> {
        let params = vec![serde_json::json!(address), serde_json::json!("pending")];
        let hex: String = self.call_as("eth_getTransactionCount", params).await?;
        quantity_u64(self.url(), "eth_getTransactionCount", &hex)
    }

    /// Current legacy gas price (`eth_gasPrice`).
    async fn gas_price(&self) -> Result<U256, RpcError> {
        let hex: String = self.call_as("eth_gasPrice", vec![]).await?;
        let digits = strip_hex_prefix(&hex);
        if digits.is_empty() {
            return Ok(U256::zero());
        }
        U256::from_str_radix(digits, 16).map_err(|e| RpcError::Decode {
            url: self.url().to_string(),
            method: "eth_gasPrice".to_string(),
            reason: format!("{:?}", e),
        })
    }

    /// Broadcasts a signed transaction and returns its hash.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, RpcError> {
        let params = vec![serde_json::json!(format!("0x{}", hex::encode(raw)))];
        self.call_as("eth_sendRawTransaction", params).await
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        let hex: String = self.call_as("eth_chainId", vec![]).await?;
        quantity_u64(self.url(), "eth_chainId", &hex)
    }

    async fn estimate_gas(&self, tx: Value) -> Result<u64, RpcError> {
        let hex: String = self.call_as("eth_estimateGas", vec![tx]).await?;
        quantity_u64(self.url(), "eth_estimateGas", &hex)
    }
}

fn quantity_u64(url: &str, method: &str, hex: &str) -> Result<u64, RpcError> {
    parse_hex_u64(hex).ok_or_else(|| RpcError::Decode {
        url: url.to_string(),
        method: method.to_string(),
        reason: format!("invalid hex quantity {:?}", hex),
    })
}

// ============================================================================
// EVM CLIENT IMPLEMENTATION
// ============================================================================

/// Client for communicating with one EVM JSON-RPC endpoint
#[derive(Debug, Clone)]
pub struct EvmClient {
    /// HTTP client for making requests
    client: Client,
    /// Endpoint URL (e.g., "https://sepolia.base.org")
    url: String,
    /// Shown in errors and logs instead of `url`, which may embed an API key
    label: String,
    /// Chain id reported for `eth_chainId`
    chain_id: u64,
    /// Gas limit reported for `eth_estimateGas`
    gas_limit_override: u64,
    timeout: Duration,
}

impl EvmClient {
    /// Creates a new EVM client for the given endpoint
    ///
    /// # Arguments
    ///
    /// * `url` - Endpoint URL with any credentials already substituted
    /// * `chain_id` - Native chain id of the chain behind the endpoint
    ///
    /// # Returns
    ///
    /// * `Ok(EvmClient)` - Successfully created client
    /// * `Err(anyhow::Error)` - Failed to create the HTTP client
    pub fn new(url: &str, chain_id: u64) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
            label: url.to_string(),
            chain_id,
            gas_limit_override: DEFAULT_GAS_LIMIT_OVERRIDE,
            timeout: Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS),
        })
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_gas_limit_override(mut self, gas_limit: u64) -> Self {
        self.gas_limit_override = gas_limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends the request to the endpoint and unwraps the JSON-RPC envelope.
    async fn forward(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        let exchange = async {
            let response = self
                .client
                .post(&self.url)
                .json(&request)
                .send()
                .await
                .map_err(|source| RpcError::Transport {
                    url: self.label.clone(),
                    method: method.to_string(),
                    source: source.without_url(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(RpcError::HttpStatus {
                    url: self.label.clone(),
                    method: method.to_string(),
                    status: status.as_u16(),
                });
            }

            response.json::<Value>().await.map_err(|e| RpcError::Decode {
                url: self.label.clone(),
                method: method.to_string(),
                reason: e.to_string(),
            })
        };

        let body = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| RpcError::Timeout {
                url: self.label.clone(),
                method: method.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
            let error: JsonRpcError =
                serde_json::from_value(error.clone()).map_err(|e| RpcError::Decode {
                    url: self.label.clone(),
                    method: method.to_string(),
                    reason: format!("malformed error object: {}", e),
                })?;
            return Err(RpcError::Rpc {
                url: self.label.clone(),
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }

        match body.get("result") {
            Some(result) => Ok(result.clone()),
            None => Err(RpcError::MissingResult {
                url: self.label.clone(),
                method: method.to_string(),
            }),
        }
    }
}

impl RpcCall for EvmClient {
    fn url(&self) -> &str {
        &self.label
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        match method {
            "eth_estimateGas" => Ok(Value::String(to_hex_quantity(self.gas_limit_override))),
            "eth_chainId" => Ok(Value::String(to_hex_quantity(self.chain_id))),
            _ => {
                debug!("JSON-RPC {} -> {}", method, self.label);
                self.forward(method, params).await
            }
        }
    }
}
