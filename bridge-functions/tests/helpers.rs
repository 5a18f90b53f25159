//! Shared test helpers for bridge function tests
//!
//! Dummy constants, config builders pointing at wiremock servers, and
//! JSON-RPC response builders.

#![allow(dead_code)]

use bridge_functions::secrets::POOL_MESSENGER_KEY;
use bridge_functions::{Config, Secrets};
use chain_clients_evm::abi;
use serde_json::{json, Value};
use std::collections::HashMap;
use wiremock::matchers::{body_partial_json, body_string_contains, method};
use wiremock::{Mock, MockBuilder, ResponseTemplate};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Host chain id of the test network (Base Sepolia)
pub const DUMMY_HOST_CHAIN_ID: u64 = 84532;

/// Hub chain selector
pub const HUB_SELECTOR: u64 = 10344971235874465080;

/// First child chain selector
pub const CHILD_A_SELECTOR: u64 = 3478487238524512106;

/// Second child chain selector
pub const CHILD_B_SELECTOR: u64 = 5224473277236331295;

/// Dummy pool contract address (EVM format, 40 hex characters)
pub const DUMMY_POOL_ADDR: &str = "0x00000000000000000000000000000000000000a1";

/// Dummy token contract address (EVM format, 40 hex characters)
pub const DUMMY_TOKEN_ADDR: &str = "0x00000000000000000000000000000000000000d4";

/// Dummy source bridge contract address (EVM format, 40 hex characters)
pub const DUMMY_BRIDGE_ADDR: &str = "0x00000000000000000000000000000000000000e5";

/// Dummy transaction hash (64 hex characters)
pub const DUMMY_TX_HASH: &str =
    "0x00000000000000000000000000000000000000000000000000000000000000c3";

/// Well-known Hardhat account #0 key; never holds real funds
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Settings that keep retry loops short and sleep-free.
pub const FAST_SETTINGS: &str = r#"
[settings]
log_search_attempts = 2
log_search_retry_delay_ms = 0
confirmation_poll_interval_ms = 0
max_confirmation_polls = 5
receipt_round_delay_ms = 0
rpc_timeout_ms = 2000
"#;

// ============================================================================
// CONFIG BUILDERS
// ============================================================================

/// One chain of the test network.
pub struct TestChain {
    pub name: &'static str,
    pub selector: u64,
    pub urls: Vec<String>,
    /// None for verification-only chains
    pub pool: Option<&'static str>,
}

impl TestChain {
    pub fn pool(name: &'static str, selector: u64, url: String) -> Self {
        Self {
            name,
            selector,
            urls: vec![url],
            pool: Some(DUMMY_POOL_ADDR),
        }
    }

    pub fn verification_only(name: &'static str, selector: u64, url: String) -> Self {
        Self {
            name,
            selector,
            urls: vec![url],
            pool: None,
        }
    }

    /// Adds another endpoint to the chain's rotation.
    pub fn with_endpoint(mut self, url: String) -> Self {
        self.urls.push(url);
        self
    }
}

/// Builds a single-network config with `settings` prepended.
pub fn build_config(settings: &str, chains: &[TestChain]) -> Config {
    let mut toml = format!(
        "{}\n[[network]]\nname = \"test\"\nhost_chain_id = {}\nhub_chain_selector = \"{}\"\n",
        settings, DUMMY_HOST_CHAIN_ID, HUB_SELECTOR
    );
    for chain in chains {
        let urls: Vec<String> = chain.urls.iter().map(|u| format!("\"{}\"", u)).collect();
        toml.push_str(&format!(
            "\n[[network.chain]]\nname = \"{}\"\nselector = \"{}\"\nchain_id = {}\nrpc_urls = [{}]\n",
            chain.name,
            chain.selector,
            DUMMY_HOST_CHAIN_ID,
            urls.join(", ")
        ));
        if let Some(pool) = chain.pool {
            toml.push_str(&format!(
                "pool_addr = \"{}\"\ntoken_addr = \"{}\"\n",
                pool, DUMMY_TOKEN_ADDR
            ));
        }
    }
    Config::from_toml(&toml).unwrap()
}

/// Secrets holding only the pool messenger key.
pub fn signer_secrets() -> Secrets {
    let mut values = HashMap::new();
    values.insert(POOL_MESSENGER_KEY.to_string(), TEST_PRIVATE_KEY.to_string());
    Secrets::new(values)
}

// ============================================================================
// RESPONSE BUILDERS
// ============================================================================

/// 200 response carrying a JSON-RPC result.
pub fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}

/// 200 response carrying a JSON-RPC error object.
pub fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": { "code": code, "message": message },
    }))
}

/// eth_call result as `0x`-hex.
pub fn call_result(data: &[u8]) -> ResponseTemplate {
    rpc_result(json!(format!("0x{}", hex::encode(data))))
}

/// Log object as returned by eth_getLogs.
pub fn log_json(topics: Vec<String>, data: &[u8], block_number: u64, tx_hash: &str) -> Value {
    json!({
        "address": DUMMY_BRIDGE_ADDR,
        "topics": topics,
        "data": format!("0x{}", hex::encode(data)),
        "blockNumber": format!("0x{:x}", block_number),
        "transactionHash": tx_hash,
        "logIndex": "0x0",
    })
}

// ============================================================================
// MATCHERS
// ============================================================================

/// Mock for one JSON-RPC method.
pub fn rpc_method(name: &str) -> MockBuilder {
    Mock::given(method("POST")).and(body_partial_json(json!({ "method": name })))
}

/// Mock for an eth_call to the function with `signature`.
pub fn contract_call(signature: &str) -> MockBuilder {
    rpc_method("eth_call").and(body_string_contains(hex::encode(abi::function_selector(signature))))
}
