//! Shared test helpers for EVM client tests
//!
//! Dummy constants and JSON-RPC response builders.

#![allow(dead_code)]

use serde_json::{json, Value};
use wiremock::ResponseTemplate;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Dummy pool contract address (EVM format, 40 hex characters)
pub const DUMMY_POOL_ADDR: &str = "0x00000000000000000000000000000000000000a1";

/// Dummy sender address (EVM format, 40 hex characters)
pub const DUMMY_SENDER_ADDR: &str = "0x00000000000000000000000000000000000000b2";

/// Dummy transaction hash (64 hex characters)
pub const DUMMY_TX_HASH: &str =
    "0x00000000000000000000000000000000000000000000000000000000000000c3";

/// Dummy chain id (Base Sepolia)
pub const DUMMY_CHAIN_ID: u64 = 84532;

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
