//! Error types for EVM JSON-RPC access and ABI decoding.

use thiserror::Error;

/// Error returned by a JSON-RPC call.
///
/// The variants separate failures of the transport (worth retrying against
/// another endpoint) from errors reported by the node itself.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Failed to send {method} request to {url}: {source}")]
    Transport {
        url: String,
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded to {method} with HTTP status {status}")]
    HttpStatus {
        url: String,
        method: String,
        status: u16,
    },

    #[error("Timed out after {timeout_ms}ms waiting for {method} from {url}")]
    Timeout {
        url: String,
        method: String,
        timeout_ms: u64,
    },

    #[error("JSON-RPC error from {url} ({method}): {message} (code: {code})")]
    Rpc {
        url: String,
        method: String,
        code: i64,
        message: String,
    },

    #[error("{url} returned neither result nor error for {method}")]
    MissingResult { url: String, method: String },

    #[error("Failed to decode {method} result from {url}: {reason}")]
    Decode {
        url: String,
        method: String,
        reason: String,
    },
}

/// Node messages that mean an equivalent transaction is already in the pool
/// or already mined.
const ALREADY_SUBMITTED_MARKERS: &[&str] = &[
    "already known",
    "replacement transaction underpriced",
    "nonce too low",
    "nonce is too low",
    "nonce has already been used",
];

/// JSON-RPC error codes providers use for rate limiting or lagging state.
const TRANSIENT_RPC_CODES: &[i64] = &[-32005, -32603, 429];

impl RpcError {
    /// Returns true if the call may succeed when retried, possibly against a
    /// different endpoint.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Transport { .. }
            | RpcError::HttpStatus { .. }
            | RpcError::Timeout { .. }
            | RpcError::MissingResult { .. } => true,
            RpcError::Rpc { code, .. } => TRANSIENT_RPC_CODES.contains(code),
            RpcError::Decode { .. } => false,
        }
    }

    /// Returns true if the node rejected a submission because the transaction
    /// (or an equivalent replacement) was already accepted.
    pub fn is_already_submitted(&self) -> bool {
        match self {
            RpcError::Rpc { message, .. } => {
                let message = message.to_lowercase();
                ALREADY_SUBMITTED_MARKERS
                    .iter()
                    .any(|marker| message.contains(marker))
            }
            _ => false,
        }
    }

    /// The endpoint URL the error came from.
    pub fn url(&self) -> &str {
        match self {
            RpcError::Transport { url, .. }
            | RpcError::HttpStatus { url, .. }
            | RpcError::Timeout { url, .. }
            | RpcError::Rpc { url, .. }
            | RpcError::MissingResult { url, .. }
            | RpcError::Decode { url, .. } => url,
        }
    }
}

/// Error decoding or encoding ABI data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("ABI data too short: need {needed} bytes, have {available}")]
    OutOfBounds { needed: usize, available: usize },

    #[error("ABI value does not fit in {target}")]
    Overflow { target: &'static str },

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length for {what}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rpc_error(code: i64, message: &str) -> RpcError {
        RpcError::Rpc {
            url: "http://node".to_string(),
            method: "eth_sendRawTransaction".to_string(),
            code,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_already_submitted_markers() {
        assert!(rpc_error(-32000, "already known").is_already_submitted());
        assert!(rpc_error(-32000, "Replacement transaction underpriced").is_already_submitted());
        assert!(
            rpc_error(-32000, "nonce too low: next nonce 5, tx nonce 4").is_already_submitted()
        );
        assert!(!rpc_error(-32000, "transaction underpriced").is_already_submitted());
        assert!(
            !rpc_error(-32000, "insufficient funds for gas * price + value").is_already_submitted()
        );
    }

    #[test]
    fn test_transient_classification() {
        let timeout = RpcError::Timeout {
            url: "http://node".to_string(),
            method: "eth_getLogs".to_string(),
            timeout_ms: 10,
        };
        assert!(timeout.is_transient());
        assert!(rpc_error(-32005, "limit exceeded").is_transient());
        assert!(!rpc_error(3, "execution reverted").is_transient());
    }
}
