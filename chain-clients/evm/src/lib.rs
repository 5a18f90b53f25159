//! EVM JSON-RPC client library
//!
//! Provides the pieces the bridge functions need to talk to EVM chains over
//! public JSON-RPC endpoints: randomized endpoint selection, a JSON-RPC client
//! with method overrides, log filters, ABI word encoding and legacy (EIP-155)
//! transaction encoding.

pub mod abi;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod logs;
pub mod rlp;
pub mod transaction;

// Re-export commonly used types
pub use client::{EvmClient, RpcCall, DEFAULT_GAS_LIMIT_OVERRIDE};
pub use endpoints::EndpointPool;
pub use error::{AbiError, RpcError};
pub use ethereum_types::{H160, H256, U256};
pub use logs::{BlockTag, EvmLog, LogFilter};
pub use transaction::{LegacyTransaction, TransactionSignature};
