//! Error taxonomy for function invocations.
//!
//! Every terminal error ends up as a short message returned to the host.
//! Only `Transient` (and transient RPC errors) are retried, and only by the
//! bounded loops inside the verifier.

use chain_clients_common::truncate_error_message;
use chain_clients_evm::{AbiError, RpcError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FunctionError {
    /// Network or endpoint failure that outlived its retry bound
    #[error("{0}")]
    Transient(String),

    /// Missing logs, arguments, secrets or chains
    #[error("{0}")]
    NotFound(String),

    /// Commitment mismatch, vanished log, wrong routine digest
    #[error("{0}")]
    Integrity(String),

    /// Unknown host chain id, unimplemented distribution mode, unknown routine
    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("Invalid ABI data: {0}")]
    Abi(#[from] AbiError),

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl FunctionError {
    pub fn is_transient(&self) -> bool {
        match self {
            FunctionError::Transient(_) => true,
            FunctionError::Rpc(e) => e.is_transient(),
            _ => false,
        }
    }

    /// True for node rejections meaning a concurrent run already landed an
    /// equivalent transaction.
    pub fn is_already_submitted(&self) -> bool {
        matches!(self, FunctionError::Rpc(e) if e.is_already_submitted())
    }

    /// Message handed to the host, cut to the host's size limit.
    pub fn host_message(&self) -> String {
        truncate_error_message(&self.to_string())
    }
}
