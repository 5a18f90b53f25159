//! Result encodings returned to the host.

use chain_clients_evm::abi::{word_address, word_u256};
use chain_clients_evm::U256;

use crate::commitment::BridgeSentEvent;

/// 32-byte big-endian unsigned integer.
pub fn encode_uint256(value: U256) -> Vec<u8> {
    word_u256(value).to_vec()
}

/// Success sentinel returned by routines that only submit transactions.
pub fn success() -> Vec<u8> {
    encode_uint256(U256::one())
}

/// `receiver (32, left-padded) ‖ amount (32) ‖ payload`
pub fn encode_verified_transfer(event: &BridgeSentEvent) -> Vec<u8> {
    let mut out = Vec::with_capacity(64 + event.payload.len());
    out.extend_from_slice(&word_address(&event.receiver));
    out.extend_from_slice(&word_u256(event.amount));
    out.extend_from_slice(&event.payload);
    out
}

/// `total (32) ‖ one byte per completed deposit index`
pub fn encode_total_balance(total: U256, completed_indexes: &[u8]) -> Vec<u8> {
    let mut out = encode_uint256(total);
    out.extend_from_slice(completed_indexes);
    out
}
