//! Legacy (pre-EIP-1559) transactions with EIP-155 replay protection.
//!
//! Public endpoints hold no keys, so transactions are built, signed locally
//! and broadcast with `eth_sendRawTransaction`.

use ethereum_types::{H160, U256};

use crate::abi::keccak256;
use crate::rlp;

/// ECDSA signature over a transaction signing hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 0 or 1
    pub recovery_id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: H160,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    /// [nonce, gasPrice, gasLimit, to, value, data]
    fn base_fields(&self) -> Vec<Vec<u8>> {
        vec![
            rlp::u64_bytes(self.nonce),
            rlp::u256_bytes(self.gas_price),
            rlp::u64_bytes(self.gas_limit),
            self.to.as_bytes().to_vec(),
            rlp::u256_bytes(self.value),
            self.data.clone(),
        ]
    }

    /// RLP of [nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut fields = self.base_fields();
        fields.push(rlp::u64_bytes(self.chain_id));
        fields.push(vec![]);
        fields.push(vec![]);
        rlp::encode_list(&fields)
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    /// EIP-155 v value: recovery_id + chainId * 2 + 35
    pub fn v(&self, recovery_id: u8) -> u64 {
        recovery_id as u64 + self.chain_id * 2 + 35
    }

    /// RLP of [nonce, gasPrice, gasLimit, to, value, data, v, r, s]
    pub fn encode_signed(&self, signature: &TransactionSignature) -> Vec<u8> {
        let mut fields = self.base_fields();
        fields.push(rlp::u64_bytes(self.v(signature.recovery_id)));
        fields.push(rlp::trim_leading_zeros(&signature.r).to_vec());
        fields.push(rlp::trim_leading_zeros(&signature.s).to_vec());
        rlp::encode_list(&fields)
    }
}
