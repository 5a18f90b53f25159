//! Source-chain transfer event and its commitment hash.
//!
//! The commitment is
//! `keccak256(abi.encode(bytes32 id, uint256 amount, uint64 chainSelector, address receiver, bytes32 keccak256(payload)))`.

use chain_clients_common::hex_eq_ignore_case;
use chain_clients_evm::abi::{self, AbiReader, Token};
use chain_clients_evm::{EvmLog, H160, U256};

use crate::error::FunctionError;

/// Event emitted by the source bridge contract when a transfer is sent.
pub const BRIDGE_SENT_EVENT: &str = "ConceroBridgeSent(bytes32,uint256,uint64,address,bytes)";

/// Decoded `ConceroBridgeSent(bytes32 indexed id, uint256 amount, uint64 chainSelector, address receiver, bytes payload)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSentEvent {
    pub message_id: [u8; 32],
    pub amount: U256,
    /// Destination chain selector
    pub chain_selector: u64,
    pub receiver: H160,
    /// Compressed destination swap data, passed on untouched
    pub payload: Vec<u8>,
}

impl BridgeSentEvent {
    pub fn from_log(log: &EvmLog) -> Result<Self, FunctionError> {
        let topic = log.topics.get(1).ok_or_else(|| {
            FunctionError::Integrity(format!(
                "Log {} has no message id topic",
                log.transaction_hash
            ))
        })?;
        let message_id = abi::parse_bytes32(topic)?;
        let data = log.data_bytes().map_err(|e| {
            FunctionError::Integrity(format!("Log {} data is not hex: {}", log.transaction_hash, e))
        })?;

        let reader = AbiReader::new(&data);
        Ok(Self {
            message_id,
            amount: reader.u256_at(0)?,
            chain_selector: reader.u64_at(1)?,
            receiver: reader.address_at(2)?,
            payload: reader.dynamic_bytes(3)?,
        })
    }

    /// Recomputes the commitment over the canonical fields.
    pub fn commitment(&self) -> [u8; 32] {
        let encoded = abi::encode(&[
            Token::Word(self.message_id),
            Token::Word(abi::word_u256(self.amount)),
            Token::Word(abi::word_u64(self.chain_selector)),
            Token::Word(abi::word_address(&self.receiver)),
            Token::Word(abi::keccak256(&self.payload)),
        ]);
        abi::keccak256(&encoded)
    }

    /// Fails closed unless the recomputed commitment equals `expected`.
    pub fn check_commitment(&self, expected: &[u8; 32]) -> Result<(), FunctionError> {
        let computed = hex::encode(self.commitment());
        let expected = hex::encode(expected);
        if hex_eq_ignore_case(&computed, &expected) {
            Ok(())
        } else {
            Err(FunctionError::Integrity(format!(
                "Commitment mismatch: computed 0x{} != expected 0x{}",
                computed, expected
            )))
        }
    }

    /// ABI `data` field of the event as the contract would emit it.
    pub fn encode_data(&self) -> Vec<u8> {
        abi::encode(&[
            Token::Word(abi::word_u256(self.amount)),
            Token::Word(abi::word_u64(self.chain_selector)),
            Token::Word(abi::word_address(&self.receiver)),
            Token::Bytes(self.payload.clone()),
        ])
    }
}
