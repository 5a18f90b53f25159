//! Minimal Solidity ABI encoding and decoding.
//!
//! Covers what the pool contracts need: static 32-byte words, one level of
//! dynamic `bytes`, function selectors and event topics.

use chain_clients_common::strip_hex_prefix;
use ethereum_types::{H160, U256};
use sha3::{Digest, Keccak256};

use crate::error::AbiError;

/// One 32-byte ABI word.
pub type Word = [u8; 32];

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// First 4 bytes of keccak256 of the function signature.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Event signature hash as a `0x`-prefixed topic string.
pub fn event_topic(signature: &str) -> String {
    format!("0x{}", hex::encode(keccak256(signature.as_bytes())))
}

pub fn word_u64(value: u64) -> Word {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn word_u256(value: U256) -> Word {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

pub fn word_address(address: &H160) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// ABI value for a tuple or call argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Any static value already encoded as a word
    Word(Word),
    /// Dynamic `bytes`
    Bytes(Vec<u8>),
}

/// Encodes tokens the way `abi.encode(...)` does (heads, then tails).
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Word(word) => head.extend_from_slice(word),
            Token::Bytes(bytes) => {
                head.extend_from_slice(&word_u64((head_len + tail.len()) as u64));
                tail.extend_from_slice(&word_u64(bytes.len() as u64));
                tail.extend_from_slice(bytes);
                let padding = (32 - bytes.len() % 32) % 32;
                tail.extend(std::iter::repeat(0u8).take(padding));
            }
        }
    }

    head.extend(tail);
    head
}

/// Selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = function_selector(signature).to_vec();
    data.extend(encode(args));
    data
}

/// Parses a 20-byte address, or a 32-byte word holding one.
pub fn parse_address(value: &str) -> Result<H160, AbiError> {
    let bytes = hex::decode(strip_hex_prefix(value))
        .map_err(|e| AbiError::InvalidHex(format!("{}: {}", value, e)))?;
    address_from_bytes(&bytes)
}

/// Accepts either the raw 20 bytes or a left-padded 32-byte word.
pub fn address_from_bytes(bytes: &[u8]) -> Result<H160, AbiError> {
    match bytes.len() {
        20 => Ok(H160::from_slice(bytes)),
        32 if bytes[..12].iter().all(|&b| b == 0) => Ok(H160::from_slice(&bytes[12..])),
        32 => Err(AbiError::Overflow { target: "address" }),
        actual => Err(AbiError::InvalidLength {
            what: "address",
            expected: 20,
            actual,
        }),
    }
}

pub fn parse_bytes32(value: &str) -> Result<[u8; 32], AbiError> {
    let bytes = hex::decode(strip_hex_prefix(value))
        .map_err(|e| AbiError::InvalidHex(format!("{}: {}", value, e)))?;
    bytes32_from_slice(&bytes)
}

pub fn bytes32_from_slice(bytes: &[u8]) -> Result<[u8; 32], AbiError> {
    bytes.try_into().map_err(|_| AbiError::InvalidLength {
        what: "bytes32",
        expected: 32,
        actual: bytes.len(),
    })
}

/// Reads words out of ABI-encoded return data or event data.
#[derive(Debug, Clone, Copy)]
pub struct AbiReader<'a> {
    data: &'a [u8],
}

impl<'a> AbiReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn slice(&self, start: usize, len: usize) -> Result<&'a [u8], AbiError> {
        let end = start.checked_add(len).ok_or(AbiError::Overflow { target: "usize" })?;
        self.data.get(start..end).ok_or(AbiError::OutOfBounds {
            needed: end,
            available: self.data.len(),
        })
    }

    /// Word at position `index` (byte offset `index * 32`).
    pub fn word(&self, index: usize) -> Result<&'a [u8], AbiError> {
        let start = index.checked_mul(32).ok_or(AbiError::Overflow { target: "usize" })?;
        self.slice(start, 32)
    }

    pub fn u256_at(&self, index: usize) -> Result<U256, AbiError> {
        Ok(U256::from_big_endian(self.word(index)?))
    }

    pub fn u64_at(&self, index: usize) -> Result<u64, AbiError> {
        let value = self.u256_at(index)?;
        if value > U256::from(u64::MAX) {
            return Err(AbiError::Overflow { target: "u64" });
        }
        Ok(value.low_u64())
    }

    pub fn address_at(&self, index: usize) -> Result<H160, AbiError> {
        address_from_bytes(self.word(index)?)
    }

    pub fn bytes32_at(&self, index: usize) -> Result<[u8; 32], AbiError> {
        bytes32_from_slice(self.word(index)?)
    }

    /// Dynamic `bytes` whose offset is stored in head word `index`.
    pub fn dynamic_bytes(&self, index: usize) -> Result<Vec<u8>, AbiError> {
        let offset = self.usize_from_word(self.word(index)?)?;
        let len = self.usize_from_word(self.slice(offset, 32)?)?;
        let start = offset.checked_add(32).ok_or(AbiError::Overflow { target: "usize" })?;
        Ok(self.slice(start, len)?.to_vec())
    }

    fn usize_from_word(&self, word: &[u8]) -> Result<usize, AbiError> {
        let value = U256::from_big_endian(word);
        if value > U256::from(usize::MAX) {
            return Err(AbiError::Overflow { target: "usize" });
        }
        Ok(value.as_usize())
    }
}
