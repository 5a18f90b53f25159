//! Event log types and `eth_getLogs` filters.

use chain_clients_common::{parse_hex_u64, to_hex_quantity};
use serde::{Deserialize, Serialize};

/// EVM event log entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EvmLog {
    /// Address of the contract that emitted the event
    pub address: String,
    /// Array of topics (indexed event parameters)
    pub topics: Vec<String>,
    /// Event data (non-indexed parameters)
    pub data: String,
    /// Block number (JSON-RPC uses camelCase: blockNumber)
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    /// Transaction hash (JSON-RPC uses camelCase: transactionHash)
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    /// Log index (JSON-RPC uses camelCase: logIndex)
    #[serde(rename = "logIndex", default)]
    pub log_index: Option<String>,
}

impl EvmLog {
    /// Block number as an integer, if the node returned a well-formed quantity.
    pub fn block_number_u64(&self) -> Option<u64> {
        parse_hex_u64(&self.block_number)
    }

    /// Raw bytes of the non-indexed event data.
    pub fn data_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(chain_clients_common::strip_hex_prefix(&self.data))
    }
}

/// Block reference used in filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Number(u64),
    Latest,
}

impl BlockTag {
    fn to_json(self) -> serde_json::Value {
        match self {
            BlockTag::Number(n) => serde_json::json!(to_hex_quantity(n)),
            BlockTag::Latest => serde_json::json!("latest"),
        }
    }
}

/// `eth_getLogs` filter: one contract address, positional topics and a block range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: String,
    /// topics[0] is the event signature hash, the rest are indexed values
    pub topics: Vec<String>,
    pub from_block: BlockTag,
    pub to_block: BlockTag,
}

impl LogFilter {
    pub fn new(address: &str, topics: Vec<String>) -> Self {
        Self {
            address: address.to_string(),
            topics,
            from_block: BlockTag::Latest,
            to_block: BlockTag::Latest,
        }
    }

    pub fn from_block(mut self, block: BlockTag) -> Self {
        self.from_block = block;
        self
    }

    pub fn to_block(mut self, block: BlockTag) -> Self {
        self.to_block = block;
        self
    }

    /// JSON object passed as the single `eth_getLogs` parameter.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "address": self.address,
            "topics": self.topics,
            "fromBlock": self.from_block.to_json(),
            "toBlock": self.to_block.to_json(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_json_shape() {
        let filter = LogFilter::new("0xabc", vec!["0x01".to_string(), "0x02".to_string()])
            .from_block(BlockTag::Number(100))
            .to_block(BlockTag::Number(103));

        assert_eq!(
            filter.to_json(),
            serde_json::json!({
                "address": "0xabc",
                "topics": ["0x01", "0x02"],
                "fromBlock": "0x64",
                "toBlock": "0x67",
            })
        );
    }

    #[test]
    fn test_log_deserializes_without_log_index() {
        let log: EvmLog = serde_json::from_value(serde_json::json!({
            "address": "0xabc",
            "topics": [],
            "data": "0x",
            "blockNumber": "0x64",
            "transactionHash": "0x01",
        }))
        .unwrap();
        assert_eq!(log.block_number_u64(), Some(100));
        assert_eq!(log.log_index, None);
    }
}
