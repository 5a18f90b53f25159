// ============================================================================
// RLP ENCODING HELPERS (for legacy EVM transactions)
// ============================================================================

use ethereum_types::U256;

/// Drops leading zero bytes (RLP integers are minimal big-endian).
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Encode a u64 as big-endian bytes with no leading zeros (RLP integer format).
pub fn u64_bytes(value: u64) -> Vec<u8> {
    trim_leading_zeros(&value.to_be_bytes()).to_vec()
}

/// Encode a U256 as big-endian bytes with no leading zeros.
pub fn u256_bytes(value: U256) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    trim_leading_zeros(&buf).to_vec()
}

/// RLP-encode a single byte-string item.
pub fn encode_item(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        // Single byte below 0x80: encoded as itself
        vec![data[0]]
    } else {
        let mut out = length_prefix(0x80, data.len());
        out.extend_from_slice(data);
        out
    }
}

/// RLP-encode a list of items (each item is raw bytes, NOT RLP-encoded).
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = items.iter().flat_map(|item| encode_item(item)).collect();
    let mut out = length_prefix(0xc0, payload.len());
    out.extend(payload);
    out
}

fn length_prefix(offset: u8, len: usize) -> Vec<u8> {
    if len <= 55 {
        vec![offset + len as u8]
    } else {
        let len_bytes = u64_bytes(len as u64);
        let mut out = vec![offset + 55 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out
    }
}
