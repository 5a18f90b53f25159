//! Shared utilities for cross-chain client libraries
//!
//! Small, dependency-free helpers used by the chain clients and the bridge
//! functions: hex normalisation, hex quantity parsing and host-facing error
//! message truncation.

/// Maximum error message length accepted by the hosting compute layer.
pub const MAX_ERROR_MESSAGE_LEN: usize = 255;

/// Strips an optional `0x`/`0X` prefix.
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Normalize a hex string to have a lowercase 0x prefix.
pub fn normalize_hex(value: &str) -> String {
    format!("0x{}", strip_hex_prefix(value).to_lowercase())
}

/// Compares two hex strings ignoring case and the `0x` prefix.
pub fn hex_eq_ignore_case(a: &str, b: &str) -> bool {
    strip_hex_prefix(a).eq_ignore_ascii_case(strip_hex_prefix(b))
}

/// Parses a JSON-RPC hex quantity (e.g. `"0x1b4"`) into a u64.
///
/// Returns `None` for empty or malformed input. `"0x"` is treated as zero,
/// which some providers return for empty quantities.
pub fn parse_hex_u64(value: &str) -> Option<u64> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return if value.len() >= 2 { Some(0) } else { None };
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Formats a u64 as a JSON-RPC hex quantity.
pub fn to_hex_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Truncates a message to at most `MAX_ERROR_MESSAGE_LEN` bytes without
/// splitting a UTF-8 character.
pub fn truncate_error_message(message: &str) -> String {
    if message.len() <= MAX_ERROR_MESSAGE_LEN {
        return message.to_string();
    }
    let mut end = MAX_ERROR_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}
