use alloy_primitives::{U256, hex};
use chrono::{DateTime, NaiveTime, Utc};

const HEX_PREFIX: &str = "0x";
const DELIMITER_CHAR: char = '\x1f';

// Characters dropped from decoded display text
const STOP_CHARS: [char; 3] = ['\n', '\r', DELIMITER_CHAR];

/// Best-effort decoding of a hex field (e.g. block extra data) into display text.
///
/// Returns an empty string when the input is not valid hex. Invalid UTF-8 is
/// replaced rather than rejected, and newline, carriage return and the unit
/// separator control character are removed from the result.
pub fn derive_human_readable_text(text: &str) -> String {
    let text = text.strip_prefix(HEX_PREFIX).unwrap_or(text);
    let decoded = match hex::decode(text) {
        Ok(bytes) => bytes,
        Err(_) => return String::new(),
    };

    String::from_utf8_lossy(&decoded)
        .chars()
        .filter(|c| !STOP_CHARS.contains(c))
        .collect()
}

/// Zeroes the time-of-day of a UTC timestamp.
pub fn truncate_to_day(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Lowercases an address so storage lookups and joins are case-insensitive.
pub fn normalize_address(address: &str) -> String {
    address.to_ascii_lowercase()
}

pub fn hex_encode_prefixed<T: AsRef<[u8]>>(bytes: T) -> String {
    hex::encode_prefixed(bytes)
}

/// Floating approximation of a 256-bit chain integer.
pub fn u256_to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}
