use alloy_dyn_abi::DynSolValue;

use crate::utils::codec::{hex_encode_prefixed, normalize_address};

/// String form of a decoded value as stored in the `argument_values` column.
///
/// Integers are decimal, addresses lowercase hex, byte values 0x-prefixed hex,
/// arrays `[a,b]` and tuples `(a,b)`.
pub fn render_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => hex_encode_prefixed(&word[..*size]),
        DynSolValue::Address(address) => normalize_address(&address.to_string()),
        DynSolValue::Function(function) => hex_encode_prefixed(function.as_slice()),
        DynSolValue::Bytes(bytes) => hex_encode_prefixed(bytes),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            render_sequence('[', values, ']')
        }
        other => match other.as_tuple() {
            Some(fields) => render_sequence('(', fields, ')'),
            None => String::new(),
        },
    }
}

fn render_sequence(open: char, values: &[DynSolValue], close: char) -> String {
    let inner = values.iter().map(render_value).collect::<Vec<_>>().join(",");
    format!("{open}{inner}{close}")
}
