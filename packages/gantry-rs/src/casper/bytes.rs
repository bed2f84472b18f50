//! Casper CLValue byte serialization.
//!
//! Deploy hashing operates over the canonical byte form of every value:
//! little-endian length-prefixed big integers, u32-length-prefixed UTF-8
//! strings and raw fixed-size byte arrays. The JSON form mirrors the same
//! value bytes in hex next to a `cl_type` descriptor.

use alloy::primitives::U256;
use serde_json::{json, Value};

// Type tags from the CLType serialization table.
const TAG_U128: u8 = 6;
const TAG_U256: u8 = 7;
const TAG_U512: u8 = 8;
const TAG_STRING: u8 = 10;
const TAG_BYTE_ARRAY: u8 = 15;

/// u32 little-endian length prefix used throughout the deploy format.
pub(crate) fn u32_prefix(len: usize) -> [u8; 4] {
    (len as u32).to_le_bytes()
}

/// String serialization: u32 length prefix plus UTF-8 bytes.
pub(crate) fn string_bytes(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + value.len());
    out.extend_from_slice(&u32_prefix(value.len()));
    out.extend_from_slice(value.as_bytes());
    out
}

/// Big integer serialization: one length byte plus the minimal
/// little-endian magnitude. Zero serializes as a bare zero length byte.
pub(crate) fn big_int_bytes(value: &U256) -> Vec<u8> {
    let le = value.to_le_bytes::<32>();
    let len = 32 - le.iter().rev().take_while(|b| **b == 0).count();
    let mut out = Vec::with_capacity(1 + len);
    out.push(len as u8);
    out.extend_from_slice(&le[..len]);
    out
}

// ============================================================================
// CLValue
// ============================================================================

/// The CLValue variants bridge deploys use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClValue {
    U128(u128),
    U256(U256),
    U512(U256),
    String(String),
    ByteArray(Vec<u8>),
}

impl ClValue {
    /// Serialized type descriptor appended after the value bytes.
    pub fn type_tag(&self) -> Vec<u8> {
        match self {
            ClValue::U128(_) => vec![TAG_U128],
            ClValue::U256(_) => vec![TAG_U256],
            ClValue::U512(_) => vec![TAG_U512],
            ClValue::String(_) => vec![TAG_STRING],
            ClValue::ByteArray(bytes) => {
                let mut tag = Vec::with_capacity(5);
                tag.push(TAG_BYTE_ARRAY);
                tag.extend_from_slice(&u32_prefix(bytes.len()));
                tag
            }
        }
    }

    /// Canonical value bytes, the payload hashed into deploy bodies and
    /// carried hex-encoded in the JSON `bytes` field.
    pub fn value_bytes(&self) -> Vec<u8> {
        match self {
            ClValue::U128(value) => big_int_bytes(&U256::from(*value)),
            ClValue::U256(value) | ClValue::U512(value) => big_int_bytes(value),
            ClValue::String(value) => string_bytes(value),
            ClValue::ByteArray(bytes) => bytes.clone(),
        }
    }

    /// Full CLValue serialization: length-prefixed value bytes followed by
    /// the type descriptor.
    pub fn to_bytes(&self) -> Vec<u8> {
        let value = self.value_bytes();
        let mut out = Vec::with_capacity(4 + value.len() + 5);
        out.extend_from_slice(&u32_prefix(value.len()));
        out.extend_from_slice(&value);
        out.extend_from_slice(&self.type_tag());
        out
    }

    /// `cl_type` descriptor for the JSON form.
    pub fn cl_type_json(&self) -> Value {
        match self {
            ClValue::U128(_) => json!("U128"),
            ClValue::U256(_) => json!("U256"),
            ClValue::U512(_) => json!("U512"),
            ClValue::String(_) => json!("String"),
            ClValue::ByteArray(bytes) => json!({ "ByteArray": bytes.len() }),
        }
    }

    /// Human-readable `parsed` field for the JSON form.
    pub fn parsed_json(&self) -> Value {
        match self {
            ClValue::U128(value) => json!(value.to_string()),
            ClValue::U256(value) | ClValue::U512(value) => json!(value.to_string()),
            ClValue::String(value) => json!(value),
            ClValue::ByteArray(bytes) => json!(hex::encode(bytes)),
        }
    }
}

// ============================================================================
// RuntimeArgs
// ============================================================================

/// Ordered named arguments of a deploy item. Order is part of the hashed
/// bytes, so insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeArgs {
    args: Vec<(String, ClValue)>,
}

impl RuntimeArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: ClValue) {
        self.args.push((name.to_string(), value));
    }

    pub fn with(mut self, name: &str, value: ClValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClValue> {
        self.args
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ClValue)> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Canonical bytes: u32 argument count, then name and CLValue pairs.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&u32_prefix(self.args.len()));
        for (name, value) in &self.args {
            out.extend_from_slice(&string_bytes(name));
            out.extend_from_slice(&value.to_bytes());
        }
        out
    }

    /// JSON form: an array of `[name, {cl_type, bytes, parsed}]` pairs.
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.args
                .iter()
                .map(|(name, value)| {
                    json!([
                        name,
                        {
                            "cl_type": value.cl_type_json(),
                            "bytes": hex::encode(value.value_bytes()),
                            "parsed": value.parsed_json(),
                        }
                    ])
                })
                .collect(),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_ints_serialize_to_minimal_little_endian() {
        assert_eq!(hex::encode(big_int_bytes(&U256::ZERO)), "00");
        assert_eq!(
            hex::encode(big_int_bytes(&U256::from(40_000_000_000u64))),
            "0500902f5009"
        );
        assert_eq!(
            hex::encode(big_int_bytes(&U256::from(10u64).pow(U256::from(18u64)))),
            "08000064a7b3b6e00d"
        );
    }

    #[test]
    fn strings_carry_a_length_prefix() {
        assert_eq!(hex::encode(string_bytes("amount")), "06000000616d6f756e74");
        assert_eq!(hex::encode(string_bytes("")), "00000000");
    }

    #[test]
    fn clvalue_bytes_wrap_value_and_type() {
        let amount = ClValue::U512(U256::from(40_000_000_000u64));
        assert_eq!(hex::encode(amount.to_bytes()), "060000000500902f500908");

        let signature = ClValue::ByteArray(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            hex::encode(signature.to_bytes()),
            "04000000deadbeef0f04000000"
        );
    }

    #[test]
    fn args_hash_in_insertion_order() {
        let args = RuntimeArgs::new()
            .with("amount", ClValue::U512(U256::from(40_000_000_000u64)));
        assert_eq!(
            hex::encode(args.to_bytes()),
            "0100000006000000616d6f756e74060000000500902f500908"
        );
    }

    #[test]
    fn json_mirrors_value_bytes() {
        let args = RuntimeArgs::new()
            .with("amount", ClValue::U512(U256::from(40_000_000_000u64)))
            .with("destination_chain", ClValue::String("GOERLI".to_string()));
        let json = args.to_json();

        assert_eq!(json[0][0], "amount");
        assert_eq!(json[0][1]["cl_type"], "U512");
        assert_eq!(json[0][1]["bytes"], "0500902f5009");
        assert_eq!(json[0][1]["parsed"], "40000000000");

        assert_eq!(json[1][0], "destination_chain");
        assert_eq!(json[1][1]["cl_type"], "String");
        assert_eq!(json[1][1]["parsed"], "GOERLI");
    }

    #[test]
    fn byte_array_type_encodes_its_length() {
        let value = ClValue::ByteArray(vec![0xcc; 32]);
        assert_eq!(hex::encode(value.type_tag()), "0f20000000");
        assert_eq!(value.cl_type_json(), json!({ "ByteArray": 32 }));
    }

    #[test]
    fn lookup_by_name() {
        let args = RuntimeArgs::new().with("nonce", ClValue::U128(7));
        assert_eq!(args.get("nonce"), Some(&ClValue::U128(7)));
        assert_eq!(args.get("amount"), None);
        assert_eq!(args.len(), 1);
    }
}
