//! Scalar accessors for single attribute values.
//!
//! Each accessor applies the same coercions as item decoding: `S` and `N`
//! are interchangeable for numbers, and `S` can hold a boolean literal.

use aws_sdk_dynamodb::types::AttributeValue;

use super::{kind_name, CodecError};

/// Parse a boolean literal: `1`, `t`, `true`, `0`, `f`, `false` (any case).
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

fn mismatch(expected: &'static str, value: &AttributeValue) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        found: kind_name(value),
    }
}

/// Read an attribute as a string. `S`, `N` and `BOOL` are accepted.
pub fn as_string(value: &AttributeValue) -> Result<String, CodecError> {
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) => Ok(s.clone()),
        AttributeValue::Bool(b) => Ok(b.to_string()),
        other => Err(mismatch("string", other)),
    }
}

/// Read an attribute as a signed integer.
pub fn as_i64(value: &AttributeValue) -> Result<i64, CodecError> {
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) => {
            s.trim().parse().map_err(|_| CodecError::InvalidNumber {
                expected: "integer",
                value: s.clone(),
            })
        }
        other => Err(mismatch("integer", other)),
    }
}

/// Read an attribute as a float.
pub fn as_f64(value: &AttributeValue) -> Result<f64, CodecError> {
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) => {
            s.trim().parse().map_err(|_| CodecError::InvalidNumber {
                expected: "float",
                value: s.clone(),
            })
        }
        other => Err(mismatch("float", other)),
    }
}

/// Read an attribute as a boolean.
pub fn as_bool(value: &AttributeValue) -> Result<bool, CodecError> {
    match value {
        AttributeValue::Bool(b) => Ok(*b),
        AttributeValue::S(s) => parse_bool(s).ok_or_else(|| mismatch("bool", value)),
        other => Err(mismatch("bool", other)),
    }
}

/// Read a string set or a list of string-like values.
pub fn as_string_list(value: &AttributeValue) -> Result<Vec<String>, CodecError> {
    match value {
        AttributeValue::Ss(values) => Ok(values.clone()),
        AttributeValue::L(values) => values.iter().map(as_string).collect(),
        other => Err(mismatch("string list", other)),
    }
}

/// Read a number set or a list of numeric values.
pub fn as_i64_list(value: &AttributeValue) -> Result<Vec<i64>, CodecError> {
    match value {
        AttributeValue::Ns(values) => values
            .iter()
            .map(|n| as_i64(&AttributeValue::N(n.clone())))
            .collect(),
        AttributeValue::L(values) => values.iter().map(as_i64).collect(),
        other => Err(mismatch("integer list", other)),
    }
}
