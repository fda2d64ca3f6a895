//! Type-directed `Deserializer` over borrowed attribute values.

use std::collections::hash_map;
use std::collections::HashMap;
use std::slice;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use serde::de::value::{BorrowedStrDeserializer, StrDeserializer};
use serde::de::{
    DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use super::attr::parse_bool;
use super::CodecError;

type Result<T> = std::result::Result<T, CodecError>;

/// Borrowed view of one node in an item.
///
/// Set members and bytes inside a binary value are not `AttributeValue`s
/// themselves, so they get their own variants.
#[derive(Debug, Clone, Copy)]
pub(crate) enum View<'de> {
    S(&'de str),
    N(&'de str),
    Bool(bool),
    Null,
    B(&'de [u8]),
    Byte(u8),
    M(&'de HashMap<String, AttributeValue>),
    L(&'de [AttributeValue]),
    Ss(&'de [String]),
    Ns(&'de [String]),
    Bs(&'de [Blob]),
    Unknown,
}

impl<'de> View<'de> {
    pub(crate) fn of(value: &'de AttributeValue) -> Self {
        match value {
            AttributeValue::S(s) => View::S(s),
            AttributeValue::N(n) => View::N(n),
            AttributeValue::Bool(b) => View::Bool(*b),
            AttributeValue::Null(_) => View::Null,
            AttributeValue::B(blob) => View::B(blob.as_ref()),
            AttributeValue::M(map) => View::M(map),
            AttributeValue::L(values) => View::L(values),
            AttributeValue::Ss(values) => View::Ss(values),
            AttributeValue::Ns(values) => View::Ns(values),
            AttributeValue::Bs(values) => View::Bs(values),
            _ => View::Unknown,
        }
    }
}

pub(crate) struct AttributeDeserializer<'de> {
    view: View<'de>,
}

impl<'de> AttributeDeserializer<'de> {
    pub(crate) fn new(view: View<'de>) -> Self {
        Self { view }
    }

    fn deserialize_signed<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::N(raw) | View::S(raw) => {
                let trimmed = raw.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    visitor.visit_i64(n)
                } else if let Ok(n) = trimmed.parse::<u64>() {
                    visitor.visit_u64(n)
                } else {
                    Err(invalid_number("integer", raw))
                }
            }
            View::Byte(b) => visitor.visit_u8(b),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_unsigned<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::N(raw) | View::S(raw) => {
                let trimmed = raw.trim();
                if let Ok(n) = trimmed.parse::<u64>() {
                    visitor.visit_u64(n)
                } else if let Ok(n) = trimmed.parse::<i64>() {
                    visitor.visit_i64(n)
                } else {
                    Err(invalid_number("integer", raw))
                }
            }
            View::Byte(b) => visitor.visit_u8(b),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_float<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::N(raw) | View::S(raw) => match raw.trim().parse::<f64>() {
                Ok(f) => visitor.visit_f64(f),
                Err(_) => Err(invalid_number("float", raw)),
            },
            View::Byte(b) => visitor.visit_u8(b),
            _ => self.deserialize_any(visitor),
        }
    }
}

fn invalid_number(expected: &'static str, raw: &str) -> CodecError {
    CodecError::InvalidNumber {
        expected,
        value: raw.to_string(),
    }
}

fn looks_like_json_object(raw: &str) -> bool {
    raw.trim_start().starts_with('{')
}

fn json_error(err: serde_json::Error) -> CodecError {
    CodecError::Message(err.to_string())
}

impl<'de> Deserializer<'de> for AttributeDeserializer<'de> {
    type Error = CodecError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::S(s) => visitor.visit_borrowed_str(s),
            View::N(raw) => {
                let trimmed = raw.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    visitor.visit_i64(n)
                } else if let Ok(n) = trimmed.parse::<u64>() {
                    visitor.visit_u64(n)
                } else if let Ok(f) = trimmed.parse::<f64>() {
                    visitor.visit_f64(f)
                } else {
                    visitor.visit_borrowed_str(raw)
                }
            }
            View::Bool(b) => visitor.visit_bool(b),
            View::Null => visitor.visit_unit(),
            View::Byte(b) => visitor.visit_u8(b),
            View::B(bytes) => visitor.visit_seq(SeqReader::new(Elements::Bytes(bytes.iter()))),
            View::M(map) => visitor.visit_map(MapReader::new(map)),
            View::L(values) => visitor.visit_seq(SeqReader::new(Elements::List(values.iter()))),
            View::Ss(values) => {
                visitor.visit_seq(SeqReader::new(Elements::Strings(values.iter())))
            }
            View::Ns(values) => {
                visitor.visit_seq(SeqReader::new(Elements::Numbers(values.iter())))
            }
            View::Bs(values) => visitor.visit_seq(SeqReader::new(Elements::Blobs(values.iter()))),
            View::Unknown => Err(CodecError::Unsupported),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::Bool(b) => visitor.visit_bool(b),
            View::S(raw) => match parse_bool(raw) {
                Some(b) => visitor.visit_bool(b),
                None => self.deserialize_any(visitor),
            },
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_signed(visitor)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_signed(visitor)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_signed(visitor)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_signed(visitor)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_unsigned(visitor)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_unsigned(visitor)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_unsigned(visitor)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_unsigned(visitor)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_float(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_float(visitor)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::S(s) | View::N(s) => visitor.visit_borrowed_str(s),
            View::Bool(true) => visitor.visit_borrowed_str("true"),
            View::Bool(false) => visitor.visit_borrowed_str("false"),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::B(bytes) => visitor.visit_borrowed_bytes(bytes),
            View::S(s) => visitor.visit_borrowed_bytes(s.as_bytes()),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::Null => visitor.visit_unit(),
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.view {
            View::S(raw) if looks_like_json_object(raw) => {
                let value: serde_json::Value = serde_json::from_str(raw).map_err(json_error)?;
                Deserializer::deserialize_map(value, visitor).map_err(json_error)
            }
            _ => self.deserialize_any(visitor),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.view {
            View::S(raw) if looks_like_json_object(raw) => {
                let value: serde_json::Value = serde_json::from_str(raw).map_err(json_error)?;
                Deserializer::deserialize_enum(value, name, variants, visitor)
                    .map_err(json_error)
            }
            View::S(variant) => {
                let access: StrDeserializer<'_, CodecError> = variant.into_deserializer();
                visitor.visit_enum(access)
            }
            View::M(map) if map.len() == 1 => match map.iter().next() {
                Some((variant, value)) => visitor.visit_enum(EnumReader { variant, value }),
                None => Err(CodecError::Message("empty enum map".to_string())),
            },
            _ => Err(CodecError::TypeMismatch {
                expected: "enum",
                found: view_kind(&self.view),
            }),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        seq tuple tuple_struct
    }
}

fn view_kind(view: &View<'_>) -> &'static str {
    match view {
        View::S(_) => "S",
        View::N(_) => "N",
        View::Bool(_) => "BOOL",
        View::Null => "NULL",
        View::B(_) => "B",
        View::Byte(_) => "byte",
        View::M(_) => "M",
        View::L(_) => "L",
        View::Ss(_) => "SS",
        View::Ns(_) => "NS",
        View::Bs(_) => "BS",
        View::Unknown => "unknown",
    }
}

// ============================================================================
// Sequences
// ============================================================================

enum Elements<'de> {
    List(slice::Iter<'de, AttributeValue>),
    Strings(slice::Iter<'de, String>),
    Numbers(slice::Iter<'de, String>),
    Blobs(slice::Iter<'de, Blob>),
    Bytes(slice::Iter<'de, u8>),
}

impl<'de> Iterator for Elements<'de> {
    type Item = View<'de>;

    fn next(&mut self) -> Option<View<'de>> {
        match self {
            Elements::List(it) => it.next().map(View::of),
            Elements::Strings(it) => it.next().map(|s| View::S(s)),
            Elements::Numbers(it) => it.next().map(|n| View::N(n)),
            Elements::Blobs(it) => it.next().map(|b| View::B(b.as_ref())),
            Elements::Bytes(it) => it.next().copied().map(View::Byte),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = match self {
            Elements::List(it) => it.len(),
            Elements::Strings(it) | Elements::Numbers(it) => it.len(),
            Elements::Blobs(it) => it.len(),
            Elements::Bytes(it) => it.len(),
        };
        (len, Some(len))
    }
}

struct SeqReader<'de> {
    elements: Elements<'de>,
}

impl<'de> SeqReader<'de> {
    fn new(elements: Elements<'de>) -> Self {
        Self { elements }
    }
}

impl<'de> SeqAccess<'de> for SeqReader<'de> {
    type Error = CodecError;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>> {
        match self.elements.next() {
            Some(view) => seed.deserialize(AttributeDeserializer::new(view)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        self.elements.size_hint().1
    }
}

// ============================================================================
// Maps
// ============================================================================

struct MapReader<'de> {
    entries: hash_map::Iter<'de, String, AttributeValue>,
    pending: Option<&'de AttributeValue>,
}

impl<'de> MapReader<'de> {
    fn new(map: &'de HashMap<String, AttributeValue>) -> Self {
        Self {
            entries: map.iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for MapReader<'de> {
    type Error = CodecError;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.entries.next() {
            Some((key, value)) => {
                self.pending = Some(value);
                seed.deserialize(AttributeDeserializer::new(View::S(key))).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        match self.pending.take() {
            Some(value) => seed.deserialize(AttributeDeserializer::new(View::of(value))),
            None => Err(CodecError::Message(
                "map value requested before its key".to_string(),
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Externally tagged enum stored as a single-entry map: `{variant: value}`.
struct EnumReader<'de> {
    variant: &'de str,
    value: &'de AttributeValue,
}

impl<'de> EnumAccess<'de> for EnumReader<'de> {
    type Error = CodecError;
    type Variant = VariantReader<'de>;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let variant = seed.deserialize(BorrowedStrDeserializer::<CodecError>::new(self.variant))?;
        Ok((variant, VariantReader { value: self.value }))
    }
}

struct VariantReader<'de> {
    value: &'de AttributeValue,
}

impl<'de> VariantAccess<'de> for VariantReader<'de> {
    type Error = CodecError;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(AttributeDeserializer::new(View::of(self.value)))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        Deserializer::deserialize_seq(AttributeDeserializer::new(View::of(self.value)), visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        Deserializer::deserialize_map(AttributeDeserializer::new(View::of(self.value)), visitor)
    }
}
