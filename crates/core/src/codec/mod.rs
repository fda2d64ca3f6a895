//! Attribute-value marshaling.
//!
//! Converts between serde types and DynamoDB items. Encoding goes through
//! `serde_json::Value` and maps each JSON node onto an `AttributeValue`.
//! Decoding is type-directed: a serde `Deserializer` over `AttributeValue`
//! lets the target type drive the conversion, so numeric strings land in
//! integer fields and `N` values land in string fields.

pub mod attr;
mod de;

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use de::{AttributeDeserializer, View};

/// A DynamoDB item: attribute name to attribute value.
pub type Item = HashMap<String, AttributeValue>;

/// Errors produced while marshaling items.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected an object at the top level, found {0}")]
    NotAnObject(&'static str),
    #[error("cannot convert {found} attribute to {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid {expected} {value:?}")]
    InvalidNumber {
        expected: &'static str,
        value: String,
    },
    #[error("unsupported attribute value")]
    Unsupported,
    #[error("{0}")]
    Message(String),
}

impl serde::de::Error for CodecError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        CodecError::Message(msg.to_string())
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Serialize a value into a DynamoDB item.
///
/// The value must serialize to a JSON object; its fields become attributes.
pub fn to_item<T: Serialize + ?Sized>(value: &T) -> Result<Item, CodecError> {
    match serde_json::to_value(value).map_err(|e| CodecError::Message(e.to_string()))? {
        Value::Object(map) => Ok(json_to_item(&map)),
        other => Err(CodecError::NotAnObject(json_kind(&other))),
    }
}

/// Serialize a value into a single attribute value.
pub fn to_attribute_value<T: Serialize + ?Sized>(value: &T) -> Result<AttributeValue, CodecError> {
    serde_json::to_value(value)
        .map(|v| json_to_attribute(&v))
        .map_err(|e| CodecError::Message(e.to_string()))
}

/// Convert a dynamic JSON document into an item.
pub fn json_to_item(map: &Map<String, Value>) -> Item {
    map.iter()
        .map(|(k, v)| (k.clone(), json_to_attribute(v)))
        .collect()
}

/// Convert a JSON value into an attribute value.
///
/// Arrays always become `L`: JSON cannot tell a string set from a list of
/// strings, and `SS` rejects duplicates and empty sets.
pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(json_to_item(map)),
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Deserialize an item into `T`.
///
/// String-to-number and number-to-string coercion needs the target type.
/// Fields under `#[serde(flatten)]`, untagged enums and internally tagged
/// enums are buffered before their type is known, so they decode values as
/// stored: `S("32")` will not fill an `i32` there.
pub fn from_item<T: DeserializeOwned>(item: &Item) -> Result<T, CodecError> {
    T::deserialize(AttributeDeserializer::new(View::M(item)))
}

/// Deserialize a single attribute value into `T`.
pub fn from_attribute_value<T: DeserializeOwned>(value: &AttributeValue) -> Result<T, CodecError> {
    T::deserialize(AttributeDeserializer::new(View::of(value)))
}

/// Deserialize a list of items, failing on the first bad item.
pub fn from_items<T: DeserializeOwned>(items: &[Item]) -> Result<Vec<T>, CodecError> {
    items.iter().map(from_item).collect()
}

/// Convert an item into a dynamic JSON document.
pub fn item_to_json(item: &Item) -> Map<String, Value> {
    item.iter()
        .map(|(k, v)| (k.clone(), attribute_to_json(v)))
        .collect()
}

/// Convert an attribute value into JSON.
///
/// `N` becomes an integer when it parses as one, otherwise a float; numbers
/// JSON cannot hold stay strings. Binary data becomes an array of bytes.
pub fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::B(blob) => bytes_to_json(blob),
        AttributeValue::M(map) => Value::Object(item_to_json(map)),
        AttributeValue::L(values) => Value::Array(values.iter().map(attribute_to_json).collect()),
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(values) => Value::Array(values.iter().map(|n| number_to_json(n)).collect()),
        AttributeValue::Bs(values) => Value::Array(values.iter().map(bytes_to_json).collect()),
        _ => Value::Null,
    }
}

fn number_to_json(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Value::Number(u.into());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string()))
}

fn bytes_to_json(blob: &Blob) -> Value {
    Value::Array(blob.as_ref().iter().map(|b| Value::from(*b)).collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Short DynamoDB type descriptor for an attribute value.
pub fn kind_name(value: &AttributeValue) -> &'static str {
    match value {
        AttributeValue::S(_) => "S",
        AttributeValue::N(_) => "N",
        AttributeValue::B(_) => "B",
        AttributeValue::Bool(_) => "BOOL",
        AttributeValue::Null(_) => "NULL",
        AttributeValue::M(_) => "M",
        AttributeValue::L(_) => "L",
        AttributeValue::Ss(_) => "SS",
        AttributeValue::Ns(_) => "NS",
        AttributeValue::Bs(_) => "BS",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Users {
        name: String,
        age: i32,
        is_dev: bool,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ComplexUser {
        id: String,
        name: String,
        age: i32,
        is_dev: bool,
        skills: Vec<String>,
        metadata: BTreeMap<String, Value>,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Plan {
        Free,
        Team { seats: u32 },
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Account {
        #[serde(rename = "PK")]
        pk: String,
        plan: Plan,
        nickname: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
    }

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_string())
    }

    fn n(v: &str) -> AttributeValue {
        AttributeValue::N(v.to_string())
    }

    fn sample_users() -> Users {
        Users {
            name: "leedonggyu".to_string(),
            age: 32,
            is_dev: false,
        }
    }

    #[test]
    fn test_to_item_scalars() {
        let item = to_item(&sample_users()).unwrap();

        assert_eq!(item["name"].as_s().unwrap(), "leedonggyu");
        assert_eq!(item["age"].as_n().unwrap(), "32");
        assert!(!item["is_dev"].as_bool().unwrap());
    }

    #[test]
    fn test_to_item_nested_values() {
        let user = ComplexUser {
            id: "user123".to_string(),
            name: "leedonggyu".to_string(),
            age: 32,
            is_dev: true,
            skills: vec!["Go".into(), "Python".into(), "JavaScript".into()],
            metadata: BTreeMap::from([
                ("department".to_string(), json!("Engineering")),
                ("level".to_string(), json!(3)),
            ]),
        };

        let item = to_item(&user).unwrap();

        let skills = item["skills"].as_l().unwrap();
        assert_eq!(skills.len(), 3);
        assert_eq!(skills[0].as_s().unwrap(), "Go");

        let metadata = item["metadata"].as_m().unwrap();
        assert_eq!(metadata["department"].as_s().unwrap(), "Engineering");
        assert_eq!(metadata["level"].as_n().unwrap(), "3");
    }

    #[test]
    fn test_to_item_rejects_non_objects() {
        assert_eq!(
            to_item(&vec![1, 2, 3]),
            Err(CodecError::NotAnObject("array"))
        );
        assert_eq!(to_item("plain"), Err(CodecError::NotAnObject("string")));
    }

    #[test]
    fn test_to_item_none_becomes_null() {
        let account = Account {
            pk: "acct#1".to_string(),
            plan: Plan::Free,
            nickname: None,
            tags: vec![],
        };
        let item = to_item(&account).unwrap();

        assert_eq!(item["nickname"], AttributeValue::Null(true));
        assert_eq!(item["plan"].as_s().unwrap(), "free");
        assert_eq!(item["PK"].as_s().unwrap(), "acct#1");
    }

    #[test]
    fn test_float_encoding() {
        assert_eq!(json_to_attribute(&json!(123.45)), n("123.45"));
        assert_eq!(json_to_attribute(&json!(-7)), n("-7"));
    }

    #[test]
    fn test_from_item_basic_struct() {
        let item = Item::from([
            ("name".to_string(), s("leedonggyu")),
            ("age".to_string(), n("32")),
            ("is_dev".to_string(), AttributeValue::Bool(false)),
        ]);

        let user: Users = from_item(&item).unwrap();
        assert_eq!(user, sample_users());
    }

    #[test]
    fn test_from_item_complex_struct() {
        let item = Item::from([
            ("id".to_string(), s("user123")),
            ("name".to_string(), s("leedonggyu")),
            ("age".to_string(), n("32")),
            ("is_dev".to_string(), AttributeValue::Bool(true)),
            (
                "skills".to_string(),
                AttributeValue::Ss(vec!["Go".into(), "Python".into(), "JavaScript".into()]),
            ),
            (
                "metadata".to_string(),
                AttributeValue::M(Item::from([
                    ("department".to_string(), s("Engineering")),
                    ("level".to_string(), n("3")),
                ])),
            ),
        ]);

        let user: ComplexUser = from_item(&item).unwrap();
        assert_eq!(user.id, "user123");
        assert_eq!(user.age, 32);
        assert!(user.is_dev);
        assert_eq!(user.skills, vec!["Go", "Python", "JavaScript"]);
        assert_eq!(user.metadata["department"], json!("Engineering"));
        assert_eq!(user.metadata["level"], json!(3));
    }

    #[test]
    fn test_from_item_coerces_strings_into_numbers_and_bools() {
        let item = Item::from([
            ("name".to_string(), n("42")),
            ("age".to_string(), s("32")),
            ("is_dev".to_string(), s("true")),
        ]);

        let user: Users = from_item(&item).unwrap();
        assert_eq!(user.name, "42");
        assert_eq!(user.age, 32);
        assert!(user.is_dev);
    }

    #[test]
    fn test_from_item_reports_bad_numbers() {
        let item = Item::from([
            ("name".to_string(), s("x")),
            ("age".to_string(), s("thirty")),
            ("is_dev".to_string(), AttributeValue::Bool(true)),
        ]);

        let err = from_item::<Users>(&item).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidNumber {
                expected: "integer",
                value: "thirty".to_string()
            }
        );
    }

    #[test]
    fn test_from_item_missing_field() {
        let err = from_item::<Users>(&Item::new()).unwrap_err();
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn test_from_item_enums_options_and_defaults() {
        let item = Item::from([
            ("PK".to_string(), s("acct#9")),
            (
                "plan".to_string(),
                AttributeValue::M(Item::from([(
                    "team".to_string(),
                    AttributeValue::M(Item::from([("seats".to_string(), n("5"))])),
                )])),
            ),
            ("nickname".to_string(), AttributeValue::Null(true)),
        ]);

        let account: Account = from_item(&item).unwrap();
        assert_eq!(account.pk, "acct#9");
        assert_eq!(account.plan, Plan::Team { seats: 5 });
        assert_eq!(account.nickname, None);
        assert!(account.tags.is_empty());
    }

    #[test]
    fn test_from_item_struct_encoded_as_json_string() {
        let item = Item::from([
            ("PK".to_string(), s("acct#2")),
            ("plan".to_string(), s(r#"{"team":{"seats":2}}"#)),
        ]);

        let account: Account = from_item(&item).unwrap();
        assert_eq!(account.plan, Plan::Team { seats: 2 });
    }

    #[test]
    fn test_struct_survives_encoding() {
        let account = Account {
            pk: "acct#3".to_string(),
            plan: Plan::Team { seats: 12 },
            nickname: Some("ops".to_string()),
            tags: vec!["a".to_string(), "b".to_string()],
        };

        let decoded: Account = from_item(&to_item(&account).unwrap()).unwrap();
        assert_eq!(decoded, account);
    }

    #[test]
    fn test_binary_and_number_sets() {
        #[derive(Deserialize)]
        struct Blobby {
            data: Vec<u8>,
            scores: Vec<i64>,
        }

        let item = Item::from([
            ("data".to_string(), AttributeValue::B(Blob::new(vec![1u8, 2, 3]))),
            (
                "scores".to_string(),
                AttributeValue::Ns(vec!["1".into(), "2".into(), "3".into()]),
            ),
        ]);

        let decoded: Blobby = from_item(&item).unwrap();
        assert_eq!(decoded.data, vec![1, 2, 3]);
        assert_eq!(decoded.scores, vec![1, 2, 3]);
    }

    #[test]
    fn test_from_items() {
        let items = vec![
            to_item(&sample_users()).unwrap(),
            to_item(&Users {
                name: "kim".to_string(),
                age: 20,
                is_dev: true,
            })
            .unwrap(),
        ];

        let users: Vec<Users> = from_items(&items).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].name, "kim");
    }

    #[test]
    fn test_item_to_json() {
        let item = Item::from([
            ("name".to_string(), s("leedonggyu")),
            ("age".to_string(), n("32")),
            ("is_dev".to_string(), AttributeValue::Bool(true)),
            (
                "skills".to_string(),
                AttributeValue::Ss(vec!["Go".into(), "Python".into()]),
            ),
        ]);

        let doc = item_to_json(&item);
        assert_eq!(
            Value::Object(doc),
            json!({
                "name": "leedonggyu",
                "age": 32,
                "is_dev": true,
                "skills": ["Go", "Python"],
            })
        );
    }

    #[test]
    fn test_attribute_to_json_numbers() {
        assert_eq!(attribute_to_json(&n("123")), json!(123));
        assert_eq!(attribute_to_json(&n("123.45")), json!(123.45));
        assert_eq!(attribute_to_json(&s("test")), json!("test"));
        assert_eq!(attribute_to_json(&AttributeValue::Bool(true)), json!(true));
    }

    #[test]
    fn test_non_string_map_keys_survive_encoding() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Scores {
            by_level: BTreeMap<u32, String>,
        }

        let scores = Scores {
            by_level: BTreeMap::from([(1, "a".to_string()), (2, "b".to_string())]),
        };
        let item = to_item(&scores).unwrap();
        assert_eq!(item["by_level"].as_m().unwrap()["2"], s("b"));

        let decoded: Scores = from_item(&item).unwrap();
        assert_eq!(decoded, scores);
    }

    #[test]
    fn test_dynamic_numbers_decode_by_shape() {
        let item = Item::from([
            ("count".to_string(), n("3")),
            ("ratio".to_string(), n("1.5")),
            ("odd".to_string(), n("12abc")),
        ]);

        let doc: HashMap<String, Value> = from_item(&item).unwrap();
        assert_eq!(doc["count"], json!(3));
        assert_eq!(doc["ratio"], json!(1.5));
        assert_eq!(doc["odd"], json!("12abc"));
    }

    #[test]
    fn test_binary_set_into_sequence() {
        let item = Item::from([(
            "chunks".to_string(),
            AttributeValue::Bs(vec![Blob::new(vec![1u8, 2]), Blob::new(vec![3u8])]),
        )]);

        let doc: HashMap<String, Vec<Vec<u8>>> = from_item(&item).unwrap();
        assert_eq!(doc["chunks"], vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_single_attribute_values() {
        assert_eq!(to_attribute_value(&7).unwrap(), n("7"));
        assert_eq!(
            to_attribute_value(&vec!["a", "b"]).unwrap(),
            AttributeValue::L(vec![s("a"), s("b")])
        );
        assert_eq!(to_attribute_value(&None::<u8>).unwrap(), AttributeValue::Null(true));

        assert_eq!(from_attribute_value::<u32>(&n("7")).unwrap(), 7);
        assert_eq!(from_attribute_value::<String>(&n("7")).unwrap(), "7");
        assert_eq!(
            from_attribute_value::<Vec<String>>(&AttributeValue::Ss(vec!["x".into()])).unwrap(),
            vec!["x"]
        );
        assert_eq!(from_attribute_value::<Plan>(&s("free")).unwrap(), Plan::Free);
    }

    #[test]
    fn test_flattened_fields_decode_as_stored() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Inner {
            age: i32,
        }

        #[derive(Debug, PartialEq, Deserialize)]
        struct Outer {
            name: String,
            #[serde(flatten)]
            inner: Inner,
        }

        let stored_as_number = Item::from([
            ("name".to_string(), s("kim")),
            ("age".to_string(), n("32")),
        ]);
        let outer: Outer = from_item(&stored_as_number).unwrap();
        assert_eq!(outer.inner, Inner { age: 32 });

        let stored_as_string = Item::from([
            ("name".to_string(), s("kim")),
            ("age".to_string(), s("32")),
        ]);
        assert!(from_item::<Outer>(&stored_as_string).is_err());
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(kind_name(&s("x")), "S");
        assert_eq!(kind_name(&AttributeValue::Ns(vec![])), "NS");
        assert_eq!(kind_name(&AttributeValue::Null(true)), "NULL");
    }
}
