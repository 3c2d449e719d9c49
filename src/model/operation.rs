//! Server-side field operations and reference values.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::model::location::Location;
use crate::model::record::Record;

/// Which elements a `PULL` removes from an array field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullTarget {
    /// Remove every element equal to one of these values
    Data(Vec<Value>),
    /// Remove the element at this index
    Index(usize),
}

/// A pending mutation stored in place of a field's value.
///
/// The server applies the operation on save and returns the resulting value,
/// which replaces the descriptor when the model is hydrated from the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingOperation {
    #[serde(rename = "ADD")]
    Increment(i64),
    #[serde(rename = "SUB")]
    Decrement(i64),
    #[serde(rename = "MUL")]
    Multiply(i64),
    #[serde(rename = "DIV")]
    Divide(i64),
    #[serde(rename = "PUSH")]
    Push {
        data: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    #[serde(rename = "PULL")]
    Pull(PullTarget),
    #[serde(rename = "UPDATE")]
    Update { data: Value, index: usize },
    /// A plain value with no server-side operator.
    #[serde(untagged)]
    Literal(Value),
}

impl PendingOperation {
    /// Wire form of the operation, e.g. `{"ADD": 5}`.
    pub fn to_value(&self) -> Value {
        // Every variant holds plain JSON, so serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Decode a field value. Anything that is not an operator descriptor is
    /// a literal.
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_else(|_| Self::Literal(value.clone()))
    }

    /// Whether this is an operator rather than a literal value.
    pub fn is_operator(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }
}

impl From<PendingOperation> for Value {
    fn from(op: PendingOperation) -> Self {
        op.to_value()
    }
}

/// A reference to another record.
#[derive(Debug, Clone, PartialEq)]
pub enum Ref {
    /// uid of an existing record
    Identifier(String),
    /// Full payload of a record the server should create inline
    InlineRecord(Record),
    /// A point, for geo queries
    Coordinate(Location),
}

impl Ref {
    /// Value stored in a reference field.
    pub fn to_reference_value(&self) -> Result<Value> {
        match self {
            Self::Identifier(uid) => Ok(Value::String(uid.clone())),
            Self::InlineRecord(record) => Ok(record.to_value()),
            Self::Coordinate(_) => Err(Error::Validation(
                "a coordinate cannot be assigned to a reference field".to_string(),
            )),
        }
    }

    /// Value used as a point in `$near`/`$within` queries.
    pub fn to_geo_value(&self) -> Result<Value> {
        match self {
            Self::Coordinate(location) => Ok(location.to_wire()),
            Self::Identifier(uid) => Ok(json!({ "object": uid })),
            Self::InlineRecord(record) => match record.get_str("uid") {
                Some(uid) if !uid.is_empty() => Ok(json!({ "object": uid })),
                _ => Err(Error::Validation(
                    "geo queries need a saved object or a location".to_string(),
                )),
            },
        }
    }
}

impl From<&str> for Ref {
    fn from(uid: &str) -> Self {
        Self::Identifier(uid.to_string())
    }
}

impl From<String> for Ref {
    fn from(uid: String) -> Self {
        Self::Identifier(uid)
    }
}

impl From<Location> for Ref {
    fn from(location: Location) -> Self {
        Self::Coordinate(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_operators_wire_form() {
        assert_eq!(PendingOperation::Increment(5).to_value(), json!({"ADD": 5}));
        assert_eq!(PendingOperation::Decrement(1).to_value(), json!({"SUB": 1}));
        assert_eq!(PendingOperation::Multiply(3).to_value(), json!({"MUL": 3}));
        assert_eq!(PendingOperation::Divide(2).to_value(), json!({"DIV": 2}));
    }

    #[test]
    fn test_array_operators_wire_form() {
        let push = PendingOperation::Push {
            data: vec![json!("myval")],
            index: Some(1),
        };
        assert_eq!(
            push.to_value(),
            json!({"PUSH": {"data": ["myval"], "index": 1}})
        );

        let append = PendingOperation::Push {
            data: vec![json!(1), json!(2)],
            index: None,
        };
        assert_eq!(append.to_value(), json!({"PUSH": {"data": [1, 2]}}));

        let pull = PendingOperation::Pull(PullTarget::Data(vec![json!("myval")]));
        assert_eq!(pull.to_value(), json!({"PULL": {"data": ["myval"]}}));

        let pull_index = PendingOperation::Pull(PullTarget::Index(1));
        assert_eq!(pull_index.to_value(), json!({"PULL": {"index": 1}}));

        let update = PendingOperation::Update {
            data: json!("hello"),
            index: 1,
        };
        assert_eq!(
            update.to_value(),
            json!({"UPDATE": {"data": "hello", "index": 1}})
        );
    }

    #[test]
    fn test_from_value_decodes_operators() {
        assert_eq!(
            PendingOperation::from_value(&json!({"ADD": 5})),
            PendingOperation::Increment(5)
        );
        assert_eq!(
            PendingOperation::from_value(&json!({"PULL": {"index": 2}})),
            PendingOperation::Pull(PullTarget::Index(2))
        );
    }

    #[test]
    fn test_from_value_falls_back_to_literal() {
        let plain = json!({"city": "Pune"});
        let op = PendingOperation::from_value(&plain);
        assert_eq!(op, PendingOperation::Literal(plain.clone()));
        assert!(!op.is_operator());
        assert_eq!(op.to_value(), plain);

        assert_eq!(
            PendingOperation::from_value(&json!(42)),
            PendingOperation::Literal(json!(42))
        );
    }

    #[test]
    fn test_reference_values() {
        assert_eq!(Ref::from("blt1").to_reference_value().unwrap(), json!("blt1"));

        let mut record = Record::new();
        record.set("name", "inline");
        assert_eq!(
            Ref::InlineRecord(record).to_reference_value().unwrap(),
            json!({"name": "inline"})
        );

        let point = Ref::from(Location::new(1.0, 2.0).unwrap());
        assert!(point.to_reference_value().is_err());
    }

    #[test]
    fn test_geo_values() {
        let point = Ref::from(Location::new(1.0, 2.0).unwrap());
        assert_eq!(point.to_geo_value().unwrap(), json!([1.0, 2.0]));
        assert_eq!(
            Ref::from("blt1").to_geo_value().unwrap(),
            json!({"object": "blt1"})
        );
        assert!(Ref::InlineRecord(Record::new()).to_geo_value().is_err());
    }
}
