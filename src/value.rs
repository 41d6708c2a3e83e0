//! Runtime values produced by synthesis.
//!
//! `None` at any position means null: either the null gate fired, a cycle was
//! cut, or no strategy could build the value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i32),
    Long(i64),
    Char(char),
    Float(f32),
    Double(f64),
    Bool(bool),
    Byte(i8),
    Short(i16),
    Text(String),
    Enum { type_name: String, variant: String },
    /// Non-negative arbitrary-precision integer, bounded to 32 bits by the dispatcher.
    BigInt(i128),
    Array(Vec<Value>),
    List(Vec<Value>),
    Object(Object),
}

impl Value {
    /// Short name of the variant, reported when a replayed choice does not fit.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Char(_) => "char",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Text(_) => "text",
            Value::Enum { .. } => "enum",
            Value::BigInt(_) => "bigint",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Elements of an array or list value.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A constructed instance of a registered type.
///
/// Fields keep declaration order; a field holding `None` is null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub type_name: String,
    pub fields: Vec<(String, Option<Value>)>,
}

impl Object {
    pub fn new(type_name: impl Into<String>) -> Self {
        Object {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Option<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing any existing value with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: Option<Value>) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Value of a field; `None` when the field is absent or null.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(existing, _)| existing == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_existing_field() {
        let mut obj = Object::new("Point").with_field("x", Some(Value::Int(1)));
        obj.set("x", Some(Value::Int(2)));
        obj.set("y", None);
        assert_eq!(obj.fields.len(), 2);
        assert_eq!(obj.get("x"), Some(&Value::Int(2)));
        assert_eq!(obj.get("y"), None);
        assert!(obj.has_field("y"));
    }
}
