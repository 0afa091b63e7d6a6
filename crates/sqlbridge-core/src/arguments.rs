//! Tool argument values.
//!
//! Arguments arrive as an untyped JSON object. The validator splits them into
//! fields the tool's schema declares, held as [`ArgValue`], and undeclared
//! fields, which pass through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A declared argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Array(Vec<ArgValue>),
    Object(BTreeMap<String, ArgValue>),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ArgValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Null, or a string that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Number(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<ArgValue> for Value {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Null => Value::Null,
            ArgValue::Bool(b) => Value::Bool(b),
            ArgValue::Integer(i) => Value::Number(i.into()),
            ArgValue::Number(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            ArgValue::String(s) => Value::String(s),
            ArgValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ArgValue::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Validated arguments for one tool invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    declared: BTreeMap<String, ArgValue>,
    passthrough: Map<String, Value>,
}

impl ToolArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_declared(&mut self, name: impl Into<String>, value: ArgValue) {
        self.declared.insert(name.into(), value);
    }

    pub fn insert_passthrough(&mut self, name: impl Into<String>, value: Value) {
        self.passthrough.insert(name.into(), value);
    }

    /// A declared argument.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.declared.get(name)
    }

    /// A declared argument, when it is a string.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    /// Fields the schema does not declare.
    pub fn passthrough(&self) -> &Map<String, Value> {
        &self.passthrough
    }

    /// Merge declared and passthrough fields back into a JSON object.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut out = self.passthrough.clone();
        for (name, value) in &self.declared {
            out.insert(name.clone(), Value::from(value.clone()));
        }
        out
    }
}
