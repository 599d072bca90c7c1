//! Typed access to reassembled tool arguments.

use serde_json::Value;

use crate::error::RobotError;

/// Parsed JSON arguments of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn into_inner(self) -> Value {
        self.value
    }

    fn field<'a, T>(
        &'a self,
        key: &str,
        kind: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T, RobotError> {
        self.value.get(key).and_then(extract).ok_or_else(|| {
            RobotError::InvalidArgument(format!("Missing {kind} argument: {key}"))
        })
    }

    pub fn get_str(&self, key: &str) -> Result<&str, RobotError> {
        self.field(key, "string", Value::as_str)
    }

    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, RobotError> {
        self.field(key, "integer", Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, RobotError> {
        self.field(key, "boolean", Value::as_bool)
    }

    pub fn get_array(&self, key: &str) -> Result<&Vec<Value>, RobotError> {
        self.field(key, "array", Value::as_array)
    }

    /// Deserialize the whole argument object into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, RobotError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            RobotError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}

impl From<Value> for ToolArguments {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
