//! Action entity: a validated "invoke tool X with these literal arguments"

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered keyword arguments of an action.
///
/// Values are restricted to literals: string, integer, float, boolean, null,
/// sequences and string-keyed mappings of literals. `serde_json::Value` has
/// exactly that variant set, and keeps integers and floats apart.
pub type Arguments = Map<String, Value>;

/// A structured tool invocation extracted from model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Tool name, matching `[A-Za-z_][A-Za-z0-9_]*`
    pub name: String,
    /// Keyword arguments in the order they were written
    pub arguments: Arguments,
    /// The raw call text the action was parsed from (empty when built in code)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Arguments::new(),
            source: String::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument or return an error message
    pub fn require_string(&self, key: &str) -> Result<&str, String> {
        match self.arguments.get(key) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(format!(
                "Argument '{}' must be a string, got {}",
                key,
                literal_kind(other)
            )),
            None => Err(format!("Missing required argument: {}", key)),
        }
    }

    /// Get an optional string argument, rejecting non-string values
    pub fn optional_string(&self, key: &str) -> Result<Option<&str>, String> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.require_string(key).map(Some),
        }
    }

    /// Get an optional numeric argument (integers are widened)
    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, String> {
        match self.arguments.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(other) => Err(format!(
                "Argument '{}' must be a number, got {}",
                key,
                literal_kind(other)
            )),
        }
    }
}

impl std::fmt::Display for Action {
    /// Renders the canonical call form, e.g. `describe_dataframe(dataframe_id="abc")`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (key, value)) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        f.write_str(")")
    }
}

/// Short name of a literal's kind for error messages
pub fn literal_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_argument_order() {
        let action = Action::new("plot_time_series")
            .with_arg("dataframe_id", "dataframe_1")
            .with_arg("value_column", "value")
            .with_arg("time_column", "index");

        assert_eq!(
            action.to_string(),
            r#"plot_time_series(dataframe_id="dataframe_1", value_column="value", time_column="index")"#
        );
    }

    #[test]
    fn test_display_without_arguments() {
        assert_eq!(Action::new("describe_dataframe").to_string(), "describe_dataframe()");
    }

    #[test]
    fn test_typed_accessors() {
        let action = Action::new("detect_anomalies_iqr")
            .with_arg("value_column", "value")
            .with_arg("iqr_multiplier", 2)
            .with_arg("title", Value::Null);

        assert_eq!(action.require_string("value_column").unwrap(), "value");
        assert_eq!(action.optional_f64("iqr_multiplier").unwrap(), Some(2.0));
        assert_eq!(action.optional_string("title").unwrap(), None);
        assert!(
            action
                .require_string("iqr_multiplier")
                .unwrap_err()
                .contains("must be a string, got integer")
        );
        assert!(action.require_string("missing").is_err());
        assert!(action.optional_f64("value_column").is_err());
    }
}
