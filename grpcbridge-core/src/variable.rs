//! # Variables
//!
//! A [`Variable`] is one binding produced by the router: the chain of nested message fields
//! to walk, the name of the field to set at the end of that chain, and the value to set.
use prost_reflect::Value;
use std::{fmt, str::FromStr};

/// The value carried by a [`Variable`].
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    /// Text extracted from a path segment or a query parameter, coerced when bound.
    Raw(String),
    /// A value that is already typed. It must match the kind of the target field.
    Typed(Value),
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::Raw(value)
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::Raw(value.to_string())
    }
}

impl From<Value> for VariableValue {
    fn from(value: Value) -> Self {
        VariableValue::Typed(value)
    }
}

/// A request to set the field `field_name` of the message reached by following `field_path`.
///
/// ```rust
/// use grpcbridge_core::variable::Variable;
///
/// let var = Variable::new(["nested"], "nested_field", "hello");
/// assert_eq!(var.to_string(), "nested.nested_field=hello");
///
/// let parsed: Variable = "nested.nested_field=hello".parse().unwrap();
/// assert_eq!(parsed, var);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    field_path: Vec<String>,
    field_name: String,
    value: VariableValue,
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid variable '{0}'. Expected format 'path.to.field=value'")]
pub struct ParseVariableError(String);

impl Variable {
    pub fn new<P, S>(
        field_path: P,
        field_name: impl Into<String>,
        value: impl Into<VariableValue>,
    ) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_path: field_path.into_iter().map(Into::into).collect(),
            field_name: field_name.into(),
            value: value.into(),
        }
    }

    /// Builds a variable from a dotted path such as `nested.deep.value`.
    ///
    /// The last segment is the field name, the ones before it form the path.
    pub fn dotted(path: &str, value: impl Into<VariableValue>) -> Self {
        let mut segments: Vec<String> = path.split('.').map(str::to_string).collect();
        // split always yields at least one element
        let field_name = segments.pop().unwrap_or_default();
        Self {
            field_path: segments,
            field_name,
            value: value.into(),
        }
    }

    pub fn field_path(&self) -> &[String] {
        &self.field_path
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn value(&self) -> &VariableValue {
        &self.value
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.field_path {
            write!(f, "{segment}.")?;
        }
        match &self.value {
            VariableValue::Raw(raw) => write!(f, "{}={}", self.field_name, raw),
            VariableValue::Typed(value) => write!(f, "{}={:?}", self.field_name, value),
        }
    }
}

impl FromStr for Variable {
    type Err = ParseVariableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, value) = s
            .split_once('=')
            .ok_or_else(|| ParseVariableError(s.to_string()))?;

        let path = path.trim();
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(ParseVariableError(s.to_string()));
        }

        Ok(Variable::dotted(path, value))
    }
}
