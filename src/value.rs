use std::{cmp::Ordering, collections::HashMap, str::FromStr};

use rust_decimal::{Decimal, prelude::FromPrimitive};

/// A JSON value flowing through a cost query.
///
/// Entries (the rows a query filters and groups) are `Value::Object`s; stage
/// options are plain scalar or array values. Integers and floats are kept
/// apart so that summing costs stays exact.
///
/// # Examples
///
/// ```
/// use cost_query::Value;
/// use std::collections::HashMap;
///
/// let mut entry = HashMap::new();
/// entry.insert("status".to_string(), Value::from("open"));
/// entry.insert("hours".to_string(), Value::Float(1.5));
/// let entry = Value::Object(entry);
///
/// assert_eq!(entry.get("status"), &Value::from("open"));
/// assert_eq!(entry.get("missing"), &Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON null
    #[default]
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// UTF-8 string
    String(String),

    /// Array of values
    Array(Vec<Value>),

    /// Object with string keys
    Object(HashMap<String, Value>),
}

static NULL: Value = Value::Null;

impl Value {
    /// Field lookup on an entry. Anything that is not an object, and any
    /// missing key, reads as null.
    pub fn get(&self, field: &str) -> &Value {
        match self {
            Value::Object(map) => map.get(field).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as float. Numeric strings are accepted so that values typed on
    /// a command line compare against numeric entry fields.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Exact decimal view of a numeric value, used for cost sums.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Integer(n) => Some(Decimal::from(*n)),
            Value::Float(n) => Decimal::from_f64(*n),
            Value::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    /// Get as string (concatenation)
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            _ => format!("{:?}", self),
        }
    }

    /// Loose equality used by filters: exact equality, numeric equality
    /// across integer/float/numeric-string, or equal string renderings.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                false
            }
            (a, b) => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_string() == b.as_string(),
            },
        }
    }

    /// Ordering between two scalars: numeric when both sides read as numbers,
    /// lexicographic for strings (so ISO dates order correctly), `None`
    /// otherwise.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
                None
            }
            (a, b) => match (a.as_float(), b.as_float()) {
                (Some(x), Some(y)) => x.partial_cmp(&y),
                _ => Some(a.as_string().cmp(&b.as_string())),
            },
        }
    }

    /// Total order used to sort group keys. Nulls sort last.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (a, b) => a
                .compare(b)
                .unwrap_or_else(|| a.as_string().cmp(&b.as_string())),
        }
    }
}

/// Returns a human-readable type name for a Value
pub fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Boolean(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loose_eq_crosses_numeric_representations() {
        assert!(Value::Integer(3).loose_eq(&Value::from("3")));
        assert!(Value::Float(2.0).loose_eq(&Value::Integer(2)));
        assert!(!Value::Null.loose_eq(&Value::from("null")));
    }

    #[test]
    fn test_sort_cmp_puts_nulls_last() {
        let mut keys = vec![Value::Null, Value::from("b"), Value::from("a")];
        keys.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(keys, vec![Value::from("a"), Value::from("b"), Value::Null]);
    }

    #[test]
    fn test_compare_orders_iso_dates() {
        let a = Value::from("2024-01-31");
        let b = Value::from("2024-02-01");
        assert_eq!(a.compare(&b), Some(Ordering::Less));
    }
}
