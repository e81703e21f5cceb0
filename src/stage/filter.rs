use std::cmp::Ordering;

use regex::RegexSet;

use crate::{
    error::QueryError,
    options::Options,
    stage::{Category, Stage, StageRef, field_for},
    value::Value,
};

/// Comparison applied by a [`FieldFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to any of the values (`=`)
    Equal,
    /// Equal to none of the values (`!`, `!=`)
    NotEqual,
    /// `>=`
    GreaterEqual,
    /// `<=`
    LessEqual,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// Case-insensitive substring of any value (`~`)
    Contains,
    /// Contains none of the values (`!~`)
    NotContains,
    /// Matches any of the regular expressions (`=~`)
    Matches,
    /// Field present and not null (`*`)
    Any,
    /// Field missing or null (`!*`)
    None,
}

impl FilterOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "=" | "==" => Some(Self::Equal),
            "!" | "!=" => Some(Self::NotEqual),
            ">=" => Some(Self::GreaterEqual),
            "<=" => Some(Self::LessEqual),
            ">" => Some(Self::GreaterThan),
            "<" => Some(Self::LessThan),
            "~" => Some(Self::Contains),
            "!~" => Some(Self::NotContains),
            "=~" => Some(Self::Matches),
            "*" => Some(Self::Any),
            "!*" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!",
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Contains => "~",
            Self::NotContains => "!~",
            Self::Matches => "=~",
            Self::Any => "*",
            Self::None => "!*",
        }
    }

    /// Operators that compare against the `value` option.
    pub fn needs_value(&self) -> bool {
        !matches!(self, Self::Any | Self::None)
    }

    fn is_ordering(&self) -> bool {
        matches!(
            self,
            Self::GreaterEqual | Self::LessEqual | Self::GreaterThan | Self::LessThan
        )
    }
}

/// Keeps the entries whose `field` satisfies `operator` against `value`.
///
/// Recognized options: `operator` (default `=`), `value` (a scalar or an
/// array of alternatives) and `field` (defaults to the snake_case stage name).
#[derive(Debug, Clone)]
pub struct FieldFilter {
    name: String,
    field: String,
    operator: FilterOperator,
    values: Vec<Value>,
    patterns: Option<RegexSet>,
    options: Options,
    parent: StageRef,
}

impl FieldFilter {
    pub fn new(
        name: impl Into<String>,
        parent: StageRef,
        options: Options,
    ) -> Result<Self, QueryError> {
        let name = name.into();
        let field = field_for(&name, &options);

        let operator = match options.get("operator") {
            None => FilterOperator::Equal,
            Some(Value::String(token)) => FilterOperator::from_token(token).ok_or_else(|| {
                QueryError::invalid_option(&name, "operator", format!("unknown operator '{}'", token))
            })?,
            Some(other) => {
                return Err(QueryError::invalid_option(
                    &name,
                    "operator",
                    format!("expected string, got {}", other.as_string()),
                ));
            }
        };

        let values = match options.get("value") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(value) => vec![value.clone()],
        };

        if operator.needs_value() && values.is_empty() {
            return Err(QueryError::invalid_option(
                &name,
                "value",
                format!("operator '{}' requires a value", operator.as_str()),
            ));
        }
        if operator.is_ordering() && values.len() > 1 {
            return Err(QueryError::invalid_option(
                &name,
                "value",
                format!("operator '{}' takes a single value", operator.as_str()),
            ));
        }

        let patterns = match operator {
            FilterOperator::Matches => {
                let sources: Vec<String> = values.iter().map(Value::as_string).collect();
                let set = RegexSet::new(&sources).map_err(|e| {
                    QueryError::invalid_option(&name, "value", format!("invalid pattern: {}", e))
                })?;
                Some(set)
            }
            _ => None,
        };

        Ok(FieldFilter {
            name,
            field,
            operator,
            values,
            patterns,
            options,
            parent,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Whether a single entry passes this filter.
    pub fn matches(&self, entry: &Value) -> bool {
        let actual = entry.get(&self.field);
        match self.operator {
            FilterOperator::Equal => self.values.iter().any(|v| actual.loose_eq(v)),
            FilterOperator::NotEqual => !self.values.iter().any(|v| actual.loose_eq(v)),
            FilterOperator::GreaterEqual => self.ordering_holds(actual, |o| o != Ordering::Less),
            FilterOperator::LessEqual => self.ordering_holds(actual, |o| o != Ordering::Greater),
            FilterOperator::GreaterThan => self.ordering_holds(actual, |o| o == Ordering::Greater),
            FilterOperator::LessThan => self.ordering_holds(actual, |o| o == Ordering::Less),
            FilterOperator::Contains => self.contains_any(actual),
            FilterOperator::NotContains => !self.contains_any(actual),
            FilterOperator::Matches => {
                !actual.is_null()
                    && self
                        .patterns
                        .as_ref()
                        .is_some_and(|set| set.is_match(&actual.as_string()))
            }
            FilterOperator::Any => !actual.is_null(),
            FilterOperator::None => actual.is_null(),
        }
    }

    fn ordering_holds(&self, actual: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        self.values
            .first()
            .and_then(|expected| actual.compare(expected))
            .is_some_and(accept)
    }

    fn contains_any(&self, actual: &Value) -> bool {
        if actual.is_null() {
            return false;
        }
        let haystack = actual.as_string().to_lowercase();
        self.values
            .iter()
            .any(|v| haystack.contains(&v.as_string().to_lowercase()))
    }
}

impl Stage for FieldFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> Category {
        Category::Filter
    }

    fn parent(&self) -> Option<&StageRef> {
        Some(&self.parent)
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn rows(&self) -> Result<Vec<Value>, QueryError> {
        let mut rows = self.parent.rows()?;
        rows.retain(|entry| self.matches(entry));
        Ok(rows)
    }
}
