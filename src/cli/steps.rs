//! Command-line descriptions of stages

use std::sync::LazyLock;

use regex::Regex;

use super::CliError;
use crate::{Options, Value, convert::json_to_value};

static FILTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][\w-]*)\s*(=~|!~|!=|>=|<=|!\*|==|=|!|~|>|<|\*)\s*(.*?)\s*$")
        .expect("filter pattern is valid")
});

/// One stage requested on the command line, applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Filter { name: String, options: Options },
    Column(String),
    Row(String),
}

/// Parse `NAME OP [VALUE]` into a filter step.
///
/// Comma-separated values become a list of alternatives:
///
/// ```
/// use cost_query::cli::{Step, parse_filter};
/// use cost_query::Value;
///
/// let Step::Filter { name, options } = parse_filter("tracker=bug,feature").unwrap() else {
///     unreachable!()
/// };
/// assert_eq!(name, "tracker");
/// assert_eq!(options.get("value"), Some(&Value::from(vec!["bug", "feature"])));
/// ```
pub fn parse_filter(arg: &str) -> Result<Step, CliError> {
    let caps = FILTER_RE
        .captures(arg)
        .ok_or_else(|| CliError::InvalidFilter(arg.to_string()))?;

    let name = caps[1].to_string();
    let operator = &caps[2];
    let raw = &caps[3];

    let mut options = Options::new().with("operator", operator);
    if !raw.is_empty() {
        let value = if raw.contains(',') && operator != "=~" {
            Value::Array(
                raw.split(',')
                    .map(|v| Value::from(v.trim()))
                    .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
                    .collect(),
            )
        } else {
            Value::from(raw)
        };
        options.insert("value", value);
    }

    Ok(Step::Filter { name, options })
}

/// Positional arguments for `costq call`: JSON when it parses, a plain
/// string otherwise.
pub fn parse_arg_value(arg: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(arg)
        .map(json_to_value)
        .unwrap_or_else(|_| Value::from(arg))
}
