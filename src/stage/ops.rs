//! Operations every stage answers through [`Stage::call`].
//!
//! Unknown operation names are not an internal failure: they surface as
//! [`QueryError::UnsupportedOperation`] naming the stage that was asked.

use crate::{
    error::QueryError,
    result::decimal_to_value,
    stage::{Axis, Callback, Category, Grouping, Stage},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Number of result entries
    Count,
    /// Exact sum of a field over the result entries
    Sum,
    /// Feed each result entry to the callback
    Each,
    /// Result entries as an array
    Entries,
    /// Number of stages in the chain, base included
    Size,
    /// Names of the filter stages, head first
    Filters,
    /// Names of the group-by stages, head first
    GroupBys,
    /// Names of the row group-bys, head first
    Rows,
    /// Names of the column group-bys, head first
    Columns,
}

impl Operation {
    /// Parse an operation name. Case and `-`/`_` are not significant.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('-', "_").as_str() {
            "count" => Some(Self::Count),
            "sum" => Some(Self::Sum),
            "each" => Some(Self::Each),
            "entries" | "to_a" => Some(Self::Entries),
            "size" | "length" => Some(Self::Size),
            "filters" => Some(Self::Filters),
            "group_bys" | "groups" => Some(Self::GroupBys),
            "rows" => Some(Self::Rows),
            "columns" => Some(Self::Columns),
            _ => None,
        }
    }

    pub fn all() -> &'static [Operation] {
        &[
            Self::Count,
            Self::Sum,
            Self::Each,
            Self::Entries,
            Self::Size,
            Self::Filters,
            Self::GroupBys,
            Self::Rows,
            Self::Columns,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Each => "each",
            Self::Entries => "entries",
            Self::Size => "size",
            Self::Filters => "filters",
            Self::GroupBys => "group_bys",
            Self::Rows => "rows",
            Self::Columns => "columns",
        }
    }
}

/// Look up `operation` and run it against `stage`.
pub fn dispatch<S: Stage + ?Sized>(
    stage: &S,
    operation: &str,
    args: &[Value],
    callback: Option<Callback<'_>>,
) -> Result<Value, QueryError> {
    let Some(op) = Operation::from_name(operation) else {
        return Err(QueryError::UnsupportedOperation {
            stage: stage.name().to_string(),
            operation: operation.to_string(),
        });
    };

    match op {
        Operation::Count => Ok(Value::Integer(stage.results()?.count() as i64)),
        Operation::Sum => {
            let field = match args.first() {
                Some(Value::String(field)) => field,
                Some(other) => {
                    return Err(QueryError::invalid_argument(
                        "sum",
                        format!("field name must be a string, got {}", other.as_string()),
                    ));
                }
                None => return Err(QueryError::invalid_argument("sum", "missing field name")),
            };
            Ok(decimal_to_value(stage.results()?.sum(field)))
        }
        Operation::Each => {
            let Some(callback) = callback else {
                return Err(QueryError::invalid_argument("each", "a callback is required"));
            };
            let results = stage.results()?;
            let rows = results.rows();
            for row in rows.iter().copied() {
                callback(row);
            }
            Ok(Value::Integer(rows.len() as i64))
        }
        Operation::Entries => Ok(Value::Array(
            stage.results()?.rows().into_iter().cloned().collect(),
        )),
        Operation::Size => Ok(Value::Integer(1 + chain_below(stage).count() as i64)),
        Operation::Filters => Ok(names_where(stage, |category, _| category == Category::Filter)),
        Operation::GroupBys => Ok(names_where(stage, |category, _| category == Category::GroupBy)),
        Operation::Rows => Ok(names_where(stage, |_, grouping| {
            grouping.is_some_and(|g| g.axis == Axis::Row)
        })),
        Operation::Columns => Ok(names_where(stage, |_, grouping| {
            grouping.is_some_and(|g| g.axis == Axis::Column)
        })),
    }
}

fn chain_below<S: Stage + ?Sized>(stage: &S) -> impl Iterator<Item = &dyn Stage> {
    std::iter::successors(stage.parent().map(|p| p.as_ref()), |s| {
        s.parent().map(|p| p.as_ref())
    })
}

fn names_where<S: Stage + ?Sized>(
    stage: &S,
    keep: impl Fn(Category, Option<&Grouping>) -> bool,
) -> Value {
    let mut names = Vec::new();
    if keep(stage.category(), stage.grouping()) {
        names.push(Value::from(stage.name()));
    }
    names.extend(
        chain_below(stage)
            .filter(|s| keep(s.category(), s.grouping()))
            .map(|s| Value::from(s.name())),
    );
    Value::Array(names)
}
