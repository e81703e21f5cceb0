use crate::{
    error::QueryError,
    options::Options,
    stage::{Category, Stage, StageRef, field_for},
    value::Value,
};

/// Where a grouping lands in a report. Rows nest outside columns, which is
/// why `Row` orders first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "row" | "rows" => Some(Axis::Row),
            "column" | "columns" | "col" => Some(Axis::Column),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Column => "column",
        }
    }
}

/// A single grouping level: the entry field and its axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    pub field: String,
    pub axis: Axis,
}

/// Groups entries by one field.
///
/// Options: `type` (`column` or `row`, required) and `field`.
#[derive(Debug, Clone)]
pub struct FieldGroupBy {
    name: String,
    grouping: Grouping,
    options: Options,
    parent: StageRef,
}

impl FieldGroupBy {
    pub fn new(
        name: impl Into<String>,
        parent: StageRef,
        options: Options,
    ) -> Result<Self, QueryError> {
        let name = name.into();
        let axis = match options.get("type") {
            Some(Value::String(s)) => Axis::from_str(s).ok_or_else(|| {
                QueryError::invalid_option(&name, "type", format!("expected column or row, got '{}'", s))
            })?,
            Some(other) => {
                return Err(QueryError::invalid_option(
                    &name,
                    "type",
                    format!("expected column or row, got {}", other.as_string()),
                ));
            }
            None => {
                return Err(QueryError::invalid_option(&name, "type", "missing"));
            }
        };

        Ok(FieldGroupBy {
            grouping: Grouping {
                field: field_for(&name, &options),
                axis,
            },
            name,
            options,
            parent,
        })
    }

    pub fn axis(&self) -> Axis {
        self.grouping.axis
    }

    pub fn field(&self) -> &str {
        &self.grouping.field
    }
}

impl Stage for FieldGroupBy {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> Category {
        Category::GroupBy
    }

    fn parent(&self) -> Option<&StageRef> {
        Some(&self.parent)
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn rows(&self) -> Result<Vec<Value>, QueryError> {
        self.parent.rows()
    }

    fn grouping(&self) -> Option<&Grouping> {
        Some(&self.grouping)
    }
}
